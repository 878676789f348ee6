use crate::data::FEATURE_LEN;

/// Euclidean distance over the first `FEATURE_LEN` positions of two vectors.
///
/// Anything past `FEATURE_LEN` (a trailing label, for instance) is ignored.
///
/// # Panics
///
/// Panics if either vector is shorter than `FEATURE_LEN`.
pub fn euclidean(a: &[u8], b: &[u8]) -> f64 {
    assert!(
        a.len() >= FEATURE_LEN && b.len() >= FEATURE_LEN,
        "distance needs {} values, got {} and {}",
        FEATURE_LEN,
        a.len(),
        b.len()
    );

    let sum: u32 = a[..FEATURE_LEN]
        .iter()
        .zip(&b[..FEATURE_LEN])
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u32;
            d * d
        })
        .sum();

    (sum as f64).sqrt()
}
