use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{FEATURE_LEN, MAX_FEATURE_VAL, NUM_CLASSES};

/// Length of a gene: one synthetic row per class, concatenated.
pub const GENE_LEN: usize = NUM_CLASSES * FEATURE_LEN;

const _: () = assert!(GENE_LEN % NUM_CLASSES == 0, "gene length must split evenly into classes");

/// A candidate solution: `NUM_CLASSES` prototype rows laid end to end, segment `c`
/// being the prototype of class `c`.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Gene {
    pub values: Vec<u8>,
    /// Fitness on the data the population was last fitted on
    pub fit: u32,
}

impl Gene {
    pub fn new(values: Vec<u8>) -> Gene {
        assert_eq!(values.len(), GENE_LEN, "a gene holds exactly {} values", GENE_LEN);
        Gene { values, fit: 0 }
    }

    /// Every element drawn uniformly in `0..=MAX_FEATURE_VAL`.
    pub fn random(rng: &mut ChaCha8Rng) -> Gene {
        Gene {
            values: (0..GENE_LEN).map(|_| random_value(rng)).collect(),
            fit: 0,
        }
    }

    /// Prototype row of `class`.
    pub fn segment(&self, class: usize) -> &[u8] {
        decode_segment(&self.values, class)
    }
}

impl fmt::Debug for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gene (fit {})", self.fit)?;
        for class in 0..NUM_CLASSES {
            let row: Vec<String> = self.segment(class).iter().map(|v| format!("{:>2}", v)).collect();
            writeln!(f, "  {}: {}", class, row.join(" "))?;
        }
        Ok(())
    }
}

/// Values `[class * FEATURE_LEN, (class + 1) * FEATURE_LEN)` of a gene.
pub fn decode_segment(values: &[u8], class: usize) -> &[u8] {
    let start = class * FEATURE_LEN;
    &values[start..start + FEATURE_LEN]
}

#[inline]
pub fn random_value(rng: &mut ChaCha8Rng) -> u8 {
    rng.gen_range(0..=MAX_FEATURE_VAL)
}
