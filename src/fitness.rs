use crate::data::{Dataset, NUM_CLASSES};
use crate::distance::euclidean;
use crate::gene::decode_segment;

/// Nearest-neighbour score of a gene on a dataset.
///
/// For every class `c` and every block, the block row nearest to prototype `c` is found
/// (the earliest row wins on equal distances); one point is scored when its label is `c`.
pub fn fitness(values: &[u8], data: &Dataset) -> u32 {
    let mut score = 0;

    for class in 0..NUM_CLASSES {
        let prototype = decode_segment(values, class);

        for block in data.blocks() {
            let mut min = f64::MAX;
            let mut nearest = 0;
            for (pos, row) in block.iter().enumerate() {
                let dist = euclidean(prototype, row.features());
                if dist < min {
                    min = dist;
                    nearest = pos;
                }
            }

            if block[nearest].label() as usize == class {
                score += 1;
            }
        }
    }

    score
}

/// Highest score reachable on `data`: one point per class per block.
pub fn max_score(data: &Dataset) -> u32 {
    (NUM_CLASSES * data.block_count()) as u32
}
