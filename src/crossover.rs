use log::trace;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ga::mutate_gene;
use crate::gene::Gene;
use crate::param::GA;
use crate::population::Population;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    /// Every position swapped independently
    Uniform,
    /// One contiguous range swapped
    TwoPoint,
    /// `k` equal sections, a random sub-range swapped within each
    MultiPoint,
}

/// Turn a staging population into the next generation.
///
/// Slots `2k` and `2k+1` of `staging` are the parents of the two children written at the
/// same slots. Children are fresh copies and are mutated before being stored.
pub fn cross_over(staging: &Population, ga: &GA, rng: &mut ChaCha8Rng) -> Population {
    let mut children = Population::new();

    for parents in staging.genes.chunks_exact(2) {
        let (p1, p2) = (&parents[0].values, &parents[1].values);

        let (mut child1, mut child2) = match ga.crossover {
            CrossoverMethod::Uniform => uniform(p1, p2, ga.uniform_swap_pct, rng),
            CrossoverMethod::TwoPoint => two_point(p1, p2, rng),
            CrossoverMethod::MultiPoint => multi_point(p1, p2, ga.max_sections, rng),
        };

        mutate_gene(&mut child1, ga.mutation_rate, rng);
        mutate_gene(&mut child2, ga.mutation_rate, rng);

        children.genes.push(Gene::new(child1));
        children.genes.push(Gene::new(child2));
    }

    children
}

/// Each position is swapped between the children when a uniform draw in `[0, 100)` is at
/// least `100 - swap_pct` (at the default of 50, a draw `>= 50`).
pub fn uniform(p1: &[u8], p2: &[u8], swap_pct: f64, rng: &mut ChaCha8Rng) -> (Vec<u8>, Vec<u8>) {
    let mut child1 = p1.to_vec();
    let mut child2 = p2.to_vec();
    let threshold = 100.0 - swap_pct;

    for pos in 0..child1.len() {
        if rng.gen_range(0.0..100.0) >= threshold {
            std::mem::swap(&mut child1[pos], &mut child2[pos]);
        }
    }

    (child1, child2)
}

/// Swap `[cut1, cut2)` where `cut1 = r1 * len` and `cut2 = cut1 + r2 * (len - cut1)`.
pub fn two_point(p1: &[u8], p2: &[u8], rng: &mut ChaCha8Rng) -> (Vec<u8>, Vec<u8>) {
    let len = p1.len();
    let cut1 = ((rng.gen::<f64>() * len as f64) as usize).min(len);
    let cut2 = (cut1 + (rng.gen::<f64>() * (len - cut1) as f64) as usize).min(len);
    trace!("Two-point cuts: {}..{}", cut1, cut2);

    let mut child1 = p1.to_vec();
    let mut child2 = p2.to_vec();
    child1[cut1..cut2].copy_from_slice(&p2[cut1..cut2]);
    child2[cut1..cut2].copy_from_slice(&p1[cut1..cut2]);

    (child1, child2)
}

/// Split the gene in `k` sections (`k` uniform in `1..=max_sections`) of `len / k` values,
/// the last section also taking the remainder, then swap a random sub-range of each.
pub fn multi_point(p1: &[u8], p2: &[u8], max_sections: usize, rng: &mut ChaCha8Rng) -> (Vec<u8>, Vec<u8>) {
    let len = p1.len();
    let sections = rng.gen_range(1..=max_sections.clamp(1, len));
    let width = len / sections;
    trace!("Multi-point: {} sections of {}", sections, width);

    let mut child1 = p1.to_vec();
    let mut child2 = p2.to_vec();

    for section in 0..sections {
        let start = section * width;
        let end = if section == sections - 1 { len } else { start + width };

        let a = rng.gen_range(start..=end);
        let b = rng.gen_range(start..=end);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        child1[lo..hi].swap_with_slice(&mut child2[lo..hi]);
    }

    (child1, child2)
}
