use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::data::Dataset;
use crate::fitness::fitness;
use crate::gene::Gene;

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Population {
    pub genes: Vec<Gene>,
}

impl Population {
    pub fn new() -> Population {
        Population { genes: Vec::new() }
    }

    /// Fill a population of `size` independent random genes.
    pub fn generate(size: usize, rng: &mut ChaCha8Rng) -> Population {
        debug!("Generating {} random genes...", size);
        Population {
            genes: (0..size).map(|_| Gene::random(rng)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Fisher-Yates: position `i` swaps with a uniform draw from `i..len`.
    pub fn shuffle(&mut self, rng: &mut ChaCha8Rng) {
        let len = self.genes.len();
        for i in 0..len {
            let j = rng.gen_range(i..len);
            self.genes.swap(i, j);
        }
    }

    /// Compute and cache the fitness of every gene on `data`.
    pub fn fit(&mut self, data: &Dataset) {
        self.genes.par_iter_mut().for_each(|gene| {
            gene.fit = fitness(&gene.values, data);
        });
    }

    /// Score every gene on `data` without touching the cached fitness and return the
    /// index and score of the best one (earliest on ties).
    pub fn evaluate(&self, data: &Dataset) -> Option<(usize, u32)> {
        let scores: Vec<u32> = self
            .genes
            .par_iter()
            .map(|gene| fitness(&gene.values, data))
            .collect();

        let mut best: Option<(usize, u32)> = None;
        for (i, &score) in scores.iter().enumerate() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }
        best
    }

    /// Best, mean and standard deviation of the cached fitness values.
    pub fn fit_stats(&self) -> (u32, f64, f64) {
        let best = self.genes.iter().map(|g| g.fit).max().unwrap_or(0);
        if self.genes.len() < 2 {
            return (best, best as f64, 0.0);
        }
        let fits: Vec<f64> = self.genes.iter().map(|g| g.fit as f64).collect();
        let mean = (&fits).mean();
        let std = (&fits).std_dev();
        (best, mean, std)
    }
}

impl Default for Population {
    fn default() -> Self {
        Population::new()
    }
}
