use log::trace;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::gene::Gene;
use crate::param::GA;
use crate::population::Population;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// The two fittest genes of the whole population
    BestPair,
    /// The two fittest genes of a window of `tournament_size` shuffled genes
    Tournament,
}

/// Indices of the fittest and second fittest genes.
///
/// A gene at least as fit as the current best takes its place and pushes it to second,
/// so later genes win ties.
pub fn top_two(genes: &[Gene]) -> (usize, usize) {
    let (mut best, mut second) = (0, 0);
    let (mut best_fit, mut second_fit) = (0u32, 0u32);

    for (i, gene) in genes.iter().enumerate() {
        if gene.fit >= best_fit {
            second = best;
            second_fit = best_fit;
            best = i;
            best_fit = gene.fit;
        } else if gene.fit >= second_fit {
            second = i;
            second_fit = gene.fit;
        }
    }

    (best, second)
}

/// Fit `pop` on `data` and build the staging population consumed by crossover.
///
/// Slots `2k` and `2k+1` hold independent copies of the first and second winner of pair `k`.
/// Tournament selection shuffles `pop` in place.
pub fn select_parents(pop: &mut Population, data: &Dataset, ga: &GA, rng: &mut ChaCha8Rng) -> Population {
    pop.fit(data);

    match ga.selection {
        SelectionMethod::BestPair => best_pair(pop),
        SelectionMethod::Tournament => tournament(pop, ga.tournament_size, ga.reshuffle_each_tournament, rng),
    }
}

fn best_pair(pop: &Population) -> Population {
    let (first, second) = top_two(&pop.genes);
    trace!("Best pair: #{} ({}) and #{} ({})", first, pop.genes[first].fit, second, pop.genes[second].fit);

    let mut staging = Population::new();
    for _ in 0..pop.len() / 2 {
        staging.genes.push(pop.genes[first].clone());
        staging.genes.push(pop.genes[second].clone());
    }
    staging
}

/// Every pair is drawn from the first `size` genes of the shuffled population. Unless
/// `reshuffle` is set the population is shuffled once, so all pairs of a generation share
/// the same window.
fn tournament(pop: &mut Population, size: usize, reshuffle: bool, rng: &mut ChaCha8Rng) -> Population {
    let size = size.min(pop.len());
    let mut staging = Population::new();

    pop.shuffle(rng);
    for pair in 0..pop.len() / 2 {
        if reshuffle && pair > 0 {
            pop.shuffle(rng);
        }

        let window = &pop.genes[..size];
        let (first, second) = top_two(window);
        staging.genes.push(window[first].clone());
        staging.genes.push(window[second].clone());
    }
    staging
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FEATURE_LEN, NUM_CLASSES};
    use crate::gene::GENE_LEN;
    use crate::param::Param;
    use rand::SeedableRng;

    fn genes_with_fits(fits: &[u32]) -> Vec<Gene> {
        fits.iter()
            .enumerate()
            .map(|(i, &fit)| {
                let mut gene = Gene::new(vec![(i % 17) as u8; GENE_LEN]);
                gene.fit = fit;
                gene
            })
            .collect()
    }

    #[test]
    fn test_top_two_ties_favor_later_index() {
        assert_eq!(top_two(&genes_with_fits(&[5, 5, 5])), (2, 1));
    }

    #[test]
    fn test_top_two_distinct_values() {
        assert_eq!(top_two(&genes_with_fits(&[1, 9, 3, 7, 2])), (1, 3));
        assert_eq!(top_two(&genes_with_fits(&[9, 1, 2])), (0, 2));
    }

    #[test]
    fn test_top_two_all_zero() {
        assert_eq!(top_two(&genes_with_fits(&[0, 0, 0, 0])), (3, 2));
    }

    #[test]
    fn test_best_pair_fills_staging_with_copies() {
        let data = Dataset::test_blocks(1, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::generate(8, &mut rng);
        let perfect = Gene::new((0..NUM_CLASSES).flat_map(|c| vec![c as u8; FEATURE_LEN]).collect());
        pop.genes[2] = perfect.clone();

        let param = Param::default();
        let staging = select_parents(&mut pop, &data, &param.ga, &mut rng);

        assert_eq!(staging.len(), pop.len());
        for k in 0..staging.len() / 2 {
            assert_eq!(staging.genes[2 * k].values, perfect.values);
            assert_eq!(staging.genes[2 * k + 1], staging.genes[1]);
        }
        // population order untouched by best pair selection
        assert_eq!(pop.genes[2].values, perfect.values);
    }

    #[test]
    fn test_tournament_uses_first_window_for_every_pair() {
        let data = Dataset::test_blocks(1, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::generate(20, &mut rng);
        let mut param = Param::default();
        param.ga.selection = SelectionMethod::Tournament;
        param.ga.tournament_size = 4;

        let staging = select_parents(&mut pop, &data, &param.ga, &mut rng);

        assert_eq!(staging.len(), 20);
        let (first, second) = top_two(&pop.genes[..4]);
        for k in 0..10 {
            assert_eq!(staging.genes[2 * k], pop.genes[first]);
            assert_eq!(staging.genes[2 * k + 1], pop.genes[second]);
        }
    }

    #[test]
    fn test_tournament_reshuffle_varies_pairs() {
        let data = Dataset::test_blocks(1, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::generate(40, &mut rng);
        let mut param = Param::default();
        param.ga.selection = SelectionMethod::Tournament;
        param.ga.tournament_size = 2;
        param.ga.reshuffle_each_tournament = true;

        let staging = select_parents(&mut pop, &data, &param.ga, &mut rng);

        let distinct = staging
            .genes
            .iter()
            .step_by(2)
            .filter(|g| **g != staging.genes[0])
            .count();
        assert!(distinct > 0, "reshuffled tournaments should not all pick the same winner");
    }

    #[test]
    fn test_select_parents_deterministic_with_seed() {
        let data = Dataset::test_blocks(2, 1);
        let mut param = Param::default();
        param.ga.selection = SelectionMethod::Tournament;

        let base = Population::generate(40, &mut ChaCha8Rng::seed_from_u64(3));
        let mut a = base.clone();
        let mut b = base.clone();
        let sa = select_parents(&mut a, &data, &param.ga, &mut ChaCha8Rng::seed_from_u64(42));
        let sb = select_parents(&mut b, &data, &param.ga, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(sa, sb);
    }
}
