use crate::cinfo;
use crate::crossover::cross_over;
use crate::data::Dataset;
use crate::gene::random_value;
use crate::param::{Param, GA};
use crate::population::Population;
use crate::selection::select_parents;
use crate::utils::{display_epoch, display_epoch_legend};
use log::{debug, info};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

//-----------------------------------------------------------------------------
// Genetic Algorithm core functions
//-----------------------------------------------------------------------------

/// Evolve a population of prototype sets on a training dataset
///
/// # Arguments
///
/// * `data` - The training dataset.
/// * `param` - Parameters for the genetic algorithm.
/// * `running` - Cleared to stop evolution after the current generation.
/// * `rng` - Random number generator, used for every draw of the run.
///
/// # Returns
///
/// The last generation and the number of generations actually run.
pub fn ga(data: &Dataset, param: &Param, running: Arc<AtomicBool>, rng: &mut ChaCha8Rng) -> (Population, usize) {
    let time = Instant::now();

    let pop = Population::generate(param.ga.population_size, rng);
    info!(
        "Population size: {}, generations: {}, selection {:?}, crossover {:?}, mutation {}%",
        pop.len(),
        param.ga.generations,
        param.ga.selection,
        param.ga.crossover,
        param.ga.mutation_rate
    );

    cinfo!(param.general.display_colorful, "{}", display_epoch_legend(data));
    let (pop, generations) = iterative_evolution(pop, data, param, running, rng);

    let elapsed = time.elapsed();
    info!(
        "Genetic algorithm computed {} generations on {} in {:.2?}",
        generations, data.name, elapsed
    );

    (pop, generations)
}

/// Run `param.ga.generations` generations, or fewer if `running` is cleared
///
/// # Returns
///
/// The last generation and the number of generations run.
pub fn iterative_evolution(
    mut pop: Population,
    data: &Dataset,
    param: &Param,
    running: Arc<AtomicBool>,
    rng: &mut ChaCha8Rng,
) -> (Population, usize) {
    let mut generation: usize = 0;

    while generation < param.ga.generations {
        generation += 1;

        let (best, mean, std) = evolve(&mut pop, data, &param.ga, rng);

        let line = display_epoch(generation, best, mean, std, data);
        if generation % param.general.display_every.max(1) == 0 || generation == param.ga.generations {
            cinfo!(param.general.display_colorful, "{}", line);
        } else {
            debug!("{}", line);
        }

        if !running.load(Ordering::Relaxed) {
            info!("Signal received, stopping after generation {}", generation);
            break;
        }
    }

    (pop, generation)
}

/// Run one generation: selection (which fits `pop` on `data`), then crossover and mutation
/// replacing `pop` entirely
///
/// # Returns
///
/// Best, mean and standard deviation of the fitness of the generation selected from.
#[inline]
pub fn evolve(pop: &mut Population, data: &Dataset, ga: &GA, rng: &mut ChaCha8Rng) -> (u32, f64, f64) {
    let staging = select_parents(pop, data, ga, rng);
    let stats = pop.fit_stats();

    *pop = cross_over(&staging, ga, rng);

    stats
}

/// Replace `value` by a fresh draw in `0..=MAX_FEATURE_VAL` with probability `rate / 100`
#[inline]
pub fn mutate_element(value: u8, rate: f64, rng: &mut ChaCha8Rng) -> u8 {
    if rng.gen_range(0.0..100.0) < rate {
        random_value(rng)
    } else {
        value
    }
}

/// Apply `mutate_element` independently to every position
pub fn mutate_gene(values: &mut [u8], rate: f64, rng: &mut ChaCha8Rng) {
    for value in values.iter_mut() {
        *value = mutate_element(*value, rate, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossover::CrossoverMethod;
    use crate::data::MAX_FEATURE_VAL;
    use crate::fitness::{fitness, max_score};
    use crate::gene::GENE_LEN;
    use crate::selection::SelectionMethod;
    use rand::SeedableRng;

    fn create_test_params(generations: usize) -> Param {
        let mut param = Param::default();
        param.ga.generations = generations;
        param.ga.population_size = 10;
        param.general.display_colorful = false;
        param
    }

    #[test]
    fn test_mutate_with_zero_rate_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let original: Vec<u8> = (0..GENE_LEN).map(|i| (i % 17) as u8).collect();
        let mut values = original.clone();

        mutate_gene(&mut values, 0.0, &mut rng);

        assert_eq!(values, original);
    }

    #[test]
    fn test_mutate_with_100_percent_rate_replaces_everything() {
        let original = vec![0u8; GENE_LEN];
        let mut values = original.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        mutate_gene(&mut values, 100.0, &mut rng);

        // replay the draws: one roll then one replacement value per position
        let mut replay = ChaCha8Rng::seed_from_u64(42);
        let expected: Vec<u8> = (0..GENE_LEN)
            .map(|_| {
                let _roll: f64 = replay.gen_range(0.0..100.0);
                random_value(&mut replay)
            })
            .collect();
        assert_eq!(values, expected);

        let changed = values.iter().filter(|&&v| v != 0).count();
        assert!(changed > 500, "only {} positions changed", changed);
    }

    #[test]
    fn test_mutate_respects_value_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut values = vec![MAX_FEATURE_VAL; GENE_LEN];
        for _ in 0..20 {
            mutate_gene(&mut values, 30.0, &mut rng);
            assert!(values.iter().all(|&v| v <= MAX_FEATURE_VAL));
        }
    }

    #[test]
    fn test_mutate_rate_is_a_percentage() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        // 17 is out of the drawable range, so every replacement is visible
        let mutations = (0..10_000)
            .filter(|_| mutate_element(17, 2.0, &mut rng) != 17)
            .count();
        assert!(mutations > 100 && mutations < 300, "{} mutations for 10000 draws at 2%", mutations);
    }

    #[test]
    fn test_evolve_keeps_population_size() {
        let data = Dataset::test_blocks(2, 0);
        let param = create_test_params(1);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::generate(10, &mut rng);

        let (best, mean, _) = evolve(&mut pop, &data, &param.ga, &mut rng);

        assert_eq!(pop.len(), 10);
        assert!(best <= max_score(&data));
        assert!(mean <= best as f64);
        // children are not fitted yet
        assert!(pop.genes.iter().all(|g| g.fit == 0));
    }

    #[test]
    fn test_ga_runs_all_generations() {
        let data = Dataset::test_blocks(2, 0);
        let running = Arc::new(AtomicBool::new(true));
        let param = create_test_params(5);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let (pop, generations) = ga(&data, &param, running, &mut rng);

        assert_eq!(generations, 5);
        assert_eq!(pop.len(), 10);
    }

    #[test]
    fn test_ga_accepts_unvalidated_display_every() {
        let data = Dataset::test_blocks(1, 0);
        let mut param = create_test_params(3);
        param.general.display_every = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let (pop, generations) = ga(&data, &param, Arc::new(AtomicBool::new(true)), &mut rng);

        assert_eq!(generations, 3);
        assert_eq!(pop.len(), 10);
    }

    #[test]
    fn test_ga_stops_on_signal() {
        let data = Dataset::test_blocks(1, 0);
        let running = Arc::new(AtomicBool::new(false));
        let param = create_test_params(50);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let (pop, generations) = ga(&data, &param, running, &mut rng);

        assert_eq!(generations, 1);
        assert_eq!(pop.len(), 10);
    }

    #[test]
    fn test_ga_deterministic_with_seed() {
        let data = Dataset::test_blocks(2, 1);
        let mut param = create_test_params(4);
        param.ga.selection = SelectionMethod::Tournament;
        param.ga.tournament_size = 4;
        param.ga.crossover = CrossoverMethod::TwoPoint;

        let (a, _) = ga(&data, &param, Arc::new(AtomicBool::new(true)), &mut ChaCha8Rng::seed_from_u64(42));
        let (b, _) = ga(&data, &param, Arc::new(AtomicBool::new(true)), &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ga_improves_on_learnable_data() {
        let data = Dataset::test_blocks(3, 0);
        let mut param = create_test_params(60);
        param.ga.population_size = 20;
        param.ga.mutation_rate = 2.0;
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let initial = Population::generate(20, &mut ChaCha8Rng::seed_from_u64(42));
        let initial_best = initial.genes.iter().map(|g| fitness(&g.values, &data)).max().unwrap();

        let (pop, _) = ga(&data, &param, Arc::new(AtomicBool::new(true)), &mut rng);
        let (_, final_best) = pop.evaluate(&data).unwrap();

        assert!(final_best >= initial_best, "{} < {}", final_best, initial_best);
    }
}
