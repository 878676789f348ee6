use crate::cinfo;
use crate::data::Dataset;
use crate::error::{ProtoError, Result};
use crate::experiment::{Attempt, Experiment, FoldResult};
use crate::fitness::max_score;
use crate::ga::ga;
use crate::param::{self, Param};
use chrono::Local;
use log::{info, warn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Two-fold protocol: train on A and test on B, then train on B and test on A.
pub struct TwoFold<'a> {
    /// (training set, test set) of each fold
    pub folds: Vec<(&'a Dataset, &'a Dataset)>,
}

impl<'a> TwoFold<'a> {
    pub fn new(a: &'a Dataset, b: &'a Dataset) -> TwoFold<'a> {
        TwoFold { folds: vec![(a, b), (b, a)] }
    }

    /// Run every fold once, in parallel on `thread_number` threads.
    ///
    /// Each fold gets its own generator, seeded from `rng` before any fold starts, so the
    /// result does not depend on the thread count.
    pub fn pass(&self, param: &Param, running: Arc<AtomicBool>, rng: &mut ChaCha8Rng) -> Result<Vec<FoldResult>> {
        let seeds: Vec<u64> = self.folds.iter().map(|_| rng.next_u64()).collect();

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(param.general.thread_number)
            .build()?;

        let results: Vec<Result<FoldResult>> = thread_pool.install(|| {
            self.folds
                .par_iter()
                .zip(seeds.par_iter())
                .enumerate()
                .map(|(i, (&(train, test), &seed))| {
                    cinfo!(param.general.display_colorful, "\x1b[1;93mCompleting fold #{}...\x1b[0m", i + 1);
                    let result = run_fold(train, test, param, Arc::clone(&running), seed)?;
                    cinfo!(
                        param.general.display_colorful,
                        "\x1b[1;93mFold #{} completed | {} -> {} | correct {}/{}\x1b[0m",
                        i + 1,
                        result.train,
                        result.test,
                        result.correct,
                        result.test_rows
                    );
                    Ok(result)
                })
                .collect()
        });

        results.into_iter().collect()
    }
}

/// Evolve on `train` and report the best score of the final population on `test`
pub fn run_fold(train: &Dataset, test: &Dataset, param: &Param, running: Arc<AtomicBool>, seed: u64) -> Result<FoldResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (pop, generations_run) = ga(train, param, running, &mut rng);

    let (index, correct) = pop
        .evaluate(test)
        .ok_or_else(|| ProtoError::Config("the final population is empty".to_string()))?;

    let mut best_gene = pop.genes[index].clone();
    best_gene.fit = correct;

    Ok(FoldResult {
        train: train.name.clone(),
        test: test.name.clone(),
        correct,
        max_score: max_score(test),
        test_rows: test.len(),
        generations_run,
        best_gene,
    })
}

/// Run the two-fold protocol until the accuracy exceeds `retry.accuracy_threshold_pct`, at
/// most `retry.max_attempts` times.
///
/// The reported attempt is the first one above the threshold, or the best one otherwise.
/// A cleared `running` flag ends the current attempt early and prevents further ones.
pub fn run_two_fold(a: &Dataset, b: &Dataset, param: &Param, running: Arc<AtomicBool>) -> Result<Experiment> {
    let start = Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    let mut param = param.clone();
    param::validate(&mut param)?;

    let threshold = param.retry.accuracy_threshold_pct;
    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);
    let two_fold = TwoFold::new(a, b);

    let mut attempts: Vec<Attempt> = Vec::new();
    let mut best_attempt = 0;
    let mut threshold_reached = false;

    for n in 1..=param.retry.max_attempts {
        cinfo!(
            param.general.display_colorful,
            "Attempt {}/{}\n-----------------------------------------------------",
            n,
            param.retry.max_attempts
        );

        let attempt = Attempt::new(two_fold.pass(&param, Arc::clone(&running), &mut rng)?);
        cinfo!(param.general.display_colorful, "\n{}", attempt.display());

        if attempts.is_empty() || attempt.percentage > attempts[best_attempt].percentage {
            best_attempt = attempts.len();
        }
        let percentage = attempt.percentage;
        attempts.push(attempt);

        if threshold <= 0.0 || percentage > threshold {
            threshold_reached = true;
            best_attempt = attempts.len() - 1;
            break;
        }

        if !running.load(Ordering::Relaxed) {
            warn!("Run interrupted: no further attempt.");
            break;
        }

        if n < param.retry.max_attempts {
            info!(
                "{:.2}% does not exceed the {:.2}% threshold, retrying...",
                percentage, threshold
            );
        }
    }

    if !threshold_reached {
        warn!(
            "No attempt exceeded {:.2}% after {} attempt(s). Reporting the best one ({:.2}%).",
            threshold,
            attempts.len(),
            attempts[best_attempt].percentage
        );
    }

    let version = format!(
        "{}#{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("PROTOGA_GIT_SHA").unwrap_or("unknown")
    );

    Ok(Experiment {
        id: format!(
            "protoga_{:?}_{:?}_{}",
            param.ga.selection, param.ga.crossover, timestamp
        )
        .to_lowercase(),
        timestamp,
        version,
        datasets: vec![(a.name.clone(), a.len()), (b.name.clone(), b.len())],
        attempts,
        best_attempt,
        threshold_reached,
        execution_time: start.elapsed().as_secs_f64(),
        parameters: param,
    })
}
