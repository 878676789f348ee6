use crate::crossover::CrossoverMethod;
use crate::error::{ProtoError, Result};
use crate::gene::GENE_LEN;
use crate::selection::SelectionMethod;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ga: GA,
    #[serde(default)]
    pub retry: Retry,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "one_default")]
    pub thread_number: usize,
    #[serde(default = "empty_string")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "true_default")]
    pub display_colorful: bool,
    #[serde(default = "display_every_default")]
    pub display_every: usize,
    #[serde(default = "empty_string")]
    pub save_exp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Data {
    #[serde(default = "dataset_a_default")]
    pub dataset_a: String,
    #[serde(default = "dataset_b_default")]
    pub dataset_b: String,
    #[serde(default = "false_default")]
    pub enforce_block_classes: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "pop_size_default")]
    pub population_size: usize,
    #[serde(default = "generations_default")]
    pub generations: usize,
    #[serde(default = "mutation_rate_default")]
    pub mutation_rate: f64,
    #[serde(default = "tournament_size_default")]
    pub tournament_size: usize,
    #[serde(default = "selection_default")]
    pub selection: SelectionMethod,
    #[serde(default = "crossover_default")]
    pub crossover: CrossoverMethod,
    #[serde(default = "half_pct_default")]
    pub uniform_swap_pct: f64,
    #[serde(default = "max_sections_default")]
    pub max_sections: usize,
    #[serde(default = "false_default")]
    pub reshuffle_each_tournament: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Retry {
    #[serde(default = "accuracy_threshold_default")]
    pub accuracy_threshold_pct: f64,
    #[serde(default = "max_attempts_default")]
    pub max_attempts: usize,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Data {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Retry {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

/// Read and validate a YAML parameter file.
pub fn get<P: AsRef<Path>>(param_file: P) -> Result<Param> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    validate(&mut config)?;

    Ok(config)
}

pub fn validate(param: &mut Param) -> Result<()> {
    if !param.general.log_base.is_empty() {
        param.general.display_colorful = false;
    }

    if param.general.thread_number == 0 {
        warn!("thread_number=0: using a single thread.");
        param.general.thread_number = 1;
    }

    if param.general.display_every == 0 {
        param.general.display_every = 1;
    }

    validate_ga(&param.ga)?;

    if param.retry.max_attempts == 0 {
        return Err(ProtoError::Config(
            "max_attempts must be at least 1.".to_string(),
        ));
    }

    if param.retry.accuracy_threshold_pct >= 100.0 {
        warn!(
            "accuracy_threshold_pct={:.1} can never be exceeded: all {} attempts will run.",
            param.retry.accuracy_threshold_pct, param.retry.max_attempts
        );
    }

    Ok(())
}

fn validate_ga(ga: &GA) -> Result<()> {
    if ga.population_size < 2 || ga.population_size % 2 != 0 {
        return Err(ProtoError::Config(format!(
            "Invalid population_size={}. Must be even and >= 2 (children are produced in pairs).",
            ga.population_size
        )));
    }

    if ga.generations == 0 {
        return Err(ProtoError::Config("generations must be >= 1.".to_string()));
    }

    if !(0.0..=100.0).contains(&ga.mutation_rate) {
        return Err(ProtoError::Config(format!(
            "Invalid mutation_rate={:.3}. Must be a percentage in [0, 100].",
            ga.mutation_rate
        )));
    }

    if !(0.0..=100.0).contains(&ga.uniform_swap_pct) {
        return Err(ProtoError::Config(format!(
            "Invalid uniform_swap_pct={:.3}. Must be a percentage in [0, 100].",
            ga.uniform_swap_pct
        )));
    }

    if ga.selection == SelectionMethod::Tournament
        && (ga.tournament_size < 2 || ga.tournament_size > ga.population_size)
    {
        return Err(ProtoError::Config(format!(
            "Invalid tournament_size={}. Must be in [2, population_size={}].",
            ga.tournament_size, ga.population_size
        )));
    }

    if ga.max_sections == 0 || ga.max_sections > GENE_LEN {
        return Err(ProtoError::Config(format!(
            "Invalid max_sections={}. Must be in [1, {}].",
            ga.max_sections, GENE_LEN
        )));
    }

    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn empty_string() -> String {
    "".to_string()
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn display_every_default() -> usize {
    50
}
fn dataset_a_default() -> String {
    "data/cw2DataSet1.csv".to_string()
}
fn dataset_b_default() -> String {
    "data/cw2DataSet2.csv".to_string()
}
fn false_default() -> bool {
    false
}
fn true_default() -> bool {
    true
}
fn one_default() -> usize {
    1
}
fn pop_size_default() -> usize {
    40
}
fn generations_default() -> usize {
    300
}
fn mutation_rate_default() -> f64 {
    1.5
}
fn tournament_size_default() -> usize {
    10
}
fn selection_default() -> SelectionMethod {
    SelectionMethod::BestPair
}
fn crossover_default() -> CrossoverMethod {
    CrossoverMethod::Uniform
}
fn half_pct_default() -> f64 {
    50.0
}
fn max_sections_default() -> usize {
    64
}
fn accuracy_threshold_default() -> f64 {
    64.0
}
fn max_attempts_default() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let param = Param::default();
        assert_eq!(param.ga.population_size, 40);
        assert_eq!(param.ga.generations, 300);
        assert_eq!(param.ga.tournament_size, 10);
        assert_eq!(param.ga.mutation_rate, 1.5);
        assert_eq!(param.ga.selection, SelectionMethod::BestPair);
        assert_eq!(param.ga.crossover, CrossoverMethod::Uniform);
        assert_eq!(param.retry.accuracy_threshold_pct, 64.0);
        assert_eq!(param.retry.max_attempts, 10);
    }

    #[test]
    fn test_yaml_partial_sections_use_defaults() {
        let yaml = "ga:\n  selection: tournament\n  crossover: multi_point\n  generations: 5\nretry:\n  max_attempts: 2\n";
        let mut param: Param = serde_yaml::from_str(yaml).unwrap();
        validate(&mut param).unwrap();

        assert_eq!(param.ga.selection, SelectionMethod::Tournament);
        assert_eq!(param.ga.crossover, CrossoverMethod::MultiPoint);
        assert_eq!(param.ga.generations, 5);
        assert_eq!(param.ga.population_size, 40);
        assert_eq!(param.retry.max_attempts, 2);
        assert_eq!(param.general.seed, 4815162342);
    }

    #[test]
    fn test_validate_rejects_odd_population() {
        let mut param = Param::default();
        param.ga.population_size = 41;
        assert!(matches!(validate(&mut param), Err(ProtoError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_mutation_rate() {
        let mut param = Param::default();
        param.ga.mutation_rate = 120.0;
        assert!(validate(&mut param).is_err());
        param.ga.mutation_rate = -1.0;
        assert!(validate(&mut param).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_tournament() {
        let mut param = Param::default();
        param.ga.selection = SelectionMethod::Tournament;
        param.ga.tournament_size = 41;
        assert!(validate(&mut param).is_err());

        // irrelevant for best pair selection
        param.ga.selection = SelectionMethod::BestPair;
        assert!(validate(&mut param).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts_and_sections() {
        let mut param = Param::default();
        param.retry.max_attempts = 0;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.ga.max_sections = GENE_LEN + 1;
        assert!(validate(&mut param).is_err());
    }

    #[test]
    fn test_log_file_disables_colors() {
        let mut param = Param::default();
        param.general.log_base = "run".to_string();
        validate(&mut param).unwrap();
        assert!(!param.general.display_colorful);
    }
}
