use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::gene::Gene;
use crate::param::Param;
use crate::utils::round2;

/// Outcome of one direction of the two-fold protocol
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoldResult {
    /// Name of the training dataset
    pub train: String,
    /// Name of the test dataset
    pub test: String,
    /// Best score reached on the test set by any gene of the final population
    pub correct: u32,
    /// Highest reachable score on the test set
    pub max_score: u32,
    pub test_rows: usize,
    pub generations_run: usize,
    /// The gene that reached `correct`
    pub best_gene: Gene,
}

impl FoldResult {
    pub fn display(&self) -> String {
        format!(
            "Training set: {}, test set: {}\nCorrect categorisations = {}/{}",
            self.train, self.test, self.correct, self.test_rows
        )
    }
}

/// One complete two-fold run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attempt {
    pub folds: Vec<FoldResult>,
    pub total_correct: u32,
    pub total_rows: usize,
    pub percentage: f64,
}

impl Attempt {
    pub fn new(folds: Vec<FoldResult>) -> Attempt {
        let total_correct: u32 = folds.iter().map(|f| f.correct).sum();
        let total_rows: usize = folds.iter().map(|f| f.test_rows).sum();
        let percentage = if total_rows > 0 {
            100.0 * total_correct as f64 / total_rows as f64
        } else {
            0.0
        };

        Attempt { folds, total_correct, total_rows, percentage }
    }

    pub fn display(&self) -> String {
        let mut str = String::new();
        for fold in &self.folds {
            str.push_str(&format!("{}\n\n", fold.display()));
        }
        str.push_str(&format!(
            "Total correct: {}/{} = {}% ({}%)",
            self.total_correct,
            self.total_rows,
            round2(self.percentage),
            self.percentage
        ));
        str
    }
}

/// Everything produced by one invocation: parameters, every attempt and the retained one
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    /// Experiment ID, i.e., timestamp and strategies
    pub id: String,
    /// Timestamp of the experiment
    pub timestamp: String,
    /// Crate version and git hash used
    pub version: String,
    pub parameters: Param,
    /// Names and sizes of the two datasets
    pub datasets: Vec<(String, usize)>,
    pub attempts: Vec<Attempt>,
    /// Index in `attempts` of the reported attempt
    pub best_attempt: usize,
    /// Whether the reported attempt exceeded the accuracy threshold
    pub threshold_reached: bool,
    /// Execution time in seconds
    pub execution_time: f64,
}

impl Experiment {
    pub fn best(&self) -> Option<&Attempt> {
        self.attempts.get(self.best_attempt)
    }

    pub fn percentage(&self) -> f64 {
        self.best().map(|a| a.percentage).unwrap_or(0.0)
    }

    pub fn display(&self) -> String {
        let mut str = format!(
            "Experiment {} ({}) - {} attempt(s) in {:.2}s",
            self.id,
            self.version,
            self.attempts.len(),
            self.execution_time
        );

        if self.attempts.len() > 1 {
            let history: Vec<String> = self.attempts.iter().map(|a| format!("{:.2}%", a.percentage)).collect();
            str = format!("{}\nAttempts: {}", str, history.join(", "));
        }

        if let Some(best) = self.best() {
            str = format!("{}\n\n{}", str, best.display());
        }

        if !self.threshold_reached {
            str = format!(
                "{}\n\x1b[1;33mAccuracy threshold ({:.2}%) not exceeded, best attempt shown\x1b[0m",
                str, self.parameters.retry.accuracy_threshold_pct
            );
        }

        str
    }

    /// Saves the experiment, the format being chosen from the file extension
    /// (json, yaml/yml, bin/bincode; json otherwise)
    pub fn save_auto<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => self.save_json(path),
            "yaml" | "yml" => self.save_yaml(path),
            "bin" | "bincode" => self.save_bincode(path),
            _ => {
                warn!("Unknown format. Saving experiment in json.");
                self.save_json(path.with_extension("json"))
            }
        }
    }

    fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn save_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Loads the experiment from a file, automatically detecting the format based on file extension.
    pub fn load_auto<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&content)?)
            }
            "bin" | "bincode" => {
                let content = std::fs::read(path)?;
                Ok(bincode::deserialize(&content)?)
            }
            _ => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
        }
    }
}
