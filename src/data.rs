use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use log::{info, warn};
use crate::error::{ProtoError, Result};

/// Number of feature values in a dataset row (the label comes after them).
pub const FEATURE_LEN: usize = 64;
/// Largest value a feature (or a gene element) may hold; the range is `0..=MAX_FEATURE_VAL`.
pub const MAX_FEATURE_VAL: u8 = 16;
/// Number of classes, labels are `0..NUM_CLASSES`.
pub const NUM_CLASSES: usize = 10;
/// Rows are compared block by block during fitness evaluation.
pub const BLOCK_SIZE: usize = 10;

/// One labelled row: `FEATURE_LEN` values in `0..=MAX_FEATURE_VAL` and a class label.
#[derive(Clone, PartialEq, Eq)]
pub struct FeatureRow {
    features: [u8; FEATURE_LEN],
    label: u8,
}

impl FeatureRow {
    pub fn new(features: &[u8], label: u8) -> Result<FeatureRow> {
        if features.len() != FEATURE_LEN {
            return Err(ProtoError::MalformedDataset(format!(
                "expected {} feature values, got {}",
                FEATURE_LEN,
                features.len()
            )));
        }

        if let Some((pos, value)) = features.iter().enumerate().find(|(_, &v)| v > MAX_FEATURE_VAL) {
            return Err(ProtoError::MalformedDataset(format!(
                "feature #{} has value {} outside [0, {}]",
                pos, value, MAX_FEATURE_VAL
            )));
        }

        if label as usize >= NUM_CLASSES {
            return Err(ProtoError::MalformedDataset(format!(
                "label {} outside [0, {})",
                label, NUM_CLASSES
            )));
        }

        let mut row = [0u8; FEATURE_LEN];
        row.copy_from_slice(features);
        Ok(FeatureRow { features: row, label })
    }

    pub fn features(&self) -> &[u8] {
        &self.features
    }

    pub fn label(&self) -> u8 {
        self.label
    }
}

impl fmt::Debug for FeatureRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.features.iter().map(|v| v.to_string()).collect();
        write!(f, "[{}] -> {}", values.join(","), self.label)
    }
}

/// An ordered, read-only set of rows whose length is a multiple of `BLOCK_SIZE`.
#[derive(Clone)]
pub struct Dataset {
    pub name: String,
    rows: Vec<FeatureRow>,
}

impl Dataset {
    /// Build a dataset, rejecting empty inputs and partial trailing blocks.
    pub fn new(name: &str, rows: Vec<FeatureRow>) -> Result<Dataset> {
        if rows.is_empty() {
            return Err(ProtoError::MalformedDataset(format!("{} is empty", name)));
        }

        if rows.len() % BLOCK_SIZE != 0 {
            return Err(ProtoError::MalformedDataset(format!(
                "{} has {} rows, which is not a multiple of the block size ({})",
                name,
                rows.len(),
                BLOCK_SIZE
            )));
        }

        Ok(Dataset { name: name.to_string(), rows })
    }

    /// Load a headerless comma separated file, one row per line: 64 feature values then the label.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        info!("Loading file {}...", path.display());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset")
            .to_string();
        let file = File::open(path)?;
        Dataset::from_reader(&name, BufReader::new(file))
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Dataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            // blank trailing lines
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            if record.len() != FEATURE_LEN + 1 {
                return Err(ProtoError::MalformedDataset(format!(
                    "{} line {}: expected {} fields, got {}",
                    name,
                    line,
                    FEATURE_LEN + 1,
                    record.len()
                )));
            }

            let mut values = Vec::with_capacity(FEATURE_LEN + 1);
            for field in record.iter() {
                let value: u8 = field.parse().map_err(|_| {
                    ProtoError::MalformedDataset(format!(
                        "{} line {}: '{}' is not a valid value",
                        name, line, field
                    ))
                })?;
                values.push(value);
            }

            let row = FeatureRow::new(&values[..FEATURE_LEN], values[FEATURE_LEN]).map_err(|e| {
                ProtoError::MalformedDataset(format!("{} line {}: {}", name, line, e))
            })?;
            rows.push(row);
        }

        Dataset::new(name, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Contiguous groups of `BLOCK_SIZE` rows. Always complete thanks to `Dataset::new`.
    pub fn blocks(&self) -> std::slice::ChunksExact<'_, FeatureRow> {
        self.rows.chunks_exact(BLOCK_SIZE)
    }

    pub fn block_count(&self) -> usize {
        self.rows.len() / BLOCK_SIZE
    }

    /// Indices of blocks that do not hold exactly one row of every class.
    pub fn irregular_blocks(&self) -> Vec<usize> {
        self.blocks()
            .enumerate()
            .filter(|(_, block)| {
                let mut seen = [false; NUM_CLASSES];
                for row in block.iter() {
                    seen[row.label as usize] = true;
                }
                !seen.iter().all(|&s| s)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Warn about irregular blocks, or refuse them when `enforce` is set.
    pub fn check_block_classes(&self, enforce: bool) -> Result<()> {
        let irregular = self.irregular_blocks();
        if irregular.is_empty() {
            return Ok(());
        }

        let shown: Vec<String> = irregular.iter().take(10).map(|i| i.to_string()).collect();
        let message = format!(
            "{}: {}/{} blocks do not contain one row of each class (blocks {}{})",
            self.name,
            irregular.len(),
            self.block_count(),
            shown.join(", "),
            if irregular.len() > 10 { ", ..." } else { "" }
        );

        if enforce {
            Err(ProtoError::MalformedDataset(message))
        } else {
            warn!("{}", message);
            Ok(())
        }
    }

    /// Number of rows of each class.
    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0; NUM_CLASSES];
        for row in &self.rows {
            counts[row.label as usize] += 1;
        }
        counts
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}   Rows: {}   Blocks: {}", self.name, self.len(), self.block_count())?;

        let counts: Vec<String> = self
            .class_counts()
            .iter()
            .enumerate()
            .map(|(class, n)| format!("{}:{}", class, n))
            .collect();
        writeln!(f, "Classes: {}", counts.join(" "))?;

        // Limit to the first 5 rows
        for row in self.rows.iter().take(5) {
            let rendered = format!("{:?}", row);
            let truncated = if rendered.len() > 80 {
                format!("{}...", &rendered[..77])
            } else {
                rendered
            };
            writeln!(f, "{}", truncated)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the Display formatter
        write!(f, "{}", self)
    }
}

#[cfg(test)]
impl Dataset {
    /// `blocks` blocks, each holding rows labelled 0..9 in order. Row `c` of every block is
    /// filled with `c + offset` (clamped), so prototypes equal to `c` match class `c`.
    pub fn test_blocks(blocks: usize, offset: u8) -> Dataset {
        let mut rows = Vec::new();
        for _ in 0..blocks {
            for class in 0..NUM_CLASSES as u8 {
                let value = (class + offset).min(MAX_FEATURE_VAL);
                rows.push(FeatureRow::new(&[value; FEATURE_LEN], class).unwrap());
            }
        }
        Dataset::new("test", rows).unwrap()
    }
}
