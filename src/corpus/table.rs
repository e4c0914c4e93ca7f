// Feature table assembled from a corpus run

use crate::features::{FeatureVector, FEATURE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Error type for writing a feature table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk format of a feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// One row per successfully processed piece, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureVector>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `file` followed by the feature schema
    pub fn header() -> Vec<&'static str> {
        std::iter::once("file").chain(FEATURE_COLUMNS).collect()
    }

    /// Undefined values are written as empty cells
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(Self::header())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(FEATURE_COLUMNS.len() + 1);
            record.push(row.file.clone());
            record.extend(row.values().iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Array of objects; undefined values are written as `null`
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), TableError> {
        serde_json::to_writer_pretty(writer, &self.rows)?;
        Ok(())
    }

    pub fn save(&self, path: &Path, format: OutputFormat) -> Result<(), TableError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        match format {
            OutputFormat::Csv => self.write_csv(file),
            OutputFormat::Json => self.write_json(file),
        }
    }
}

impl IntoIterator for FeatureTable {
    type Item = FeatureVector;
    type IntoIter = std::vec::IntoIter<FeatureVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
