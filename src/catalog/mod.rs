// Difficulty catalog and nearby-difficulty recommendations

pub mod recommend;

pub use recommend::*;

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Error type for catalog loading
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Piece not found in catalog: {0}")]
    UnknownPiece(String),
}

/// One piece with its predicted difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub file: String,
    pub predicted_difficulty: f64,
}

impl CatalogEntry {
    /// File name without its extension, for display
    pub fn title(&self) -> &str {
        Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file)
    }
}

/// Catalog row as written by the predictor; the difficulty cell may be blank
#[derive(Debug, Deserialize)]
struct CatalogRow {
    file: String,
    predicted_difficulty: Option<f64>,
}

/// Precomputed difficulty predictions for a corpus
#[derive(Debug, Clone, Default)]
pub struct DifficultyCatalog {
    entries: Vec<CatalogEntry>,
}

impl DifficultyCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Read `file,predicted_difficulty` rows; other columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();
        for record in csv_reader.deserialize() {
            let row: CatalogRow = record?;
            match row.predicted_difficulty {
                Some(difficulty) if !difficulty.is_nan() => entries.push(CatalogEntry {
                    file: row.file,
                    predicted_difficulty: difficulty,
                }),
                _ => log::warn!("Catalog entry {} has no difficulty, ignoring", row.file),
            }
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(std::io::BufReader::new(file))?;
        log::debug!("Loaded {} catalog entries from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find a piece by exact file name or by name without extension
    pub fn lookup(&self, piece: &str) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .iter()
            .find(|e| e.file == piece)
            .or_else(|| self.entries.iter().find(|e| e.title() == piece))
            .ok_or_else(|| CatalogError::UnknownPiece(piece.to_string()))
    }
}
