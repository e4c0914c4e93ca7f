// Decoded piece representation and the adapters that produce it

pub mod table;
pub mod csv_io;
pub mod midi_import;

pub use table::*;
pub use csv_io::*;
pub use midi_import::*;

use std::path::Path;

/// Error type for loading an event table
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("MIDI decode error: {0}")]
    Midi(String),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Load a table from disk, picking the adapter by file extension.
pub fn load_event_table(path: &Path) -> Result<EventTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => load_event_csv(path),
        "mid" | "midi" => import_midi(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}
