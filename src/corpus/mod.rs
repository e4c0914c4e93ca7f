// Corpus-wide feature extraction

pub mod discovery;
pub mod processor;
pub mod table;

pub use discovery::*;
pub use processor::*;
pub use table::*;
