// Piece complexity feature extraction

pub mod extractors;
pub mod vector;
pub mod builder;

pub use vector::*;
pub use builder::*;
