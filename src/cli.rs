// Command-line surface

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::corpus::OutputFormat;

/// Extract piano difficulty features from MIDI event logs
#[derive(Debug, Parser)]
#[command(name = "scaleup", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a feature table for a corpus of pieces
    Extract(ExtractArgs),

    /// Print the feature vector of a single piece
    Features {
        /// Event CSV or MIDI file
        file: PathBuf,
    },

    /// Flatten a MIDI file into an event CSV
    Convert {
        midi: PathBuf,

        /// Output CSV (defaults to the input name with a .csv extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest pieces of similar difficulty
    Recommend(RecommendArgs),

    /// List catalog pieces grouped by difficulty range
    Ranges {
        /// CSV with `file` and `predicted_difficulty` columns
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input files or directories
    #[arg(required_unless_present = "file_list")]
    pub inputs: Vec<PathBuf>,

    /// Output table path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Search directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Read input paths from this file instead, one per line
    #[arg(long, conflicts_with = "inputs")]
    pub file_list: Option<PathBuf>,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// CSV with `file` and `predicted_difficulty` columns
    #[arg(long)]
    pub catalog: PathBuf,

    /// Recommend around this catalog piece
    #[arg(long, conflicts_with = "difficulty", required_unless_present = "difficulty")]
    pub piece: Option<String>,

    /// Recommend around this difficulty
    #[arg(long)]
    pub difficulty: Option<f64>,

    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}
