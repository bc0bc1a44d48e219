//! Command line argument parsing for the classy worker using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::classifier::Algorithm;

/// classy - classify or train one JSON document against a count database
#[derive(Parser, Debug, Clone)]
#[command(name = "classy")]
#[command(about = "Classify or train one JSON document against a count database")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClassyArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the SQLite count database
    #[arg(long = "dbpath", value_name = "PATH", env = "CLASSY_DBPATH")]
    pub db_path: PathBuf,

    /// Classification algorithm
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Algorithm::NaiveBayes)]
    pub algorithm: Algorithm,

    /// Name of the built-in feature function
    #[arg(short, long, default_value = "getWords")]
    pub feature: String,

    /// The document, as JSON
    #[arg(short, long)]
    pub data: String,

    /// Label printed when no category is confident enough
    #[arg(long, value_name = "LABEL")]
    pub default: Option<String>,

    /// Train the document under CATEGORY instead of classifying it
    #[arg(long, value_name = "CATEGORY")]
    pub train: Option<String>,

    /// JSON file with thresholds, minimums and assumed probabilities
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl ClassyArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Output format for the classification result
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// The bare label
    Text,
    /// A JSON object
    Json,
}
