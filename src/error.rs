//! Error types for traktor-ml
//!
//! Every error names what the operator can do about it: pick another
//! experiment, fix the source configuration, or check the tracking server.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// traktor-ml error types
#[derive(Error, Debug)]
pub enum Error {
    /// The run table source could not be reached or returned garbage
    #[error("Run table source unavailable: {0}")]
    SourceUnavailable(String),

    /// Selection referenced an experiment id that is not in the last listing
    #[error("Unknown experiment: {0}\nRefresh the experiment list and select again")]
    UnknownExperiment(String),

    /// A source produced a table that violates the run table invariants
    #[error("Invalid run table: {0}")]
    InvalidTable(String),

    /// An operation needed a selected experiment and none was selected
    #[error("No experiment selected")]
    NoExperimentSelected,

    /// Configuration could not be turned into a usable source
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
