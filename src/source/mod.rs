//! Run table sources
//!
//! A source lists experiments and fetches one immutable [`RunTable`] per
//! experiment. Sources must normalize absent values to the missing sentinel
//! before returning a table, and report transport failures as
//! [`crate::Error::SourceUnavailable`]. Nothing above this layer retries.
//!
//! # Example
//!
//! ```rust
//! use traktor_ml::experiment::{Experiment, RunTable};
//! use traktor_ml::source::{MemoryRunSource, RunTableSource};
//!
//! let mut source = MemoryRunSource::new();
//! source.insert(Experiment::new("Big Pickle", "1"), RunTable::empty());
//!
//! assert_eq!(source.list_experiments()?.len(), 1);
//! assert!(source.fetch_run_table("Big Pickle")?.is_empty());
//! # Ok::<(), traktor_ml::Error>(())
//! ```

mod memory;
#[cfg(feature = "mlflow")]
pub mod mlflow;
pub mod parquet_dir;
pub mod synthetic;

pub use memory::MemoryRunSource;
#[cfg(feature = "mlflow")]
pub use mlflow::MlflowRunSource;
pub use parquet_dir::ParquetRunSource;
pub use synthetic::SyntheticRunSource;

use crate::experiment::{Experiment, RunTable};
use crate::Result;

/// Supplier of experiment listings and run tables.
///
/// Calls are blocking; the UI thread waits for them.
pub trait RunTableSource {
    /// List experiments in display order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SourceUnavailable`] if the listing cannot be
    /// retrieved.
    fn list_experiments(&self) -> Result<Vec<Experiment>>;

    /// Fetch the run table for an experiment by name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SourceUnavailable`] if the table cannot be
    /// retrieved, or [`crate::Error::InvalidTable`] if it is malformed.
    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable>;

    /// Short label for status lines and logs.
    fn describe(&self) -> String {
        "run table source".to_string()
    }
}

impl<T: RunTableSource + ?Sized> RunTableSource for Box<T> {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        (**self).list_experiments()
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        (**self).fetch_run_table(experiment_name)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
