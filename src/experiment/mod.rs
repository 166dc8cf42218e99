//! Experiment data model
//!
//! This module provides the immutable inputs of the view engine: the
//! experiment listing and the run table fetched for one experiment.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< RunTable (1) ──< RunRecord (N) ──< CellValue (one per column)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use traktor_ml::experiment::{CellValue, RunRecord, RunTable};
//!
//! let table = RunTable::new(
//!     vec!["run_id".into(), "metrics.MAE".into()],
//!     vec![RunRecord::builder("r1").value("r1").value(0.2).build()],
//! )?;
//!
//! assert_eq!(table.value("r1", "metrics.MAE"), Some(&CellValue::Number(0.2)));
//! # Ok::<(), traktor_ml::Error>(())
//! ```

mod cell;
mod experiment_record;
mod run_record;
mod table;

pub use cell::{CellValue, MISSING_VALUE};
pub use experiment_record::Experiment;
pub use run_record::{RunRecord, RunRecordBuilder};
pub use table::RunTable;
