//! In-memory run table source.
//!
//! Tables live for the life of the source. Used by tests, the synthetic
//! generator, and anything that already has its tables loaded.

use rustc_hash::FxHashMap;

use super::RunTableSource;
use crate::experiment::{Experiment, RunTable};
use crate::{Error, Result};

/// In-memory source keyed by experiment name.
///
/// Experiments are listed in insertion order. Re-inserting a name replaces
/// its table and keeps its listing position.
///
/// # Example
///
/// ```rust
/// use traktor_ml::experiment::{Experiment, RunTable};
/// use traktor_ml::source::{MemoryRunSource, RunTableSource};
///
/// let source = MemoryRunSource::new()
///     .with_experiment(Experiment::new("a", "0"), RunTable::empty())
///     .with_experiment(Experiment::new("b", "1"), RunTable::empty());
///
/// let names: Vec<String> = source
///     .list_experiments()?
///     .iter()
///     .map(|e| e.name().to_string())
///     .collect();
/// assert_eq!(names, vec!["a", "b"]);
/// # Ok::<(), traktor_ml::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryRunSource {
    experiments: Vec<Experiment>,
    tables: FxHashMap<String, RunTable>,
}

impl MemoryRunSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            experiments: Vec::with_capacity(capacity),
            tables: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Builder-style [`MemoryRunSource::insert`].
    #[must_use]
    pub fn with_experiment(mut self, experiment: Experiment, table: RunTable) -> Self {
        self.insert(experiment, table);
        self
    }

    /// Add or replace an experiment's table.
    pub fn insert(&mut self, experiment: Experiment, table: RunTable) {
        let name = experiment.name().to_string();
        match self.experiments.iter_mut().find(|e| e.name() == name) {
            Some(existing) => *existing = experiment,
            None => self.experiments.push(experiment),
        }
        self.tables.insert(name, table);
    }

    /// Number of experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the source is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

impl RunTableSource for MemoryRunSource {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        Ok(self.experiments.clone())
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        self.tables.get(experiment_name).cloned().ok_or_else(|| {
            Error::SourceUnavailable(format!("no run table for experiment '{experiment_name}'"))
        })
    }

    fn describe(&self) -> String {
        format!("memory ({} experiments)", self.experiments.len())
    }
}
