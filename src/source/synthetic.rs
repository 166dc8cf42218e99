//! Synthetic run tables for demos and local development.
//!
//! Generates fake tracking data without a tracking server: each run lands in
//! one of [`FAKE_EXPERIMENTS`] at random and logs a parameter, a metric that
//! is always present, and one that is present only some of the time so the
//! missing sentinel shows up in the grid.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{MemoryRunSource, RunTableSource};
use crate::experiment::{CellValue, Experiment, RunTable};
use crate::Result;

/// Experiment names runs are spread across.
pub const FAKE_EXPERIMENTS: [&str; 2] = ["Hyperparameter tuning never works", "Big Pickle"];

const STATUSES: [&str; 3] = ["FINISHED", "FINISHED", "FAILED"];
const OWNERS: [&str; 3] = ["ada", "grace", "linus"];

/// Column order of every generated table.
pub const SYNTHETIC_COLUMNS: [&str; 6] = [
    "run_id",
    "status",
    "params.fit_intercept",
    "metrics.MAE",
    "metrics.RMSE",
    "tags.owner",
];

/// Deterministic fake source.
#[derive(Debug, Clone)]
pub struct SyntheticRunSource {
    inner: MemoryRunSource,
    runs: usize,
    seed: u64,
}

impl SyntheticRunSource {
    /// Generate `runs` runs from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidTable`] only if generation produced
    /// a malformed table, which would be a bug.
    pub fn generate(runs: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut per_experiment: Vec<Vec<(String, HashMap<String, CellValue>)>> =
            vec![Vec::new(); FAKE_EXPERIMENTS.len()];

        for i in 0..runs {
            let bucket = rng.gen_range(0..FAKE_EXPERIMENTS.len());
            let run_id = format!("{:016x}{i:04}", rng.gen::<u64>());
            per_experiment[bucket].push((run_id.clone(), fake_run(&mut rng, run_id)));
        }

        let columns: Vec<String> = SYNTHETIC_COLUMNS.iter().map(ToString::to_string).collect();
        let mut inner = MemoryRunSource::with_capacity(FAKE_EXPERIMENTS.len());
        for (id, (name, runs)) in FAKE_EXPERIMENTS.iter().zip(per_experiment).enumerate() {
            let table = RunTable::from_sparse(columns.clone(), runs)?;
            inner.insert(Experiment::new(*name, id.to_string()), table);
        }

        tracing::debug!(runs, seed, "generated synthetic run tables");
        Ok(Self { inner, runs, seed })
    }

    /// Total number of generated runs.
    #[must_use]
    pub const fn runs(&self) -> usize {
        self.runs
    }
}

fn fake_run(rng: &mut StdRng, run_id: String) -> HashMap<String, CellValue> {
    let mut cells = HashMap::new();
    cells.insert("run_id".to_string(), CellValue::Text(run_id));
    cells.insert(
        "status".to_string(),
        CellValue::text(*STATUSES.choose(rng).unwrap_or(&"FINISHED")),
    );
    cells.insert(
        "params.fit_intercept".to_string(),
        CellValue::text(if rng.gen_bool(0.5) { "1" } else { "0" }),
    );
    cells.insert("metrics.MAE".to_string(), CellValue::number(rng.gen::<f64>()));
    if rng.gen_bool(0.6) {
        cells.insert("metrics.RMSE".to_string(), CellValue::number(rng.gen::<f64>()));
    }
    if rng.gen_bool(0.8) {
        cells.insert(
            "tags.owner".to_string(),
            CellValue::text(*OWNERS.choose(rng).unwrap_or(&"ada")),
        );
    }
    cells
}

impl RunTableSource for SyntheticRunSource {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        self.inner.list_experiments()
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        self.inner.fetch_run_table(experiment_name)
    }

    fn describe(&self) -> String {
        format!("synthetic ({} runs, seed {})", self.runs, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_all_runs() {
        let source = SyntheticRunSource::generate(100, 7).unwrap();
        let total: usize = source
            .list_experiments()
            .unwrap()
            .iter()
            .map(|e| source.fetch_run_table(e.name()).unwrap().len())
            .sum();
        assert_eq!(total, 100);
        assert_eq!(source.runs(), 100);
    }

    #[test]
    fn test_same_seed_same_tables() {
        let a = SyntheticRunSource::generate(20, 42).unwrap();
        let b = SyntheticRunSource::generate(20, 42).unwrap();
        for name in FAKE_EXPERIMENTS {
            assert_eq!(a.fetch_run_table(name).unwrap(), b.fetch_run_table(name).unwrap());
        }
    }

    #[test]
    fn test_tables_have_fixed_columns() {
        let source = SyntheticRunSource::generate(10, 1).unwrap();
        let table = source.fetch_run_table(FAKE_EXPERIMENTS[1]).unwrap();
        assert_eq!(table.columns(), SYNTHETIC_COLUMNS.map(String::from).as_slice());
    }

    #[test]
    fn test_rmse_is_sometimes_missing() {
        let source = SyntheticRunSource::generate(200, 3).unwrap();
        let table = source.fetch_run_table(FAKE_EXPERIMENTS[0]).unwrap();
        assert!(table
            .distinct_values("metrics.RMSE")
            .iter()
            .any(|v| v.is_missing()));
    }
}
