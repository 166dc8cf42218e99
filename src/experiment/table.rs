//! Run Table - the immutable table a source returns for one experiment

use std::collections::HashMap;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{CellValue, RunRecord};
use crate::{Error, Result};

/// Ordered columns and ordered runs for a single experiment.
///
/// ## Invariants
///
/// - column names are unique and keep insertion order
/// - `run_id`s are unique and rows keep source order
/// - every record carries exactly one value per column
///
/// Tables are never mutated after construction; views hold them behind an
/// `Arc` and derive projections on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTable {
    columns: Vec<String>,
    column_index: FxHashMap<String, usize>,
    records: Vec<RunRecord>,
    row_index: FxHashMap<String, usize>,
}

impl RunTable {
    /// Build a table from columns and aligned records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] on duplicate column names, duplicate
    /// run ids, or a record whose width differs from the column count.
    pub fn new(columns: Vec<String>, records: Vec<RunRecord>) -> Result<Self> {
        let mut column_index = FxHashMap::default();
        for (i, name) in columns.iter().enumerate() {
            if column_index.insert(name.clone(), i).is_some() {
                return Err(Error::InvalidTable(format!("duplicate column '{name}'")));
            }
        }

        let mut row_index = FxHashMap::default();
        for (i, record) in records.iter().enumerate() {
            if record.values().len() != columns.len() {
                return Err(Error::InvalidTable(format!(
                    "run '{}' has {} values for {} columns",
                    record.run_id(),
                    record.values().len(),
                    columns.len()
                )));
            }
            if row_index.insert(record.run_id().to_string(), i).is_some() {
                return Err(Error::InvalidTable(format!(
                    "duplicate run_id '{}'",
                    record.run_id()
                )));
            }
        }

        Ok(Self {
            columns,
            column_index,
            records,
            row_index,
        })
    }

    /// Build a table from sparse per-run maps.
    ///
    /// Any column a run has no entry for is filled with the missing sentinel,
    /// which is how sources satisfy the "every record has every column"
    /// invariant.
    ///
    /// # Errors
    ///
    /// Same as [`RunTable::new`].
    pub fn from_sparse<I>(columns: Vec<String>, runs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, HashMap<String, CellValue>)>,
    {
        let records = runs
            .into_iter()
            .map(|(run_id, mut cells)| {
                let values = columns
                    .iter()
                    .map(|c| cells.remove(c).unwrap_or(CellValue::Missing))
                    .collect();
                RunRecord::new(run_id, values)
            })
            .collect();
        Self::new(columns, records)
    }

    /// Table with no columns and no runs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            column_index: FxHashMap::default(),
            records: Vec::new(),
            row_index: FxHashMap::default(),
        }
    }

    /// Column names in table order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in table order.
    #[must_use]
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column, if the table has it.
    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    /// Whether the table declares this column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    /// Whether the table contains this run.
    #[must_use]
    pub fn has_run(&self, run_id: &str) -> bool {
        self.row_index.contains_key(run_id)
    }

    /// Record for a run id.
    #[must_use]
    pub fn record(&self, run_id: &str) -> Option<&RunRecord> {
        self.row_index.get(run_id).map(|&i| &self.records[i])
    }

    /// Cell lookup by run id and column name.
    #[must_use]
    pub fn value(&self, run_id: &str, column: &str) -> Option<&CellValue> {
        let col = self.column_position(column)?;
        self.record(run_id)?.value_at(col)
    }

    /// Distinct values of a column, in first-seen order.
    #[must_use]
    pub fn distinct_values(&self, column: &str) -> Vec<&CellValue> {
        let Some(col) = self.column_position(column) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        self.records
            .iter()
            .filter_map(|r| r.value_at(col))
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

impl Default for RunTable {
    fn default() -> Self {
        Self::empty()
    }
}
