//! Run Record - one recorded execution of an experiment

use serde::{Deserialize, Serialize};

use super::CellValue;

/// Run Record represents a single row of a run table.
///
/// Values are stored positionally and line up with the owning table's
/// column order; use [`super::RunTable::value`] for lookups by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    values: Vec<CellValue>,
}

impl RunRecord {
    /// Create a new run record.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Unique identifier for the run within its table
    /// * `values` - One value per table column, in column order
    #[must_use]
    pub fn new(run_id: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            run_id: run_id.into(),
            values,
        }
    }

    /// Create a builder that appends values one column at a time.
    #[must_use]
    pub fn builder(run_id: impl Into<String>) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get all values in column order.
    #[must_use]
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Get the value at a column position.
    #[must_use]
    pub fn value_at(&self, column_index: usize) -> Option<&CellValue> {
        self.values.get(column_index)
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    run_id: String,
    values: Vec<CellValue>,
}

impl RunRecordBuilder {
    /// Create a new builder with the run ID.
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            values: Vec::new(),
        }
    }

    /// Append the next column's value.
    #[must_use]
    pub fn value(mut self, value: impl Into<CellValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        RunRecord {
            run_id: self.run_id,
            values: self.values,
        }
    }
}
