//! View State - per-experiment projection, filters, and sort
//!
//! A [`ViewState`] never mutates its [`RunTable`]. Every call to
//! [`ViewState::visible`] derives the projection from scratch:
//!
//! ```text
//! table rows
//!   -> drop deselected run ids
//!   -> keep rows matching every equality filter
//!   -> drop rows matching any excluded value
//!   -> project onto visible columns
//!   -> stable sort by the active sort column
//! ```
//!
//! Filters and sort that name a column hidden after they were set stay in the
//! state but are skipped during derivation.
//!
//! ## Example
//!
//! ```rust
//! use traktor_ml::experiment::{CellValue, RunRecord, RunTable};
//! use traktor_ml::view::ViewState;
//!
//! let table = RunTable::new(
//!     vec!["run_id".into(), "status".into()],
//!     vec![
//!         RunRecord::builder("r1").value("r1").value("FAILED").build(),
//!         RunRecord::builder("r2").value("r2").value("FINISHED").build(),
//!     ],
//! )?;
//!
//! let mut view = ViewState::new(table);
//! view.add_exclusion_filter("status", CellValue::text("FAILED"));
//! view.hide_column("status");
//!
//! let visible = view.visible();
//! assert_eq!(visible.columns, vec!["run_id"]);
//! assert_eq!(visible.run_ids(), vec!["r1", "r2"]);
//! # Ok::<(), traktor_ml::Error>(())
//! ```

mod sort;

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::experiment::{CellValue, RunRecord, RunTable};

pub use sort::{compare_cells, SortOrder, SortSpec};

/// Mutable view over one experiment's cached run table.
#[derive(Debug, Clone)]
pub struct ViewState {
    table: Arc<RunTable>,
    deselected_columns: FxHashSet<String>,
    deselected_row_ids: FxHashSet<String>,
    equality_filters: FxHashMap<String, CellValue>,
    exclusion_filters: FxHashMap<String, FxHashSet<CellValue>>,
    sort: Option<SortSpec>,
}

/// One visible row: the run id and its cells projected onto visible columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow<'a> {
    /// Run id of the underlying record
    pub run_id: &'a str,
    /// Cells in visible-column order
    pub cells: Vec<&'a CellValue>,
}

/// Derived, read-only projection of a table through a view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleView<'a> {
    /// Visible column names, in table order
    pub columns: Vec<&'a str>,
    /// Visible rows, in sort order (table order when unsorted)
    pub rows: Vec<VisibleRow<'a>>,
    /// Sort that shaped `rows`, if it applied
    pub sort: Option<&'a SortSpec>,
}

impl<'a> VisibleView<'a> {
    /// Whether there is no cell to address.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Run ids in display order.
    #[must_use]
    pub fn run_ids(&self) -> Vec<&'a str> {
        self.rows.iter().map(|r| r.run_id).collect()
    }

    /// Display position of a run id.
    #[must_use]
    pub fn row_position(&self, run_id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.run_id == run_id)
    }

    /// Display position of a column.
    #[must_use]
    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Cell at a display coordinate.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&'a CellValue> {
        self.rows.get(row)?.cells.get(column).copied()
    }
}

impl ViewState {
    /// Empty view state (everything visible, no filters, no sort).
    #[must_use]
    pub fn new(table: impl Into<Arc<RunTable>>) -> Self {
        Self {
            table: table.into(),
            deselected_columns: FxHashSet::default(),
            deselected_row_ids: FxHashSet::default(),
            equality_filters: FxHashMap::default(),
            exclusion_filters: FxHashMap::default(),
            sort: None,
        }
    }

    /// The cached table this view projects.
    #[must_use]
    pub fn table(&self) -> &RunTable {
        &self.table
    }

    /// Whether a column is known and not hidden.
    #[must_use]
    pub fn is_column_visible(&self, column: &str) -> bool {
        self.table.has_column(column) && !self.deselected_columns.contains(column)
    }

    /// Hide a column. No-op for unknown or already hidden columns.
    ///
    /// Returns whether the state changed.
    pub fn hide_column(&mut self, column: &str) -> bool {
        self.is_column_visible(column) && self.deselected_columns.insert(column.to_string())
    }

    /// Hide a run. No-op for unknown or already hidden run ids.
    ///
    /// Returns whether the state changed.
    pub fn hide_row(&mut self, run_id: &str) -> bool {
        self.table.has_run(run_id) && self.deselected_row_ids.insert(run_id.to_string())
    }

    /// Keep only rows whose `column` equals `value`. Last write wins.
    ///
    /// No-op for unknown or hidden columns. Returns whether the state changed.
    pub fn set_equality_filter(&mut self, column: &str, value: CellValue) -> bool {
        if !self.is_column_visible(column) {
            return false;
        }
        self.equality_filters.insert(column.to_string(), value.clone()) != Some(value)
    }

    /// Drop rows whose `column` equals `value`. Duplicates are absorbed.
    ///
    /// No-op for unknown or hidden columns. Returns whether the state changed.
    pub fn add_exclusion_filter(&mut self, column: &str, value: CellValue) -> bool {
        if !self.is_column_visible(column) {
            return false;
        }
        self.exclusion_filters
            .entry(column.to_string())
            .or_default()
            .insert(value)
    }

    /// Sort ascending on a new column, or flip the direction on the active one.
    ///
    /// No-op for unknown or hidden columns. Returns whether the state changed.
    pub fn toggle_sort(&mut self, column: &str) -> bool {
        if !self.is_column_visible(column) {
            return false;
        }
        match &mut self.sort {
            Some(spec) if spec.column() == column => spec.flip(),
            _ => self.sort = Some(SortSpec::ascending(column)),
        }
        true
    }

    /// Clear every deselection, filter and the sort. The table is kept.
    pub fn reset(&mut self) {
        self.deselected_columns.clear();
        self.deselected_row_ids.clear();
        self.equality_filters.clear();
        self.exclusion_filters.clear();
        self.sort = None;
    }

    /// Whether the state is equivalent to a fresh one.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.deselected_columns.is_empty()
            && self.deselected_row_ids.is_empty()
            && self.equality_filters.is_empty()
            && self.exclusion_filters.is_empty()
            && self.sort.is_none()
    }

    /// Active sort, if any.
    #[must_use]
    pub const fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Hidden column names.
    #[must_use]
    pub const fn deselected_columns(&self) -> &FxHashSet<String> {
        &self.deselected_columns
    }

    /// Hidden run ids.
    #[must_use]
    pub const fn deselected_row_ids(&self) -> &FxHashSet<String> {
        &self.deselected_row_ids
    }

    /// Equality filter value for a column.
    #[must_use]
    pub fn equality_filter(&self, column: &str) -> Option<&CellValue> {
        self.equality_filters.get(column)
    }

    /// Excluded values for a column.
    #[must_use]
    pub fn exclusion_filter(&self, column: &str) -> Option<&FxHashSet<CellValue>> {
        self.exclusion_filters.get(column)
    }

    /// Number of active filters (equality entries plus excluded values).
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.equality_filters.len() + self.exclusion_filters.values().map(FxHashSet::len).sum::<usize>()
    }

    /// Visible column names in table order.
    #[must_use]
    pub fn visible_columns(&self) -> Vec<&str> {
        self.table
            .columns()
            .iter()
            .filter(|c| !self.deselected_columns.contains(c.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Visible rows, filtered, projected and sorted.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        self.visible().rows
    }

    /// Full derivation of the visible view.
    #[must_use]
    pub fn visible(&self) -> VisibleView<'_> {
        let table = self.table.as_ref();
        let columns = self.visible_columns();
        let projection: Vec<usize> = columns
            .iter()
            .filter_map(|c| table.column_position(c))
            .collect();

        let equality: Vec<(usize, &CellValue)> = self
            .equality_filters
            .iter()
            .filter(|(c, _)| self.is_column_visible(c))
            .filter_map(|(c, v)| Some((table.column_position(c)?, v)))
            .collect();
        let exclusion: Vec<(usize, &FxHashSet<CellValue>)> = self
            .exclusion_filters
            .iter()
            .filter(|(c, _)| self.is_column_visible(c))
            .filter_map(|(c, vs)| Some((table.column_position(c)?, vs)))
            .collect();

        let mut records: Vec<&RunRecord> = table
            .records()
            .iter()
            .filter(|r| !self.deselected_row_ids.contains(r.run_id()))
            .filter(|r| {
                equality
                    .iter()
                    .all(|(col, want)| r.value_at(*col) == Some(*want))
            })
            .filter(|r| {
                exclusion
                    .iter()
                    .all(|(col, banned)| r.value_at(*col).map_or(true, |v| !banned.contains(v)))
            })
            .collect();

        let sort = self
            .sort
            .as_ref()
            .filter(|spec| self.is_column_visible(spec.column()));
        if let Some(spec) = sort {
            if let Some(col) = table.column_position(spec.column()) {
                records.sort_by(|a, b| match (a.value_at(col), b.value_at(col)) {
                    (Some(x), Some(y)) => compare_cells(x, y, spec.order()),
                    _ => std::cmp::Ordering::Equal,
                });
            }
        }

        let rows = records
            .into_iter()
            .map(|r| VisibleRow {
                run_id: r.run_id(),
                cells: projection.iter().filter_map(|&i| r.value_at(i)).collect(),
            })
            .collect();

        VisibleView {
            columns,
            rows,
            sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_table() -> RunTable {
        RunTable::new(
            vec!["run_id".into(), "M".into(), "status".into()],
            vec![
                RunRecord::builder("r1").value("r1").value(0.2).value("FINISHED").build(),
                RunRecord::builder("r2").value("r2").value(0.9).value("FAILED").build(),
                RunRecord::builder("r3").value("r3").value(None::<f64>).value("FAILED").build(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_view_shows_everything() {
        let view = ViewState::new(metrics_table());
        let visible = view.visible();
        assert!(view.is_pristine());
        assert_eq!(visible.columns, vec!["run_id", "M", "status"]);
        assert_eq!(visible.run_ids(), vec!["r1", "r2", "r3"]);
        assert!(visible.sort.is_none());
    }

    #[test]
    fn test_hide_column_is_idempotent() {
        let mut view = ViewState::new(metrics_table());
        assert!(view.hide_column("M"));
        assert!(!view.hide_column("M"));
        assert!(!view.hide_column("nope"));
        assert_eq!(view.visible_columns(), vec!["run_id", "status"]);
        assert_eq!(view.visible_rows()[0].cells.len(), 2);
    }

    #[test]
    fn test_hide_row() {
        let mut view = ViewState::new(metrics_table());
        assert!(view.hide_row("r2"));
        assert!(!view.hide_row("r2"));
        assert!(!view.hide_row("r9"));
        assert_eq!(view.visible().run_ids(), vec!["r1", "r3"]);
    }

    #[test]
    fn test_equality_filter_last_write_wins() {
        let mut view = ViewState::new(metrics_table());
        assert!(view.set_equality_filter("status", CellValue::text("FAILED")));
        assert!(!view.set_equality_filter("status", CellValue::text("FAILED")));
        assert_eq!(view.visible().run_ids(), vec!["r2", "r3"]);

        assert!(view.set_equality_filter("status", CellValue::text("FINISHED")));
        assert_eq!(view.visible().run_ids(), vec!["r1"]);
    }

    #[test]
    fn test_exclusion_filter_set_semantics() {
        let mut view = ViewState::new(metrics_table());
        assert!(view.add_exclusion_filter("M", CellValue::Missing));
        assert!(!view.add_exclusion_filter("M", CellValue::Missing));
        assert_eq!(view.exclusion_filter("M").map(FxHashSet::len), Some(1));
        assert_eq!(view.visible().run_ids(), vec!["r1", "r2"]);
    }

    #[test]
    fn test_sort_then_exclude_missing() {
        let mut view = ViewState::new(metrics_table());
        view.toggle_sort("M");
        view.add_exclusion_filter("M", CellValue::Missing);
        assert_eq!(view.visible().run_ids(), vec!["r1", "r2"]);

        view.toggle_sort("M");
        assert_eq!(view.visible().run_ids(), vec!["r2", "r1"]);
    }

    #[test]
    fn test_missing_sorts_last_descending() {
        let mut view = ViewState::new(metrics_table());
        view.toggle_sort("M");
        view.toggle_sort("M");
        assert_eq!(view.visible().run_ids(), vec!["r2", "r1", "r3"]);
    }

    #[test]
    fn test_contradictory_filters_empty_view() {
        let mut view = ViewState::new(metrics_table());
        view.set_equality_filter("status", CellValue::text("FAILED"));
        view.add_exclusion_filter("status", CellValue::text("FAILED"));
        assert!(view.visible().rows.is_empty());
    }

    #[test]
    fn test_fresh_actions_on_hidden_column_are_noops() {
        let mut view = ViewState::new(metrics_table());
        view.hide_column("status");
        assert!(!view.toggle_sort("status"));
        assert!(!view.set_equality_filter("status", CellValue::text("FAILED")));
        assert!(!view.add_exclusion_filter("status", CellValue::text("FAILED")));
        assert!(view.sort_spec().is_none());
    }

    #[test]
    fn test_stale_references_have_no_visible_effect() {
        let mut view = ViewState::new(metrics_table());
        view.set_equality_filter("status", CellValue::text("FAILED"));
        view.toggle_sort("status");
        view.hide_column("status");

        let visible = view.visible();
        assert_eq!(visible.run_ids(), vec!["r1", "r2", "r3"]);
        assert!(visible.sort.is_none());
        assert!(view.sort_spec().is_some());
    }

    #[test]
    fn test_reset_restores_original() {
        let mut view = ViewState::new(metrics_table());
        view.hide_column("M");
        view.hide_row("r1");
        view.toggle_sort("status");
        view.add_exclusion_filter("status", CellValue::text("FAILED"));
        view.reset();

        assert!(view.is_pristine());
        assert_eq!(view.visible(), ViewState::new(metrics_table()).visible());
    }

    #[test]
    fn test_filter_count() {
        let mut view = ViewState::new(metrics_table());
        view.set_equality_filter("status", CellValue::text("FAILED"));
        view.add_exclusion_filter("M", CellValue::Missing);
        view.add_exclusion_filter("M", CellValue::Number(0.9));
        assert_eq!(view.filter_count(), 3);
    }
}
