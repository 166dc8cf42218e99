//! Render adapters - where derived views go to be drawn
//!
//! The router pushes every derived [`VisibleView`] through a
//! [`RenderAdapter`] and then asks it to place the cursor. Adapters own an
//! owned [`GridFrame`] snapshot so drawing can happen later (the TUI draws on
//! its own loop tick).

use std::fmt::Write as _;

use crate::view::VisibleView;

/// Transient grid coordinate (row index, column index) in the rendered grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GridCursor {
    /// Row index
    pub row: usize,
    /// Column index
    pub column: usize,
}

impl GridCursor {
    /// Build a cursor.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// The cell the operator is focused on, independent of where it is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalCursor {
    /// Run id of the focused row
    pub run_id: String,
    /// Focused column name
    pub column: String,
}

/// Where the cursor ends up after a redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPlacement {
    /// Coordinate to highlight
    pub grid: GridCursor,
    /// Logical cell under `grid`, if the view has one
    pub logical: Option<LogicalCursor>,
}

/// Sink for derived views.
pub trait RenderAdapter {
    /// Replace the grid contents with `view`.
    fn render_view(&mut self, view: &VisibleView<'_>);

    /// Best-effort cursor placement after a render.
    fn restore_cursor(&mut self, placement: &CursorPlacement);
}

impl<T: RenderAdapter + ?Sized> RenderAdapter for &mut T {
    fn render_view(&mut self, view: &VisibleView<'_>) {
        (**self).render_view(view);
    }

    fn restore_cursor(&mut self, placement: &CursorPlacement) {
        (**self).restore_cursor(placement);
    }
}

/// One row of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    /// Run id
    pub run_id: String,
    /// Display strings, one per column
    pub cells: Vec<String>,
}

/// Owned, display-ready snapshot of a visible view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridFrame {
    /// Column headers
    pub columns: Vec<String>,
    /// Rows in display order
    pub rows: Vec<GridRow>,
    /// Active sort column and whether it is descending
    pub sort: Option<(String, bool)>,
}

impl GridFrame {
    /// Snapshot a visible view.
    #[must_use]
    pub fn from_view(view: &VisibleView<'_>) -> Self {
        Self {
            columns: view.columns.iter().map(ToString::to_string).collect(),
            rows: view
                .rows
                .iter()
                .map(|r| GridRow {
                    run_id: r.run_id.to_string(),
                    cells: r.cells.iter().map(ToString::to_string).collect(),
                })
                .collect(),
            sort: view
                .sort
                .map(|s| (s.column().to_string(), s.descending())),
        }
    }

    /// Header label with a sort marker on the sort column.
    #[must_use]
    pub fn header_label(&self, index: usize) -> String {
        let Some(name) = self.columns.get(index) else {
            return String::new();
        };
        match &self.sort {
            Some((col, descending)) if col == name => {
                format!("{name} {}", if *descending { "▼" } else { "▲" })
            }
            _ => name.clone(),
        }
    }

    /// Display width of each column (header or widest cell).
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        (0..self.columns.len())
            .map(|i| {
                self.rows
                    .iter()
                    .filter_map(|r| r.cells.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(self.header_label(i).chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Plain-text table rendering.
    #[must_use]
    pub fn to_text(&self) -> String {
        let widths = self.column_widths();
        let mut out = String::new();

        let header: Vec<String> = (0..self.columns.len())
            .map(|i| format!("{:<w$}", self.header_label(i), w = widths[i]))
            .collect();
        let _ = writeln!(out, "{}", header.join("  ").trim_end());

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", rule.join("  "));

        for row in &self.rows {
            let line: Vec<String> = row
                .cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        }
        out
    }
}

/// Headless adapter that keeps the last frame and cursor.
///
/// Used by `traktor --dump` and by tests that assert what would be drawn.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frame: GridFrame,
    cursor: Option<CursorPlacement>,
    renders: usize,
}

impl FrameRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered frame.
    #[must_use]
    pub const fn frame(&self) -> &GridFrame {
        &self.frame
    }

    /// Last cursor placement.
    #[must_use]
    pub const fn cursor(&self) -> Option<&CursorPlacement> {
        self.cursor.as_ref()
    }

    /// Number of renders received.
    #[must_use]
    pub const fn render_count(&self) -> usize {
        self.renders
    }
}

impl RenderAdapter for FrameRecorder {
    fn render_view(&mut self, view: &VisibleView<'_>) {
        self.frame = GridFrame::from_view(view);
        self.renders += 1;
    }

    fn restore_cursor(&mut self, placement: &CursorPlacement) {
        self.cursor = Some(placement.clone());
    }
}
