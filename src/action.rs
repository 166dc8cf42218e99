//! Action Router - commands, cursor resolution and cursor restoration
//!
//! Every command runs the same cycle:
//!
//! ```text
//! grid cursor --resolve--> (run_id, column, value)     (from the current view)
//!             --apply----> ViewState mutation
//!             --derive---> VisibleView --render--> adapter
//!             --restore--> same (run_id, column) if visible, else clamp
//! ```
//!
//! Raw coordinates are never trusted across a mutation; they are re-resolved
//! against the freshly derived view each time.

use std::fmt;

use crate::experiment::CellValue;
use crate::render::{CursorPlacement, GridCursor, LogicalCursor, RenderAdapter};
use crate::session::Session;
use crate::source::RunTableSource;
use crate::view::{ViewState, VisibleView};
use crate::Result;

/// Operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Toggle sort on the cursor column
    Sort,
    /// Hide the cursor column
    HideColumn,
    /// Hide the cursor row
    HideRow,
    /// Keep only rows equal to the cursor cell in its column
    FilterEqual,
    /// Drop rows equal to the cursor cell in its column
    FilterExclude,
    /// Clear all hides, filters and the sort
    Reset,
    /// Leave the session
    Quit,
}

impl Command {
    /// Every command, in footer order.
    pub const ALL: [Self; 7] = [
        Self::Sort,
        Self::Reset,
        Self::FilterEqual,
        Self::FilterExclude,
        Self::HideColumn,
        Self::HideRow,
        Self::Quit,
    ];

    /// Key bound to the command.
    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::Sort => 's',
            Self::HideColumn => 'c',
            Self::HideRow => 'r',
            Self::FilterEqual => 'f',
            Self::FilterExclude => 'd',
            Self::Reset => 'p',
            Self::Quit => 'q',
        }
    }

    /// Footer description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Sort => "Sort by column",
            Self::HideColumn => "Remove column",
            Self::HideRow => "Remove row",
            Self::FilterEqual => "Filter on value",
            Self::FilterExclude => "Deselect value",
            Self::Reset => "Clear selections",
            Self::Quit => "Quit",
        }
    }

    /// Command bound to a key.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Whether the command needs a cell under the cursor.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::Reset | Self::Quit)
    }

    /// Apply the command to a view. Returns whether the state changed.
    fn apply(self, view: &mut ViewState, target: Option<&Target>) -> bool {
        match (self, target) {
            (Self::Sort, Some(t)) => view.toggle_sort(&t.cursor.column),
            (Self::HideColumn, Some(t)) => view.hide_column(&t.cursor.column),
            (Self::HideRow, Some(t)) => view.hide_row(&t.cursor.run_id),
            (Self::FilterEqual, Some(t)) => view.set_equality_filter(&t.cursor.column, t.value.clone()),
            (Self::FilterExclude, Some(t)) => {
                view.add_exclusion_filter(&t.cursor.column, t.value.clone())
            }
            (Self::Reset, _) => {
                let changed = !view.is_pristine();
                view.reset();
                changed
            }
            (Self::Quit, _)
            | (
                Self::Sort
                | Self::HideColumn
                | Self::HideRow
                | Self::FilterEqual
                | Self::FilterExclude,
                None,
            ) => false,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key(), self.description())
    }
}

/// Result of dispatching a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and the grid was redrawn
    Applied {
        /// Whether the view state changed
        changed: bool,
        /// Where the cursor was put back
        placement: CursorPlacement,
    },
    /// Nothing addressable (no selection, empty view, stale cursor)
    Ignored,
    /// The operator asked to leave
    Quit,
}

#[derive(Debug, Clone)]
struct Target {
    cursor: LogicalCursor,
    value: CellValue,
}

/// Resolve a grid coordinate against a derived view.
#[must_use]
pub fn resolve_cursor(view: &VisibleView<'_>, grid: GridCursor) -> Option<LogicalCursor> {
    resolve(view, grid).map(|t| t.cursor)
}

fn resolve(view: &VisibleView<'_>, grid: GridCursor) -> Option<Target> {
    let row = view.rows.get(grid.row)?;
    let column = view.columns.get(grid.column)?;
    let value = row.cells.get(grid.column)?;
    Some(Target {
        cursor: LogicalCursor {
            run_id: row.run_id.to_string(),
            column: (*column).to_string(),
        },
        value: (*value).clone(),
    })
}

/// Put the cursor back on its logical cell, or as close as the view allows.
///
/// Falls back per axis: the same run's row if still visible, else the
/// previous row index clamped to the last row; likewise for columns.
#[must_use]
pub fn restore_cursor(
    view: &VisibleView<'_>,
    previous: GridCursor,
    logical: Option<&LogicalCursor>,
) -> CursorPlacement {
    if view.is_empty() {
        return CursorPlacement {
            grid: GridCursor::default(),
            logical: None,
        };
    }

    let row = logical
        .and_then(|l| view.row_position(&l.run_id))
        .unwrap_or_else(|| previous.row.min(view.rows.len() - 1));
    let column = logical
        .and_then(|l| view.column_position(&l.column))
        .unwrap_or_else(|| previous.column.min(view.columns.len() - 1));

    let grid = GridCursor::new(row, column);
    CursorPlacement {
        grid,
        logical: resolve_cursor(view, grid),
    }
}

/// Routes commands from the grid into the session's current view.
pub struct ActionRouter;

impl ActionRouter {
    /// Run `command` against the cell under `cursor`.
    ///
    /// Commands other than `Reset` and `Quit` are ignored when no experiment
    /// is selected or `cursor` does not address a visible cell.
    pub fn dispatch<S, R>(
        session: &mut Session<S>,
        command: Command,
        cursor: GridCursor,
        renderer: &mut R,
    ) -> Outcome
    where
        S: RunTableSource,
        R: RenderAdapter + ?Sized,
    {
        if command == Command::Quit {
            return Outcome::Quit;
        }

        let view = match session.current_view_mut() {
            Ok(view) => view,
            Err(e) => {
                tracing::debug!(%command, error = %e, "ignored");
                return Outcome::Ignored;
            }
        };

        let target = resolve(&view.visible(), cursor);
        if command.needs_target() && target.is_none() {
            tracing::debug!(%command, row = cursor.row, column = cursor.column, "ignored: no cell under cursor");
            return Outcome::Ignored;
        }

        let changed = command.apply(view, target.as_ref());
        tracing::debug!(%command, changed, "command applied");

        let visible = view.visible();
        renderer.render_view(&visible);
        let placement = restore_cursor(&visible, cursor, target.as_ref().map(|t| &t.cursor));
        renderer.restore_cursor(&placement);

        Outcome::Applied { changed, placement }
    }

    /// Select an experiment, render its view, and put the cursor at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownExperiment`] or the source's fetch
    /// error; the renderer is not touched on error.
    pub fn select_experiment<S, R>(
        session: &mut Session<S>,
        experiment_id: &str,
        renderer: &mut R,
    ) -> Result<CursorPlacement>
    where
        S: RunTableSource,
        R: RenderAdapter + ?Sized,
    {
        let view = session.select(experiment_id)?;
        let visible = view.visible();
        renderer.render_view(&visible);
        let placement = restore_cursor(&visible, GridCursor::default(), None);
        renderer.restore_cursor(&placement);
        Ok(placement)
    }
}
