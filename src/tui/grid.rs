//! Grid adapter: holds the last frame and the cell cursor for drawing.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

use crate::render::{CursorPlacement, GridCursor, GridFrame, RenderAdapter};
use crate::view::VisibleView;

const COLUMN_GAP: u16 = 1;
const MAX_COLUMN_WIDTH: usize = 40;

/// Render adapter backing the terminal grid.
#[derive(Debug, Default)]
pub struct GridRenderer {
    frame: GridFrame,
    cursor: GridCursor,
    column_offset: usize,
}

impl GridRenderer {
    /// Create an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last frame pushed by the router.
    #[must_use]
    pub const fn frame(&self) -> &GridFrame {
        &self.frame
    }

    /// Current cell cursor.
    #[must_use]
    pub const fn cursor(&self) -> GridCursor {
        self.cursor
    }

    /// Move the cursor by a delta, clamped to the frame.
    pub fn move_by(&mut self, rows: isize, columns: isize) {
        let max_row = self.frame.rows.len().saturating_sub(1);
        let max_col = self.frame.columns.len().saturating_sub(1);
        self.cursor.row = self.cursor.row.saturating_add_signed(rows).min(max_row);
        self.cursor.column = self.cursor.column.saturating_add_signed(columns).min(max_col);
    }

    /// Jump to the first or last row.
    pub fn jump_row(&mut self, last: bool) {
        self.cursor.row = if last {
            self.frame.rows.len().saturating_sub(1)
        } else {
            0
        };
    }

    fn widths(&self) -> Vec<u16> {
        self.frame
            .column_widths()
            .into_iter()
            .map(|w| u16::try_from(w.clamp(3, MAX_COLUMN_WIDTH)).unwrap_or(u16::MAX))
            .collect()
    }

    /// Range of columns drawn in `width` cells, keeping the cursor column in it.
    pub fn column_window(&mut self, width: u16) -> std::ops::Range<usize> {
        let widths = self.widths();
        if widths.is_empty() {
            return 0..0;
        }

        self.column_offset = self.column_offset.min(self.cursor.column);
        loop {
            let end = fit_columns(&widths, self.column_offset, width);
            if self.cursor.column < end || self.column_offset >= self.cursor.column {
                return self.column_offset..end.max(self.column_offset + 1).min(widths.len());
            }
            self.column_offset += 1;
        }
    }

    /// Draw the grid into `area`.
    pub fn draw(&mut self, f: &mut Frame<'_>, area: Rect, title: &str) {
        let inner_width = area.width.saturating_sub(2);
        let window = self.column_window(inner_width);
        let widths = self.widths();

        let header = Row::new(
            window
                .clone()
                .map(|i| Cell::from(self.frame.header_label(i))),
        )
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

        let rows = self.frame.rows.iter().map(|r| {
            Row::new(
                window
                    .clone()
                    .map(|i| Cell::from(r.cells.get(i).cloned().unwrap_or_default())),
            )
        });

        let constraints: Vec<Constraint> = window
            .clone()
            .map(|i| Constraint::Length(widths[i]))
            .collect();

        let table = Table::new(rows, constraints)
            .header(header)
            .column_spacing(COLUMN_GAP)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Line::from(title.to_string())),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray))
            .cell_highlight_style(
                Style::default()
                    .bg(Color::Yellow)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = TableState::default()
            .with_selected((!self.frame.rows.is_empty()).then_some(self.cursor.row))
            .with_selected_column(
                window
                    .contains(&self.cursor.column)
                    .then(|| self.cursor.column - window.start),
            );
        f.render_stateful_widget(table, area, &mut state);
    }
}

fn fit_columns(widths: &[u16], start: usize, available: u16) -> usize {
    let mut used: u16 = 0;
    for (i, w) in widths.iter().enumerate().skip(start) {
        let needed = if i == start { *w } else { w + COLUMN_GAP };
        if used.saturating_add(needed) > available {
            return i;
        }
        used += needed;
    }
    widths.len()
}

impl RenderAdapter for GridRenderer {
    fn render_view(&mut self, view: &VisibleView<'_>) {
        self.frame = GridFrame::from_view(view);
    }

    fn restore_cursor(&mut self, placement: &CursorPlacement) {
        self.cursor = placement.grid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::GridRow;

    fn grid(columns: usize, width: usize) -> GridRenderer {
        let name = "x".repeat(width);
        GridRenderer {
            frame: GridFrame {
                columns: (0..columns).map(|_| name.clone()).collect(),
                rows: vec![GridRow {
                    run_id: "r1".to_string(),
                    cells: (0..columns).map(|_| name.clone()).collect(),
                }],
                sort: None,
            },
            ..GridRenderer::default()
        }
    }

    #[test]
    fn test_move_is_clamped() {
        let mut g = grid(3, 5);
        g.move_by(5, 5);
        assert_eq!(g.cursor(), GridCursor::new(0, 2));
        g.move_by(-9, -9);
        assert_eq!(g.cursor(), GridCursor::new(0, 0));
    }

    #[test]
    fn test_window_follows_cursor() {
        // 10 columns of width 9 plus a 1-cell gap: 3 fit in 29 cells
        let mut g = grid(10, 9);
        assert_eq!(g.column_window(29), 0..3);

        g.move_by(0, 5);
        let window = g.column_window(29);
        assert!(window.contains(&5));
        assert_eq!(window.len(), 3);

        g.move_by(0, -5);
        assert_eq!(g.column_window(29), 0..3);
    }

    #[test]
    fn test_window_on_empty_frame() {
        let mut g = GridRenderer::new();
        assert_eq!(g.column_window(80), 0..0);
    }

    #[test]
    fn test_narrow_area_still_shows_cursor_column() {
        let mut g = grid(4, 20);
        g.move_by(0, 2);
        assert_eq!(g.column_window(5), 2..3);
    }
}
