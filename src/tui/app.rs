//! Application state and key handling, independent of the terminal.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::grid::GridRenderer;
use crate::action::{ActionRouter, Command, Outcome};
use crate::session::Session;
use crate::source::RunTableSource;

/// Which pane has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Experiment picker popup
    Picker,
    /// Run grid
    Grid,
}

/// Terminal application.
pub struct App<S> {
    session: Session<S>,
    grid: GridRenderer,
    mode: Mode,
    picker: ListState,
    status: Option<String>,
}

impl<S: RunTableSource> App<S> {
    /// Start with the picker open on the first experiment.
    pub fn new(session: Session<S>) -> Self {
        let picker = ListState::default().with_selected((!session.experiments().is_empty()).then_some(0));
        Self {
            session,
            grid: GridRenderer::new(),
            mode: Mode::Picker,
            picker,
            status: None,
        }
    }

    /// Focused pane.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Last status message.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The grid adapter.
    #[must_use]
    pub const fn grid(&self) -> &GridRenderer {
        &self.grid
    }

    /// The session.
    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return true;
        }
        match self.mode {
            Mode::Picker => self.handle_picker_key(code),
            Mode::Grid => self.handle_grid_key(code),
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) -> bool {
        let count = self.session.experiments().len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.picker.selected().unwrap_or(0);
                self.picker.select((count > 0).then(|| i.saturating_sub(1)));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.picker.selected().map_or(0, |i| i + 1);
                self.picker.select((count > 0).then(|| i.min(count - 1)));
            }
            KeyCode::Enter => self.select_highlighted(),
            KeyCode::Char('u') => self.refresh(),
            KeyCode::Esc if self.session.selected_experiment().is_some() => {
                self.mode = Mode::Grid;
            }
            KeyCode::Char('q') => return true,
            _ => {}
        }
        false
    }

    fn handle_grid_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.grid.move_by(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => self.grid.move_by(1, 0),
            KeyCode::Left | KeyCode::Char('h') => self.grid.move_by(0, -1),
            KeyCode::Right | KeyCode::Char('l') => self.grid.move_by(0, 1),
            KeyCode::Home | KeyCode::Char('g') => self.grid.jump_row(false),
            KeyCode::End | KeyCode::Char('G') => self.grid.jump_row(true),
            KeyCode::Char('e') => {
                self.mode = Mode::Picker;
            }
            KeyCode::Char(key) => {
                if let Some(command) = Command::from_key(key) {
                    let cursor = self.grid.cursor();
                    match ActionRouter::dispatch(&mut self.session, command, cursor, &mut self.grid) {
                        Outcome::Quit => return true,
                        Outcome::Ignored => {
                            self.status = Some(format!("{}: nothing under the cursor", command.description()));
                        }
                        Outcome::Applied { changed: false, .. } => {
                            self.status = Some(format!("{}: no change", command.description()));
                        }
                        Outcome::Applied { changed: true, .. } => self.status = None,
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn select_highlighted(&mut self) {
        let Some(experiment) = self
            .picker
            .selected()
            .and_then(|i| self.session.experiments().get(i))
            .cloned()
        else {
            return;
        };

        match ActionRouter::select_experiment(&mut self.session, experiment.id(), &mut self.grid) {
            Ok(_) => {
                self.mode = Mode::Grid;
                self.status = None;
            }
            Err(e) => {
                tracing::warn!(experiment = experiment.name(), error = %e, "experiment selection failed");
                self.status = Some(e.to_string());
            }
        }
    }

    fn refresh(&mut self) {
        match self.session.refresh_experiments() {
            Ok(list) => {
                let count = list.len();
                let i = self.picker.selected().unwrap_or(0);
                self.picker.select((count > 0).then(|| i.min(count - 1)));
                self.status = Some(format!("{count} experiments"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "experiment refresh failed");
                self.status = Some(e.to_string());
            }
        }
    }

    fn summary(&self) -> String {
        let Some(experiment) = self.session.selected_experiment() else {
            return "no experiment selected".to_string();
        };
        let Ok(view) = self.session.current_view() else {
            return experiment.name().to_string();
        };
        let mut parts = vec![
            experiment.name().to_string(),
            format!("{}/{} runs", self.grid.frame().rows.len(), view.table().len()),
        ];
        if view.filter_count() > 0 {
            parts.push(format!("{} filters", view.filter_count()));
        }
        if let Some(sort) = view.sort_spec() {
            parts.push(format!(
                "sorted by {} {}",
                sort.column(),
                if sort.descending() { "desc" } else { "asc" }
            ));
        }
        parts.join(" | ")
    }

    /// Draw the whole screen.
    pub fn draw(&mut self, f: &mut Frame<'_>) {
        let [body, status, footer] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(f.area());

        let title = self
            .session
            .selected_experiment()
            .map_or_else(|| "traktor".to_string(), |e| format!("traktor: {}", e.name()));
        self.grid.draw(f, body, &title);

        let status_line = match &self.status {
            Some(msg) => Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red))),
            None => Line::from(self.summary()),
        };
        f.render_widget(Paragraph::new(status_line), status);
        f.render_widget(Paragraph::new(self.footer()), footer);

        if self.mode == Mode::Picker {
            let area = popup_area(f.area());
            self.draw_picker(f, area);
        }
    }

    fn footer(&self) -> Line<'static> {
        let key_style = Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow);
        let mut spans = Vec::new();
        let bindings: Vec<(String, &str)> = match self.mode {
            Mode::Grid => Command::ALL
                .iter()
                .map(|c| (c.key().to_string(), c.description()))
                .chain(std::iter::once(("e".to_string(), "Experiments")))
                .collect(),
            Mode::Picker => vec![
                ("↑↓".to_string(), "Move"),
                ("Enter".to_string(), "Open"),
                ("u".to_string(), "Refresh"),
                ("Esc".to_string(), "Close"),
                ("q".to_string(), "Quit"),
            ],
        };
        for (key, description) in bindings {
            spans.push(Span::styled(key, key_style));
            spans.push(Span::raw(format!(" {description}  ")));
        }
        Line::from(spans)
    }

    fn draw_picker(&mut self, f: &mut Frame<'_>, area: Rect) {
        let items: Vec<ListItem<'_>> = self
            .session
            .experiments()
            .iter()
            .map(|e| ListItem::new(format!("{} ({})", e.name(), e.id())))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Experiments"))
            .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut self.picker);
    }
}

fn popup_area(area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage(20),
        Constraint::Percentage(60),
        Constraint::Percentage(20),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage(20),
        Constraint::Percentage(60),
        Constraint::Percentage(20),
    ])
    .areas(middle);
    center
}
