//! Terminal front end (`ratatui` + `crossterm`)
//!
//! [`run`] takes over the terminal, draws an experiment picker and the run
//! grid, and feeds key presses to the [`App`]. Commands go through
//! [`crate::action::ActionRouter`] with the grid as the render adapter.

mod app;
mod grid;

pub use app::{App, Mode};
pub use grid::GridRenderer;

use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::session::Session;
use crate::source::RunTableSource;
use crate::Result;

const TICK: Duration = Duration::from_millis(100);

/// Raw mode and alternate screen for as long as the guard lives.
///
/// Restores the terminal on drop, and from a panic hook so the panic
/// message lands on a usable screen.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the terminal cannot be set up; whatever
    /// was already changed is restored.
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        undo_on_err(execute!(stdout, EnterAlternateScreen, Hide), restore)?;
        let terminal = undo_on_err(Terminal::new(CrosstermBackend::new(stdout)), restore)?;

        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore();
            previous(info);
        }));

        // from here on Drop restores the terminal and the panic hook
        let mut guard = Self { terminal };
        guard.terminal.clear()?;
        Ok(guard)
    }

    /// The ratatui terminal.
    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        let _ = panic::take_hook();
    }
}

/// Run `undo` before handing back an error from a setup step.
fn undo_on_err<T>(result: io::Result<T>, undo: impl FnOnce()) -> Result<T> {
    result.map_err(|e| {
        undo();
        e.into()
    })
}

fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Run the interactive browser until the operator quits.
///
/// # Errors
///
/// Returns terminal I/O errors. Source errors are shown in the status line,
/// not returned.
pub fn run<S: RunTableSource>(session: Session<S>) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let mut app = App::new(session);
    tracing::info!(source = %app.session().source().describe(), "terminal session started");

    loop {
        guard.terminal().draw(|f| app.draw(f))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code, key.modifiers) {
                    break;
                }
            }
        }
    }

    tracing::info!("terminal session ended");
    Ok(())
}
