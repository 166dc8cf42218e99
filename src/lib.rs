//! # traktor-ml: Terminal Browser for ML Experiment Runs
//!
//! **Version**: 0.1.0
//!
//! traktor-ml shows the runs of one experiment (parameters, metrics and tags)
//! as a grid and lets the operator narrow and reorder it without touching the
//! underlying data: hide columns or runs, keep or drop a value, toggle a
//! sort, reset.
//!
//! ## Design Principles
//!
//! - **Derived, never mutated**: the fetched [`experiment::RunTable`] is
//!   immutable; every grid is recomputed from it plus a [`view::ViewState`]
//! - **One state per experiment**: the [`session::Session`] caches a view per
//!   experiment name, so switching back restores the operator's filters
//! - **Closed command set**: [`action::Command`] is an enum; the router
//!   matches it exhaustively
//! - **Logical cursor**: the cursor follows the (run, column) it was on across
//!   re-sorts and hides
//!
//! ## Example Usage
//!
//! ```rust
//! use traktor_ml::action::{ActionRouter, Command};
//! use traktor_ml::render::{FrameRecorder, GridCursor};
//! use traktor_ml::session::Session;
//! use traktor_ml::source::SyntheticRunSource;
//!
//! let source = SyntheticRunSource::generate(200, 7)?;
//! let mut session = Session::connect(source)?;
//! let id = session.experiments()[0].id().to_string();
//!
//! let mut grid = FrameRecorder::new();
//! ActionRouter::select_experiment(&mut session, &id, &mut grid)?;
//!
//! // sort on the MAE column (fourth column)
//! ActionRouter::dispatch(&mut session, Command::Sort, GridCursor::new(0, 3), &mut grid);
//! assert_eq!(grid.frame().header_label(3), "metrics.MAE ▲");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod action;
pub mod config;
pub mod error;
pub mod experiment;
pub mod render;
pub mod session;
pub mod source;
#[cfg(feature = "tui")]
pub mod tui;
pub mod view;

pub use action::{ActionRouter, Command, Outcome};
pub use error::{Error, Result};
pub use session::Session;
pub use view::{ViewState, VisibleView};
