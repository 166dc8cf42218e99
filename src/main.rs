//! `traktor`: browse ML experiment runs in the terminal.

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use traktor_ml::config::{Cli, Config};
use traktor_ml::render::FrameRecorder;
use traktor_ml::source::RunTableSource;
use traktor_ml::{ActionRouter, Error, Session};

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_cli(Cli::parse())?;
    init_logging(&config)?;

    let source = config.source.open().context("failed to open run table source")?;
    let session = Session::connect(source)
        .with_context(|| format!("failed to list experiments from {}", describe(&config)))?;

    match &config.dump {
        Some(name) => dump(session, name),
        None => interactive(session),
    }
}

fn describe(config: &Config) -> String {
    serde_json::to_string(&config.source).unwrap_or_else(|_| format!("{:?}", config.source))
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    if config.dump.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = File::create(&config.log_file)
            .with_context(|| format!("failed to create log file {}", config.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn dump<S: RunTableSource>(mut session: Session<S>, name: &str) -> Result<()> {
    let id = session
        .experiments()
        .iter()
        .find(|e| e.name() == name)
        .map(|e| e.id().to_string())
        .ok_or_else(|| Error::UnknownExperiment(name.to_string()))?;

    let mut recorder = FrameRecorder::new();
    ActionRouter::select_experiment(&mut session, &id, &mut recorder)
        .with_context(|| format!("failed to load experiment {name}"))?;
    print!("{}", recorder.frame().to_text());
    Ok(())
}

#[cfg(feature = "tui")]
fn interactive<S: RunTableSource>(session: Session<S>) -> Result<()> {
    traktor_ml::tui::run(session).context("terminal session failed")
}

#[cfg(not(feature = "tui"))]
fn interactive<S: RunTableSource>(_session: Session<S>) -> Result<()> {
    anyhow::bail!("built without the `tui` feature; use --dump <experiment>")
}
