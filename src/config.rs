//! Configuration: command line, environment, and `.env`
//!
//! `traktor` reads its settings from flags, falling back to environment
//! variables (a `.env` file in the working directory is loaded first). The
//! parsed [`Cli`] is validated into a [`Config`], which opens the source.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::source::{ParquetRunSource, RunTableSource, SyntheticRunSource};
use crate::{Error, Result};

/// Tracking server used when neither flag nor environment name one.
pub const DEFAULT_TRACKING_URI: &str = "http://127.0.0.1:5000";

/// Default filter directive for the log file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Which kind of run table source to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// MLflow tracking server over REST
    Mlflow,
    /// Directory of `<experiment>.parquet` files
    Parquet,
    /// Generated fake runs
    Synthetic,
}

/// Command line of the `traktor` binary.
#[derive(Debug, Parser)]
#[command(name = "traktor", author, version, about = "Browse ML experiment runs in the terminal")]
pub struct Cli {
    /// Where run tables come from
    #[arg(long, value_enum, env = "TRAKTOR_SOURCE", default_value = "mlflow")]
    pub source: SourceKind,

    /// MLflow tracking server URL
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = DEFAULT_TRACKING_URI)]
    pub tracking_uri: String,

    /// HTTP timeout for MLflow requests, in seconds
    #[arg(long, env = "TRAKTOR_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Directory of Parquet run tables (for `--source parquet`)
    #[arg(long, env = "TRAKTOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of fake runs (for `--source synthetic`)
    #[arg(long, default_value_t = 100)]
    pub runs: usize,

    /// RNG seed for fake runs
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Log file (the terminal belongs to the grid while it runs)
    #[arg(long, env = "TRAKTOR_LOG_FILE", default_value = "traktor.log")]
    pub log_file: PathBuf,

    /// Log filter directive; `RUST_LOG` takes precedence
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Print one experiment's table to stdout instead of opening the grid
    #[arg(long, value_name = "EXPERIMENT")]
    pub dump: Option<String>,
}

/// Validated source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// MLflow tracking server
    Mlflow {
        /// Base URL of the tracking server
        tracking_uri: String,
        /// Request timeout in seconds
        timeout_secs: u64,
    },
    /// Parquet directory
    Parquet {
        /// Directory holding `<experiment>.parquet` files
        dir: PathBuf,
    },
    /// Generated runs
    Synthetic {
        /// Number of runs
        runs: usize,
        /// RNG seed
        seed: u64,
    },
}

/// Validated application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Source to open
    pub source: SourceConfig,
    /// Log file path
    pub log_file: PathBuf,
    /// Log filter directive
    pub log_level: String,
    /// Experiment to dump instead of running the grid
    pub dump: Option<String>,
}

impl Config {
    /// Validate parsed command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the chosen source is missing a required
    /// setting.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let source = match cli.source {
            SourceKind::Mlflow => {
                if cli.timeout_secs == 0 {
                    return Err(Error::Config("--timeout-secs must be positive".to_string()));
                }
                SourceConfig::Mlflow {
                    tracking_uri: cli.tracking_uri,
                    timeout_secs: cli.timeout_secs,
                }
            }
            SourceKind::Parquet => SourceConfig::Parquet {
                dir: cli.data_dir.ok_or_else(|| {
                    Error::Config("--data-dir (or TRAKTOR_DATA_DIR) is required for parquet".to_string())
                })?,
            },
            SourceKind::Synthetic => SourceConfig::Synthetic {
                runs: cli.runs,
                seed: cli.seed,
            },
        };

        Ok(Self {
            source,
            log_file: cli.log_file,
            log_level: cli.log_level,
            dump: cli.dump,
        })
    }
}

impl SourceConfig {
    /// Open the configured source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the source cannot be constructed (for
    /// example MLflow support was compiled out).
    pub fn open(&self) -> Result<Box<dyn RunTableSource>> {
        match self {
            Self::Mlflow {
                tracking_uri,
                timeout_secs,
            } => open_mlflow(tracking_uri, Duration::from_secs(*timeout_secs)),
            Self::Parquet { dir } => Ok(Box::new(ParquetRunSource::new(dir.clone()))),
            Self::Synthetic { runs, seed } => Ok(Box::new(SyntheticRunSource::generate(*runs, *seed)?)),
        }
    }
}

#[cfg(feature = "mlflow")]
fn open_mlflow(tracking_uri: &str, timeout: Duration) -> Result<Box<dyn RunTableSource>> {
    Ok(Box::new(crate::source::MlflowRunSource::new(tracking_uri, timeout)?))
}

#[cfg(not(feature = "mlflow"))]
fn open_mlflow(_tracking_uri: &str, _timeout: Duration) -> Result<Box<dyn RunTableSource>> {
    Err(Error::Config(
        "built without the `mlflow` feature; use --source parquet or synthetic".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("traktor").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_synthetic_config() {
        let config = Config::from_cli(parse(&["--source", "synthetic", "--runs", "5", "--seed", "9"])).unwrap();
        assert_eq!(config.source, SourceConfig::Synthetic { runs: 5, seed: 9 });
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_parquet_requires_dir() {
        let mut cli = parse(&["--source", "parquet"]);
        // TRAKTOR_DATA_DIR may be set in the environment
        cli.data_dir = None;
        assert!(matches!(Config::from_cli(cli), Err(Error::Config(_))));
    }

    #[test]
    fn test_parquet_with_dir() {
        let config = Config::from_cli(parse(&["--source", "parquet", "--data-dir", "/tmp/runs"])).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Parquet {
                dir: PathBuf::from("/tmp/runs")
            }
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = parse(&["--source", "mlflow", "--timeout-secs", "0"]);
        assert!(matches!(Config::from_cli(cli), Err(Error::Config(_))));
    }

    #[test]
    fn test_open_synthetic() {
        let source = SourceConfig::Synthetic { runs: 3, seed: 1 }.open().unwrap();
        assert_eq!(source.list_experiments().unwrap().len(), 2);
        assert!(source.describe().starts_with("synthetic"));
    }

    #[test]
    fn test_dump_flag() {
        let config = Config::from_cli(parse(&["--source", "synthetic", "--dump", "Big Pickle"])).unwrap();
        assert_eq!(config.dump.as_deref(), Some("Big Pickle"));
    }

    #[test]
    fn test_source_config_serde() {
        let json = serde_json::to_string(&SourceConfig::Synthetic { runs: 1, seed: 2 }).unwrap();
        assert_eq!(json, r#"{"kind":"synthetic","runs":1,"seed":2}"#);
    }
}
