//! MLflow tracking server source (REST API 2.0)
//!
//! Lists experiments with `experiments/search`, resolves names with
//! `experiments/get-by-name`, and pages through `runs/search`. Runs are
//! flattened into one table the way MLflow's own run search does it:
//!
//! ```text
//! run_id | experiment_id | status | artifact_uri | start_time | end_time
//!        | metrics.<key>... | params.<key>... | tags.<key>...
//! ```
//!
//! Keys a run never logged are filled with the missing sentinel. Transport
//! errors and non-2xx responses surface as [`Error::SourceUnavailable`];
//! nothing is retried here.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::RunTableSource;
use crate::experiment::{CellValue, Experiment, RunTable};
use crate::{Error, Result};

/// Page size requested from the server.
pub const PAGE_SIZE: u32 = 1000;

/// Leading run-info columns, in display order.
pub const INFO_COLUMNS: [&str; 6] = [
    "run_id",
    "experiment_id",
    "status",
    "artifact_uri",
    "start_time",
    "end_time",
];

#[derive(Debug, Deserialize)]
struct SearchExperimentsResponse {
    #[serde(default)]
    experiments: Vec<MlflowExperiment>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: MlflowExperiment,
}

#[derive(Debug, Deserialize)]
struct MlflowExperiment {
    experiment_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchRunsResponse {
    #[serde(default)]
    runs: Vec<MlflowRun>,
    next_page_token: Option<String>,
}

/// A run as returned by `runs/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct MlflowRun {
    info: RunInfo,
    #[serde(default)]
    data: RunData,
}

#[derive(Debug, Clone, Deserialize)]
struct RunInfo {
    run_id: String,
    experiment_id: String,
    status: Option<String>,
    artifact_uri: Option<String>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RunData {
    #[serde(default)]
    metrics: Vec<KeyValue>,
    #[serde(default)]
    params: Vec<KeyValue>,
    #[serde(default)]
    tags: Vec<KeyValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct KeyValue {
    key: String,
    value: serde_json::Value,
}

/// Blocking MLflow REST client.
#[derive(Debug, Clone)]
pub struct MlflowRunSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl MlflowRunSource {
    /// Connect to the tracking server at `tracking_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URI is not http(s) or the HTTP client
    /// cannot be built.
    pub fn new(tracking_uri: &str, timeout: Duration) -> Result<Self> {
        if !(tracking_uri.starts_with("http://") || tracking_uri.starts_with("https://")) {
            return Err(Error::Config(format!(
                "tracking URI must be http(s), got '{tracking_uri}'"
            )));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: tracking_uri.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Tracking server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{path}", self.base_url)
    }

    fn send<T: DeserializeOwned>(&self, path: &str, req: reqwest::blocking::RequestBuilder) -> Result<T> {
        let res = req
            .send()
            .map_err(|e| Error::SourceUnavailable(format!("{path}: request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(Error::SourceUnavailable(format!(
                "{path}: server returned {status}: {}",
                body.trim()
            )));
        }

        res.json::<T>()
            .map_err(|e| Error::SourceUnavailable(format!("{path}: malformed response: {e}")))
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        self.send(path, self.client.post(self.endpoint(path)).json(body))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.send(path, self.client.get(self.endpoint(path)).query(query))
    }

    fn experiment_id(&self, experiment_name: &str) -> Result<String> {
        let res: GetExperimentResponse = self.get(
            "experiments/get-by-name",
            &[("experiment_name", experiment_name)],
        )?;
        Ok(res.experiment.experiment_id)
    }

    fn search_runs(&self, experiment_id: &str) -> Result<Vec<MlflowRun>> {
        let mut runs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut body = json!({
                "experiment_ids": [experiment_id],
                "max_results": PAGE_SIZE,
            });
            if let Some(token) = &page_token {
                body["page_token"] = json!(token);
            }

            let page: SearchRunsResponse = self.post("runs/search", &body)?;
            tracing::debug!(experiment_id, runs = page.runs.len(), "fetched runs page");
            runs.extend(page.runs);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(runs)
    }
}

impl RunTableSource for MlflowRunSource {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        let mut experiments = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut body = json!({ "max_results": PAGE_SIZE });
            if let Some(token) = &page_token {
                body["page_token"] = json!(token);
            }

            let page: SearchExperimentsResponse = self.post("experiments/search", &body)?;
            experiments.extend(
                page.experiments
                    .into_iter()
                    .map(|e| Experiment::new(e.name, e.experiment_id)),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::info!(count = experiments.len(), "listed MLflow experiments");
        Ok(experiments)
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        let id = self.experiment_id(experiment_name)?;
        let runs = self.search_runs(&id)?;
        tracing::info!(experiment = experiment_name, runs = runs.len(), "fetched MLflow runs");
        runs_to_table(runs)
    }

    fn describe(&self) -> String {
        format!("mlflow ({})", self.base_url)
    }
}

/// Flatten `runs/search` results into a run table.
///
/// # Errors
///
/// Returns [`Error::InvalidTable`] if run ids repeat.
pub fn runs_to_table(runs: Vec<MlflowRun>) -> Result<RunTable> {
    let mut metric_keys = BTreeSet::new();
    let mut param_keys = BTreeSet::new();
    let mut tag_keys = BTreeSet::new();
    for run in &runs {
        metric_keys.extend(run.data.metrics.iter().map(|kv| kv.key.clone()));
        param_keys.extend(run.data.params.iter().map(|kv| kv.key.clone()));
        tag_keys.extend(run.data.tags.iter().map(|kv| kv.key.clone()));
    }

    let columns: Vec<String> = INFO_COLUMNS
        .iter()
        .map(ToString::to_string)
        .chain(metric_keys.into_iter().map(|k| format!("metrics.{k}")))
        .chain(param_keys.into_iter().map(|k| format!("params.{k}")))
        .chain(tag_keys.into_iter().map(|k| format!("tags.{k}")))
        .collect();

    let sparse = runs.into_iter().map(|run| {
        let mut cells = HashMap::new();
        let info = run.info;
        cells.insert("run_id".to_string(), CellValue::text(info.run_id.clone()));
        cells.insert("experiment_id".to_string(), CellValue::text(info.experiment_id));
        cells.insert("status".to_string(), info.status.into());
        cells.insert("artifact_uri".to_string(), info.artifact_uri.into());
        cells.insert("start_time".to_string(), format_millis(info.start_time));
        cells.insert("end_time".to_string(), format_millis(info.end_time));

        for (prefix, entries) in [
            ("metrics", run.data.metrics),
            ("params", run.data.params),
            ("tags", run.data.tags),
        ] {
            for kv in entries {
                cells.insert(format!("{prefix}.{}", kv.key), json_cell(kv.value));
            }
        }
        (info.run_id, cells)
    });

    RunTable::from_sparse(columns, sparse)
}

fn format_millis(millis: Option<i64>) -> CellValue {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or(CellValue::Missing, |t| {
            CellValue::Text(t.to_rfc3339_opts(SecondsFormat::Millis, true))
        })
}

fn json_cell(value: serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Missing,
        serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Missing, CellValue::number),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("nan") => CellValue::Missing,
        serde_json::Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}
