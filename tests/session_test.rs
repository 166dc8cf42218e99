//! Session cache and experiment selection
//!
//! Sources here count fetches or fail on demand so the tests can observe
//! exactly when the session goes back to the source.

use std::cell::{Cell, RefCell};

use traktor_ml::experiment::{CellValue, Experiment, RunRecord, RunTable};
use traktor_ml::source::RunTableSource;
use traktor_ml::{Error, Result, Session};

fn table(prefix: &str) -> RunTable {
    RunTable::new(
        vec!["run_id".into(), "status".into()],
        vec![
            RunRecord::builder(format!("{prefix}1")).value(format!("{prefix}1")).value("FAILED").build(),
            RunRecord::builder(format!("{prefix}2")).value(format!("{prefix}2")).value("FINISHED").build(),
        ],
    )
    .unwrap()
}

/// Counts fetches and can be told to fail the next ones.
#[derive(Default)]
struct CountingSource {
    fetches: Cell<usize>,
    offline: Cell<bool>,
    listing: RefCell<Vec<Experiment>>,
}

impl CountingSource {
    fn new() -> Self {
        let source = Self::default();
        source.listing.replace(vec![Experiment::new("alpha", "1"), Experiment::new("beta", "2")]);
        source
    }
}

impl RunTableSource for CountingSource {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        if self.offline.get() {
            return Err(Error::SourceUnavailable("listing failed".to_string()));
        }
        Ok(self.listing.borrow().clone())
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        if self.offline.get() {
            return Err(Error::SourceUnavailable(format!("cannot fetch {experiment_name}")));
        }
        self.fetches.set(self.fetches.get() + 1);
        Ok(table(&experiment_name[..1]))
    }
}

#[test]
fn test_table_fetched_once_per_experiment() {
    let mut session = Session::connect(CountingSource::new()).unwrap();

    session.select("1").unwrap();
    session.select("2").unwrap();
    session.select("1").unwrap();
    session.select("1").unwrap();

    assert_eq!(session.source().fetches.get(), 2);
    assert_eq!(session.cached_count(), 2);
}

#[test]
fn test_switching_preserves_each_state() {
    let mut session = Session::connect(CountingSource::new()).unwrap();

    session
        .select("1")
        .unwrap()
        .set_equality_filter("status", CellValue::text("FAILED"));
    session.select("2").unwrap().hide_column("status");

    let alpha = session.select("1").unwrap();
    assert_eq!(alpha.visible().run_ids(), vec!["a1"]);
    assert_eq!(alpha.visible().columns, vec!["run_id", "status"]);

    let beta = session.select("2").unwrap();
    assert_eq!(beta.visible().columns, vec!["run_id"]);
    assert_eq!(beta.visible().run_ids(), vec!["b1", "b2"]);
}

#[test]
fn test_failed_fetch_keeps_selection_and_cache() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    session.select("1").unwrap().hide_row("a2");

    session.source().offline.set(true);
    let err = session.select("2").unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));

    assert_eq!(session.selected_experiment().map(Experiment::name), Some("alpha"));
    assert_eq!(session.cached_count(), 1);
    assert!(session.cached_view("beta").is_none());

    // cached experiments still work while the source is down
    let alpha = session.select("1").unwrap();
    assert_eq!(alpha.visible().run_ids(), vec!["a1"]);
}

#[test]
fn test_fetch_is_retried_on_next_selection_not_before() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    session.source().offline.set(true);
    assert!(session.select("1").is_err());
    assert_eq!(session.source().fetches.get(), 0);

    session.source().offline.set(false);
    session.select("1").unwrap();
    assert_eq!(session.source().fetches.get(), 1);
}

#[test]
fn test_refresh_keeps_cached_views() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    session.select("1").unwrap().toggle_sort("status");

    session
        .source()
        .listing
        .borrow_mut()
        .push(Experiment::new("gamma", "3"));
    assert_eq!(session.refresh_experiments().unwrap().len(), 3);

    assert!(session.cached_view("alpha").unwrap().sort_spec().is_some());
    assert_eq!(session.source().fetches.get(), 1);
}

#[test]
fn test_failed_refresh_keeps_listing() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    session.source().offline.set(true);

    assert!(session.refresh_experiments().is_err());
    assert_eq!(session.experiments().len(), 2);
}

#[test]
fn test_unknown_id_after_listing_change() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    assert!(matches!(session.select("3"), Err(Error::UnknownExperiment(ref id)) if id == "3"));
    assert!(session.selected_experiment().is_none());
}

#[test]
fn test_get_or_create_without_selecting() {
    let mut session = Session::connect(CountingSource::new()).unwrap();
    let beta = Experiment::new("beta", "2");

    assert_eq!(session.get_or_create(&beta).unwrap().table().len(), 2);
    assert!(session.selected_experiment().is_none());
    assert!(matches!(session.current_view(), Err(Error::NoExperimentSelected)));
    assert_eq!(session.cached_count(), 1);
}
