//! Session - experiment selection and the per-experiment view cache
//!
//! The session is the only owner of view state. It keeps the last experiment
//! listing, the current selection, and one [`ViewState`] per experiment name,
//! created on first selection and kept for the life of the process.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::experiment::Experiment;
use crate::source::RunTableSource;
use crate::view::ViewState;
use crate::{Error, Result};

/// Explicitly owned application state.
///
/// ## Design
///
/// Tables are fetched at most once per experiment name. Switching the
/// selection never drops another experiment's cached view, so filters and
/// sorts survive switching back and forth. A failed fetch leaves both the
/// selection and the cache untouched.
#[derive(Debug)]
pub struct Session<S> {
    source: S,
    experiments: Vec<Experiment>,
    selected: Option<Experiment>,
    views: FxHashMap<String, ViewState>,
}

impl<S: RunTableSource> Session<S> {
    /// Create a session with an empty experiment listing.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            experiments: Vec::new(),
            selected: None,
            views: FxHashMap::default(),
        }
    }

    /// Create a session and load the experiment listing.
    ///
    /// # Errors
    ///
    /// Propagates the source's listing error.
    pub fn connect(source: S) -> Result<Self> {
        let mut session = Self::new(source);
        session.refresh_experiments()?;
        Ok(session)
    }

    /// Reload the experiment listing. Cached views are kept.
    ///
    /// # Errors
    ///
    /// Propagates the source's listing error; the previous listing is kept.
    pub fn refresh_experiments(&mut self) -> Result<&[Experiment]> {
        let experiments = self.source.list_experiments()?;
        tracing::info!(
            source = %self.source.describe(),
            count = experiments.len(),
            "experiment listing refreshed"
        );
        self.experiments = experiments;
        Ok(&self.experiments)
    }

    /// Last experiment listing.
    #[must_use]
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Currently selected experiment.
    #[must_use]
    pub const fn selected_experiment(&self) -> Option<&Experiment> {
        self.selected.as_ref()
    }

    /// The run table source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Select an experiment by id and return its view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownExperiment`] if `experiment_id` is not in the
    /// last listing, or the source's fetch error. On error the previous
    /// selection stays in place.
    pub fn select(&mut self, experiment_id: &str) -> Result<&mut ViewState> {
        let experiment = self
            .experiments
            .iter()
            .find(|e| e.id() == experiment_id)
            .cloned()
            .ok_or_else(|| Error::UnknownExperiment(experiment_id.to_string()))?;

        let view = Self::cached_or_fetch(&mut self.views, &self.source, experiment.name())?;
        tracing::debug!(experiment = experiment.name(), "experiment selected");
        self.selected = Some(experiment);
        Ok(view)
    }

    /// View for an experiment, fetching its table on first access.
    ///
    /// # Errors
    ///
    /// Propagates the source's fetch error; nothing is cached on failure.
    pub fn get_or_create(&mut self, experiment: &Experiment) -> Result<&mut ViewState> {
        Self::cached_or_fetch(&mut self.views, &self.source, experiment.name())
    }

    fn cached_or_fetch<'a>(
        views: &'a mut FxHashMap<String, ViewState>,
        source: &S,
        name: &str,
    ) -> Result<&'a mut ViewState> {
        match views.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!(experiment = name, "view cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let table = source.fetch_run_table(name)?;
                tracing::info!(
                    experiment = name,
                    runs = table.len(),
                    columns = table.columns().len(),
                    "run table cached"
                );
                Ok(entry.insert(ViewState::new(table)))
            }
        }
    }

    /// View of the selected experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoExperimentSelected`] before the first successful
    /// selection.
    pub fn current_view(&self) -> Result<&ViewState> {
        self.selected
            .as_ref()
            .and_then(|e| self.views.get(e.name()))
            .ok_or(Error::NoExperimentSelected)
    }

    /// Mutable view of the selected experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoExperimentSelected`] before the first successful
    /// selection.
    pub fn current_view_mut(&mut self) -> Result<&mut ViewState> {
        let name = self.selected.as_ref().ok_or(Error::NoExperimentSelected)?.name();
        self.views.get_mut(name).ok_or(Error::NoExperimentSelected)
    }

    /// Cached view for an experiment name, without fetching.
    #[must_use]
    pub fn cached_view(&self, experiment_name: &str) -> Option<&ViewState> {
        self.views.get(experiment_name)
    }

    /// Number of cached views.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.views.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{RunRecord, RunTable};
    use crate::source::MemoryRunSource;

    fn source() -> MemoryRunSource {
        let table = RunTable::new(
            vec!["run_id".into()],
            vec![RunRecord::builder("r1").value("r1").build()],
        )
        .unwrap();
        MemoryRunSource::new()
            .with_experiment(Experiment::new("a", "0"), table.clone())
            .with_experiment(Experiment::new("b", "1"), table)
    }

    #[test]
    fn test_session_default() {
        let session = Session::new(source());
        assert!(session.experiments().is_empty());
        assert!(session.selected_experiment().is_none());
        assert!(matches!(session.current_view(), Err(Error::NoExperimentSelected)));
        assert_eq!(session.cached_count(), 0);
    }

    #[test]
    fn test_select_caches_lazily() {
        let mut session = Session::connect(source()).unwrap();
        assert_eq!(session.experiments().len(), 2);
        assert_eq!(session.cached_count(), 0);

        session.select("1").unwrap();
        assert_eq!(session.selected_experiment().map(Experiment::name), Some("b"));
        assert_eq!(session.cached_count(), 1);
        assert!(session.cached_view("a").is_none());
    }

    #[test]
    fn test_select_unknown_id() {
        let mut session = Session::connect(source()).unwrap();
        session.select("0").unwrap();

        let err = session.select("42").unwrap_err();
        assert!(matches!(err, Error::UnknownExperiment(ref id) if id == "42"));
        assert_eq!(session.selected_experiment().map(Experiment::id), Some("0"));
    }

    #[test]
    fn test_select_before_listing_is_unknown() {
        let mut session = Session::new(source());
        assert!(matches!(session.select("0"), Err(Error::UnknownExperiment(_))));
        assert!(matches!(session.current_view_mut(), Err(Error::NoExperimentSelected)));
    }
}
