//! Experiment - a named grouping of runs as listed by a source

use serde::{Deserialize, Serialize};

/// An experiment as listed by a run table source.
///
/// The `name` keys the view-state cache and is what sources fetch tables by;
/// the `id` is what the picker hands back on selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Experiment {
    name: String,
    id: String,
}

impl Experiment {
    /// Create a new experiment entry.
    ///
    /// # Arguments
    ///
    /// * `name` - Human-readable, unique experiment name
    /// * `id` - Source-assigned experiment identifier
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_new() {
        let experiment = Experiment::new("Big Pickle", "1");
        assert_eq!(experiment.name(), "Big Pickle");
        assert_eq!(experiment.id(), "1");
    }

    #[test]
    fn test_experiment_serialization() {
        let experiment = Experiment::new("Big Pickle", "1");
        let json = serde_json::to_string(&experiment).unwrap();
        let back: Experiment = serde_json::from_str(&json).unwrap();
        assert_eq!(experiment, back);
    }
}
