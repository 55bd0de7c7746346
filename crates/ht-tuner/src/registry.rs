//! Memoization store for evaluated assignments.

use serde::Serialize;

use ht_types::{Assignment, Reduction, TunerError, TunerResult};

/// A recorded evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub assignment: Assignment,
    pub score: f64,
}

/// Append-only list of every assignment evaluated so far and its score.
///
/// Callers check [`PerformanceRegistry::contains`] before recording; the
/// registry itself does not de-duplicate.
#[derive(Debug, Clone, Default)]
pub struct PerformanceRegistry {
    entries: Vec<RegistryEntry>,
}

impl PerformanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, assignment: &Assignment) -> bool {
        self.entries.iter().any(|e| e.assignment == *assignment)
    }

    pub fn record(&mut self, assignment: Assignment, score: f64) {
        tracing::debug!("Recorded score {} for {}", score, assignment);
        self.entries.push(RegistryEntry { assignment, score });
    }

    /// Score of the first entry exactly matching `assignment`.
    pub fn lookup(&self, assignment: &Assignment) -> TunerResult<f64> {
        self.entries
            .iter()
            .find(|e| e.assignment == *assignment)
            .map(|e| e.score)
            .ok_or_else(|| TunerError::MissingScore {
                assignment: assignment.to_string(),
            })
    }

    /// Every entry that agrees with `sub` on each coordinate `sub` sets.
    ///
    /// The iterator borrows the registry; call again to restart.
    pub fn matching<'a>(
        &'a self,
        sub: &'a Assignment,
    ) -> impl Iterator<Item = (&'a Assignment, f64)> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.assignment.agrees_with(sub))
            .map(|e| (&e.assignment, e.score))
    }

    /// Best entry overall under `reduction`.
    pub fn best(&self, reduction: &Reduction) -> Option<&RegistryEntry> {
        let scores: Vec<f64> = self.entries.iter().map(|e| e.score).collect();
        reduction.select(&scores).map(|i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of every entry, in evaluation order.
    pub fn to_json(&self) -> TunerResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.entries)?)
    }
}
