//! Lifecycle and counters of a tuning run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ht_types::{Assignment, Reduction};

use crate::config::TuningId;

/// Lifecycle state for a tuning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuningState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningStatus {
    pub id: TuningId,
    pub state: TuningState,
    pub epochs_completed: usize,
    /// Calls made to the external evaluator.
    pub evaluations: usize,
    /// Evaluation requests answered from the registry.
    pub cache_hits: usize,
    pub best_score: Option<f64>,
    pub best_assignment: Option<Assignment>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TuningStatus {
    pub fn new(id: TuningId) -> Self {
        Self {
            id,
            state: TuningState::Pending,
            epochs_completed: 0,
            evaluations: 0,
            cache_hits: 0,
            best_score: None,
            best_assignment: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = TuningState::Running;
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        self.error = None;
    }

    pub fn mark_completed(&mut self) {
        self.state = TuningState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = TuningState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Count a fresh evaluation and keep it if `reduction` prefers it.
    pub fn record_evaluation(&mut self, assignment: &Assignment, score: f64, reduction: &Reduction) {
        self.evaluations += 1;
        let improves = match self.best_score {
            None => true,
            // Ties keep the earlier assignment.
            Some(best) => reduction.select(&[best, score]) == Some(1),
        };
        if improves {
            self.best_score = Some(score);
            self.best_assignment = Some(assignment.clone());
        }
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    /// Wall-clock duration of the run, once finished.
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn tuning_status_lifecycle() {
        let mut status = TuningStatus::new(Uuid::new_v4());

        assert_eq!(status.state, TuningState::Pending);
        assert!(status.started_at.is_none());
        assert!(status.duration_seconds().is_none());

        status.mark_running();
        assert_eq!(status.state, TuningState::Running);
        assert!(status.started_at.is_some());

        status.mark_completed();
        assert_eq!(status.state, TuningState::Completed);
        assert!(status.finished_at.is_some());
        assert!(status.duration_seconds().unwrap() >= 0.0);
    }

    #[test]
    fn failure_records_error() {
        let mut status = TuningStatus::new(Uuid::new_v4());
        status.mark_running();
        status.mark_failed("evaluator diverged".into());
        assert_eq!(status.state, TuningState::Failed);
        assert_eq!(status.error.as_deref(), Some("evaluator diverged"));
    }

    #[test]
    fn best_tracking_minimize() {
        let mut status = TuningStatus::new(Uuid::new_v4());
        let a = Assignment::new().with("x", 0.1);
        let b = Assignment::new().with("x", 0.2);
        let c = Assignment::new().with("x", 0.3);

        status.record_evaluation(&a, 0.15, &Reduction::Minimize);
        status.record_evaluation(&b, 0.05, &Reduction::Minimize);
        status.record_evaluation(&c, 0.05, &Reduction::Minimize);

        assert_eq!(status.evaluations, 3);
        assert_eq!(status.best_score, Some(0.05));
        assert_eq!(status.best_assignment.as_ref(), Some(&b));
    }

    #[test]
    fn best_tracking_maximize() {
        let mut status = TuningStatus::new(Uuid::new_v4());
        let a = Assignment::new().with("x", 0.1);
        let b = Assignment::new().with("x", 0.2);

        status.record_evaluation(&a, 1.5, &Reduction::Maximize);
        status.record_evaluation(&b, 1.0, &Reduction::Maximize);
        status.record_cache_hit();

        assert_eq!(status.best_score, Some(1.5));
        assert_eq!(status.best_assignment.as_ref(), Some(&a));
        assert_eq!(status.cache_hits, 1);
    }
}
