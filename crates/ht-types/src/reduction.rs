//! Optimization direction and score reduction.

use serde::{Deserialize, Serialize};

/// Whether we are maximizing or minimizing the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

impl Default for ObjectiveDirection {
    fn default() -> Self {
        Self::Minimize
    }
}

/// How a collection of scores is reduced to the one that counts as best.
///
/// The reduced value is matched back against the observed scores by exact
/// equality, so a custom reduction must return one of its inputs for a best
/// value to be selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Minimize,
    Maximize,
    /// Caller-supplied reduction. Only constructible from code.
    #[serde(skip)]
    Custom(fn(&[f64]) -> f64),
}

impl Default for Reduction {
    fn default() -> Self {
        Self::Minimize
    }
}

impl From<ObjectiveDirection> for Reduction {
    fn from(direction: ObjectiveDirection) -> Self {
        match direction {
            ObjectiveDirection::Minimize => Self::Minimize,
            ObjectiveDirection::Maximize => Self::Maximize,
        }
    }
}

impl Reduction {
    /// Reduce `scores` to a single value. `None` for an empty slice.
    pub fn reduce(&self, scores: &[f64]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        let reduced = match self {
            Self::Minimize => scores.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Maximize => scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Custom(f) => f(scores),
        };
        Some(reduced)
    }

    /// Index of the first score equal to the reduced value.
    pub fn select(&self, scores: &[f64]) -> Option<usize> {
        let target = self.reduce(scores)?;
        scores.iter().position(|s| *s == target)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Minimize => "minimize",
            Self::Maximize => "maximize",
            Self::Custom(_) => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closest_to_one(scores: &[f64]) -> f64 {
        scores
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - 1.0)
                    .abs()
                    .partial_cmp(&(b - 1.0).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(f64::NAN)
    }

    #[test]
    fn select_picks_first_of_equal_scores() {
        let scores = [3.0, 1.0, 2.0, 1.0];
        assert_eq!(Reduction::Minimize.select(&scores), Some(1));
        assert_eq!(Reduction::Maximize.select(&scores), Some(0));
    }

    #[test]
    fn empty_scores_reduce_to_none() {
        assert_eq!(Reduction::Minimize.reduce(&[]), None);
        assert_eq!(Reduction::Maximize.select(&[]), None);
    }

    #[test]
    fn custom_reduction() {
        let reduction = Reduction::Custom(closest_to_one);
        assert_eq!(reduction.select(&[5.0, 0.8, 1.3]), Some(1));
        assert_eq!(reduction.name(), "custom");
    }

    #[test]
    fn custom_reduction_without_matching_score() {
        fn mean(scores: &[f64]) -> f64 {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
        assert_eq!(Reduction::Custom(mean).select(&[1.0, 2.0]), None);
    }

    #[test]
    fn direction_converts_and_deserializes() {
        let direction: ObjectiveDirection = serde_json::from_str("\"maximize\"").unwrap();
        assert_eq!(direction, ObjectiveDirection::Maximize);
        assert_eq!(Reduction::from(direction).name(), "maximize");

        let reduction: Reduction = serde_json::from_str("\"minimize\"").unwrap();
        assert_eq!(reduction.name(), "minimize");
    }
}
