//! The search-dimension abstraction shared by all variable kinds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use ht_types::{ParameterValue, Reduction, Scores, TunerResult};

/// Outcome of asking a variable for its next value.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// Evaluate this value next.
    Candidate(ParameterValue),
    /// The search for this coordinate is finished.
    Exhausted,
}

impl Proposal {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// One named, independently searched dimension of the parameter space.
pub trait Variable: fmt::Debug + Send {
    fn name(&self) -> &str;

    /// Higher priorities are optimized earlier within an epoch.
    fn priority(&self) -> i32;

    /// Expected number of `next` calls before the search converges.
    fn cardinality(&self) -> usize;

    /// Value used before the first epoch.
    fn initial_value(&self) -> ParameterValue;

    /// Propose the next value given the scores seen for this variable with
    /// all other coordinates held fixed.
    fn next(&self, scores: &Scores, reduction: &Reduction) -> TunerResult<Proposal>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String {
        format!(
            "{} (priority {}, cardinality {})",
            self.name(),
            self.priority(),
            self.cardinality()
        )
    }
}

/// Epoch scheduling order: higher priority first, then smaller cardinality.
pub fn schedule_order(a: &dyn Variable, b: &dyn Variable) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| a.cardinality().cmp(&b.cardinality()))
}

/// Options shared by every variable kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableOptions {
    /// Generated when omitted.
    pub name: Option<String>,
    /// Defaults to the first element of the domain.
    pub initial_value: Option<ParameterValue>,
    #[serde(default)]
    pub priority: i32,
}

impl VariableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_initial_value(mut self, value: impl Into<ParameterValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        priority: i32,
        cardinality: usize,
    }

    impl Variable for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn cardinality(&self) -> usize {
            self.cardinality
        }

        fn initial_value(&self) -> ParameterValue {
            ParameterValue::Int(0)
        }

        fn next(&self, _scores: &Scores, _reduction: &Reduction) -> TunerResult<Proposal> {
            Ok(Proposal::Exhausted)
        }
    }

    #[test]
    fn higher_priority_sorts_first() {
        let mut vars: Vec<Box<dyn Variable>> = vec![
            Box::new(Fixed {
                name: "low",
                priority: 0,
                cardinality: 1,
            }),
            Box::new(Fixed {
                name: "high",
                priority: 5,
                cardinality: 100,
            }),
        ];
        vars.sort_by(|a, b| schedule_order(a.as_ref(), b.as_ref()));
        assert_eq!(vars[0].name(), "high");
    }

    #[test]
    fn smaller_cardinality_breaks_priority_ties() {
        let mut vars: Vec<Box<dyn Variable>> = vec![
            Box::new(Fixed {
                name: "wide",
                priority: 1,
                cardinality: 12,
            }),
            Box::new(Fixed {
                name: "narrow",
                priority: 1,
                cardinality: 2,
            }),
            Box::new(Fixed {
                name: "also_wide",
                priority: 1,
                cardinality: 12,
            }),
        ];
        vars.sort_by(|a, b| schedule_order(a.as_ref(), b.as_ref()));
        let order: Vec<&str> = vars.iter().map(|v| v.name()).collect();
        assert_eq!(order, vec!["narrow", "wide", "also_wide"]);
    }

    #[test]
    fn options_builder() {
        let options = VariableOptions::named("momentum")
            .with_initial_value(0.9)
            .with_priority(2);
        assert_eq!(options.name.as_deref(), Some("momentum"));
        assert_eq!(options.initial_value, Some(ParameterValue::Float(0.9)));
        assert_eq!(options.priority, 2);
        assert!(Proposal::Exhausted.is_exhausted());
    }
}
