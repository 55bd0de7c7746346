//! Exhaustive enumeration over a fixed set of values.

use ht_types::{config_error, ParameterValue, Reduction, Scores, TunerResult};

use crate::names::{NameGuard, NameRegistry};
use crate::variable::{Proposal, Variable, VariableOptions};

/// Tries every value in domain order; the best is picked afterwards by the
/// tuner's reduction.
#[derive(Debug)]
pub struct CategoricalVariable {
    guard: NameGuard,
    values: Vec<ParameterValue>,
    initial_value: Option<ParameterValue>,
    priority: i32,
}

impl CategoricalVariable {
    pub fn new(
        names: &NameRegistry,
        values: Vec<ParameterValue>,
        options: VariableOptions,
    ) -> TunerResult<Self> {
        if values.is_empty() {
            return Err(config_error!("categorical variable needs at least one value"));
        }
        let guard = names.register(options.name.as_deref())?;
        Ok(Self {
            guard,
            values,
            initial_value: options.initial_value,
            priority: options.priority,
        })
    }

    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }
}

impl Variable for CategoricalVariable {
    fn name(&self) -> &str {
        self.guard.name()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn cardinality(&self) -> usize {
        self.values.len()
    }

    fn initial_value(&self) -> ParameterValue {
        self.initial_value
            .clone()
            .unwrap_or_else(|| self.values[0].clone())
    }

    fn next(&self, scores: &Scores, _reduction: &Reduction) -> TunerResult<Proposal> {
        Ok(self
            .values
            .iter()
            .find(|value| !scores.contains(value))
            .map(|value| Proposal::Candidate(value.clone()))
            .unwrap_or(Proposal::Exhausted))
    }
}
