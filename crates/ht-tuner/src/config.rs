//! Tuner configuration and declarative variable definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ht_types::{config_error, ObjectiveDirection, ParameterValue, Reduction, TunerResult};

use crate::categorical::CategoricalVariable;
use crate::interval::{IntervalDomain, IntervalStrategy, IntervalVariable};
use crate::names::NameRegistry;
use crate::variable::{Variable, VariableOptions};

/// Unique tuning run identifier.
pub type TuningId = Uuid;

fn default_epochs() -> usize {
    1
}

fn default_required_neighbors() -> usize {
    1
}

fn default_strategy() -> String {
    IntervalStrategy::default().to_string()
}

/// Fixed configuration of a tuning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunerConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: TuningId,

    #[serde(default)]
    pub name: String,

    /// Number of coordinate-descent sweeps.
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Decides the optimization direction and every tie-break.
    #[serde(default)]
    pub reduction: Reduction,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl TunerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            epochs: default_epochs(),
            reduction: Reduction::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.reduction = direction.into();
        self
    }

    pub fn validate(&self) -> TunerResult<()> {
        if self.epochs == 0 {
            return Err(config_error!("epochs must be positive, got 0"));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> TunerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self::new("tuning")
    }
}

/// The search domain of a declaratively defined variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VariableKind {
    Categorical {
        values: Vec<ParameterValue>,
    },
    Interval {
        start: f64,
        stop: f64,
        step: f64,
        #[serde(default = "default_required_neighbors")]
        required_neighbors: usize,
        /// Parsed when the variable is built so that unknown names surface
        /// as configuration errors.
        #[serde(default = "default_strategy")]
        strategy: String,
    },
}

/// A variable described as data, e.g. loaded from a JSON plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(flatten)]
    pub options: VariableOptions,
    #[serde(flatten)]
    pub kind: VariableKind,
}

impl VariableSpec {
    pub fn categorical(values: Vec<ParameterValue>) -> Self {
        Self {
            options: VariableOptions::default(),
            kind: VariableKind::Categorical { values },
        }
    }

    pub fn interval(start: f64, stop: f64, step: f64) -> Self {
        Self {
            options: VariableOptions::default(),
            kind: VariableKind::Interval {
                start,
                stop,
                step,
                required_neighbors: default_required_neighbors(),
                strategy: default_strategy(),
            },
        }
    }

    pub fn with_options(mut self, options: VariableOptions) -> Self {
        self.options = options;
        self
    }

    /// Only meaningful for interval specs; ignored otherwise.
    pub fn with_required_neighbors(mut self, n: usize) -> Self {
        if let VariableKind::Interval {
            required_neighbors, ..
        } = &mut self.kind
        {
            *required_neighbors = n;
        }
        self
    }

    /// Only meaningful for interval specs; ignored otherwise.
    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        if let VariableKind::Interval { strategy, .. } = &mut self.kind {
            *strategy = name.into();
        }
        self
    }

    /// Construct the variable, claiming its name in `names`.
    pub fn build(&self, names: &NameRegistry) -> TunerResult<Box<dyn Variable>> {
        match &self.kind {
            VariableKind::Categorical { values } => Ok(Box::new(CategoricalVariable::new(
                names,
                values.clone(),
                self.options.clone(),
            )?)),
            VariableKind::Interval {
                start,
                stop,
                step,
                required_neighbors,
                strategy,
            } => {
                let strategy: IntervalStrategy = strategy.parse()?;
                let domain = IntervalDomain::new(*start, *stop, *step)?;
                let variable =
                    IntervalVariable::new(names, domain, *required_neighbors, self.options.clone())?
                        .with_strategy(strategy);
                Ok(Box::new(variable))
            }
        }
    }
}

/// A complete tuning setup: run configuration plus variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningPlan {
    #[serde(default)]
    pub config: TunerConfig,
    pub variables: Vec<VariableSpec>,
}

impl TuningPlan {
    pub fn from_json(json: &str) -> TunerResult<Self> {
        let plan: Self = serde_json::from_str(json)?;
        plan.config.validate()?;
        Ok(plan)
    }

    pub fn to_json(&self) -> TunerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ht_types::TunerError;

    const PLAN: &str = r#"{
        "config": {"name": "mlp", "epochs": 2, "reduction": "maximize"},
        "variables": [
            {"kind": "categorical", "name": "activation", "values": ["relu", "tanh"]},
            {"kind": "interval", "name": "lr", "start": 0.0, "stop": 1.0, "step": 0.1,
             "required_neighbors": 2, "priority": 3, "initial_value": 0.5}
        ]
    }"#;

    #[test]
    fn config_defaults() {
        let config = TunerConfig::default();
        assert_eq!(config.epochs, 1);
        assert_eq!(config.reduction.name(), "minimize");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_epochs_rejected() {
        let err = TunerConfig::new("bad").with_epochs(0).validate().unwrap_err();
        assert!(err.is_config());

        let err = TunerConfig::from_json(r#"{"epochs": 0}"#).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn config_builder_chain() {
        let config = TunerConfig::new("sweep")
            .with_epochs(3)
            .with_direction(ObjectiveDirection::Maximize);
        assert_eq!(config.name, "sweep");
        assert_eq!(config.epochs, 3);
        assert_eq!(config.reduction.name(), "maximize");
    }

    #[test]
    fn plan_from_json_builds_variables() {
        let plan = TuningPlan::from_json(PLAN).unwrap();
        assert_eq!(plan.config.name, "mlp");
        assert_eq!(plan.config.epochs, 2);
        assert_eq!(plan.variables.len(), 2);

        let names = NameRegistry::new();
        let activation = plan.variables[0].build(&names).unwrap();
        assert_eq!(activation.name(), "activation");
        assert_eq!(activation.cardinality(), 2);
        assert_eq!(activation.initial_value(), ParameterValue::from("relu"));

        let lr = plan.variables[1].build(&names).unwrap();
        assert_eq!(lr.priority(), 3);
        assert_eq!(lr.initial_value(), ParameterValue::Float(0.5));
        assert_eq!(lr.cardinality(), 4 + 4);
    }

    #[test]
    fn plan_round_trips_through_json() {
        let plan = TuningPlan::from_json(PLAN).unwrap();
        let json = plan.to_json().unwrap();
        let back = TuningPlan::from_json(&json).unwrap();
        assert_eq!(back.variables, plan.variables);
        assert_eq!(back.config.id, plan.config.id);
    }

    #[test]
    fn unknown_strategy_fails_at_build() {
        let spec = VariableSpec::interval(0.0, 1.0, 0.1)
            .with_options(VariableOptions::named("momentum"))
            .with_strategy("annealing");

        let names = NameRegistry::new();
        let err = spec.build(&names).unwrap_err();
        assert!(matches!(err, TunerError::UnknownStrategy { .. }));
        assert!(!names.contains("momentum"));
    }

    #[test]
    fn interval_defaults_from_json() {
        let spec: VariableSpec =
            serde_json::from_str(r#"{"kind": "interval", "start": -1, "stop": 1, "step": 0.5}"#)
                .unwrap();
        match &spec.kind {
            VariableKind::Interval {
                required_neighbors,
                strategy,
                ..
            } => {
                assert_eq!(*required_neighbors, 1);
                assert_eq!(strategy, "bisection");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(spec.options.priority, 0);
        assert!(spec.options.name.is_none());
    }

    #[test]
    fn custom_reduction_is_not_serializable() {
        fn median_like(scores: &[f64]) -> f64 {
            scores[scores.len() / 2]
        }
        let config = TunerConfig::default().with_reduction(Reduction::Custom(median_like));
        assert!(serde_json::to_string(&config).is_err());
    }
}
