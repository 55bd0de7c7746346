//! # ht-tuner
//!
//! Black-box hyperparameter search by coordinate descent.
//!
//! Provides variable definitions (categorical enumeration and discretized
//! bisection over numeric ranges), a memoizing performance registry, and the
//! [`Tuner`] that sweeps each variable in turn while holding the others
//! fixed, evaluating every distinct assignment at most once.

mod categorical;
mod config;
mod interval;
mod names;
mod registry;
mod status;
mod tuner;
mod variable;

pub use categorical::CategoricalVariable;
pub use config::{TunerConfig, TuningId, TuningPlan, VariableKind, VariableSpec};
pub use interval::{IntervalDomain, IntervalStrategy, IntervalVariable};
pub use names::{NameGuard, NameRegistry};
pub use registry::{PerformanceRegistry, RegistryEntry};
pub use status::{TuningState, TuningStatus};
pub use tuner::{Evaluator, Tuner};
pub use variable::{schedule_order, Proposal, Variable, VariableOptions};

pub use ht_types::{
    Assignment, ObjectiveDirection, ParameterValue, Reduction, Scores, TunerError, TunerResult,
};
