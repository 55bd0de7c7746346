//! Coordinate-descent orchestration.
//!
//! Each epoch optimizes every variable in turn while the others stay fixed.
//! Scores already in the registry for the same fixed coordinates seed each
//! variable's search, so no assignment is evaluated twice.

use tracing::{debug, info};

use ht_types::{config_error, unreachable_state, Assignment, Scores, TunerError, TunerResult};

use crate::config::{TunerConfig, TuningPlan, VariableSpec};
use crate::names::NameRegistry;
use crate::registry::PerformanceRegistry;
use crate::status::TuningStatus;
use crate::variable::{schedule_order, Proposal, Variable};

/// The expensive, caller-supplied scoring function.
pub trait Evaluator {
    fn evaluate(&mut self, assignment: &Assignment) -> f64;
}

impl<F> Evaluator for F
where
    F: FnMut(&Assignment) -> f64,
{
    fn evaluate(&mut self, assignment: &Assignment) -> f64 {
        self(assignment)
    }
}

/// Drives the search over all registered variables.
pub struct Tuner<E> {
    config: TunerConfig,
    evaluator: E,
    names: NameRegistry,
    variables: Vec<Box<dyn Variable>>,
    registry: PerformanceRegistry,
    status: TuningStatus,
}

impl<E: Evaluator> Tuner<E> {
    pub fn new(config: TunerConfig, evaluator: E) -> TunerResult<Self> {
        config.validate()?;
        info!(
            "Creating tuner {} ({} epochs, {})",
            config.name,
            config.epochs,
            config.reduction.name()
        );
        Ok(Self {
            status: TuningStatus::new(config.id),
            config,
            evaluator,
            names: NameRegistry::new(),
            variables: Vec::new(),
            registry: PerformanceRegistry::new(),
        })
    }

    /// Build a tuner and all variables of `plan`.
    pub fn from_plan(plan: &TuningPlan, evaluator: E) -> TunerResult<Self> {
        let mut tuner = Self::new(plan.config.clone(), evaluator)?;
        for spec in &plan.variables {
            tuner.add_spec(spec)?;
        }
        Ok(tuner)
    }

    /// Registry that variables for this tuner should be created against.
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn add_variable(&mut self, variable: impl Variable + 'static) -> TunerResult<()> {
        self.add_boxed(Box::new(variable))
    }

    pub fn add_boxed(&mut self, variable: Box<dyn Variable>) -> TunerResult<()> {
        if self.variable(variable.name()).is_some() {
            return Err(TunerError::DuplicateName {
                name: variable.name().to_string(),
            });
        }
        debug!("Added variable {}", variable.describe());
        self.variables.push(variable);
        Ok(())
    }

    pub fn add_spec(&mut self, spec: &VariableSpec) -> TunerResult<()> {
        let variable = spec.build(&self.names)?;
        self.add_boxed(variable)
    }

    pub fn variable(&self, name: &str) -> Option<&dyn Variable> {
        self.variables
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    pub fn variables(&self) -> impl Iterator<Item = &dyn Variable> {
        self.variables.iter().map(|v| v.as_ref())
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PerformanceRegistry {
        &self.registry
    }

    pub fn status(&self) -> &TuningStatus {
        &self.status
    }

    /// Every variable at its initial value.
    pub fn initial_assignment(&self) -> Assignment {
        self.variables
            .iter()
            .map(|v| (v.name().to_string(), v.initial_value()))
            .collect()
    }

    /// Variable names in the order an epoch visits them.
    pub fn schedule(&self) -> Vec<String> {
        let mut order: Vec<&dyn Variable> = self.variables().collect();
        order.sort_by(|a, b| schedule_order(*a, *b));
        order.into_iter().map(|v| v.name().to_string()).collect()
    }

    /// Run all configured epochs from the initial assignment.
    pub fn run(&mut self) -> TunerResult<Assignment> {
        if self.variables.is_empty() {
            return Err(config_error!("no variables to tune"));
        }

        info!(
            "Starting tuning run {} over {} variables",
            self.config.id,
            self.variables.len()
        );
        self.status.mark_running();

        match self.run_epochs() {
            Ok(assignment) => {
                self.status.mark_completed();
                info!(
                    "Tuning completed: {} ({} evaluations, {} cache hits)",
                    assignment, self.status.evaluations, self.status.cache_hits
                );
                Ok(assignment)
            }
            Err(e) => {
                self.status.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    fn run_epochs(&mut self) -> TunerResult<Assignment> {
        let mut assignment = self.initial_assignment();
        for epoch in 0..self.config.epochs {
            info!("Starting epoch {}/{}", epoch + 1, self.config.epochs);
            assignment = self.run_epoch(assignment)?;
            self.status.epochs_completed += 1;
        }
        Ok(assignment)
    }

    /// Optimize each variable once, in schedule order.
    pub fn run_epoch(&mut self, mut assignment: Assignment) -> TunerResult<Assignment> {
        for name in self.schedule() {
            assignment = self.run_single_parameter(assignment, &name)?;
        }
        Ok(assignment)
    }

    /// Search `name` with every other coordinate of `assignment` held fixed
    /// and return the assignment with its best value substituted.
    pub fn run_single_parameter(
        &mut self,
        assignment: Assignment,
        name: &str,
    ) -> TunerResult<Assignment> {
        let index = self
            .variables
            .iter()
            .position(|v| v.name() == name)
            .ok_or_else(|| TunerError::VariableNotFound {
                name: name.to_string(),
            })?;

        let fixed = assignment.without(name);
        let mut scores = Scores::new();
        for (entry, score) in self.registry.matching(&fixed) {
            if let Some(value) = entry.get(name) {
                scores.insert(value.clone(), score);
            }
        }
        debug!(
            "Optimizing {} with {} reused scores",
            self.variables[index].describe(),
            scores.len()
        );

        loop {
            let value = match self.variables[index].next(&scores, &self.config.reduction)? {
                Proposal::Candidate(value) => value,
                Proposal::Exhausted => break,
            };
            if scores.contains(&value) {
                return Err(unreachable_state!(name, "value {} proposed twice", value));
            }

            let mut candidate = assignment.clone();
            candidate.set(name, value.clone());
            let score = self.evaluate(&candidate);
            scores.insert(value, score);
            if !self.registry.contains(&candidate) {
                self.registry.record(candidate, score);
            }
        }

        let (best, score) = scores.best(&self.config.reduction)?;
        debug!("Best {} = {} (score {})", name, best, score);

        let mut result = assignment;
        result.set(name, best.clone());
        Ok(result)
    }

    /// Score `assignment`, from the registry when it has been seen before.
    ///
    /// Does not record the result; callers do that once per new assignment.
    pub fn evaluate(&mut self, assignment: &Assignment) -> f64 {
        if let Ok(score) = self.registry.lookup(assignment) {
            debug!("Cache hit for {}", assignment);
            self.status.record_cache_hit();
            return score;
        }
        let score = self.evaluator.evaluate(assignment);
        debug!("Evaluated {} -> {}", assignment, score);
        self.status
            .record_evaluation(assignment, score, &self.config.reduction);
        score
    }
}

impl<E> std::fmt::Debug for Tuner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tuner")
            .field("config", &self.config)
            .field("variables", &self.variables)
            .field("registry_len", &self.registry.len())
            .field("status", &self.status)
            .finish()
    }
}
