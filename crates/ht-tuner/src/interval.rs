//! Discretized bisection search over a numeric range.
//!
//! The range `[start, stop]` is cut into a grid of width `step`. The search
//! samples the initial value and both boundaries, then repeatedly bisects the
//! widest unexplored gap next to the current best grid point. A side of the
//! best point is finished once its `required_neighbors` closest grid points
//! have all been sampled; when both sides are finished the search is
//! exhausted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use ht_types::{
    config_error, unreachable_state, ParameterValue, Reduction, Scores, TunerError, TunerResult,
};

use crate::names::{NameGuard, NameRegistry};
use crate::variable::{Proposal, Variable, VariableOptions};

/// Relative slack used when deciding whether `(stop - start) / step` is whole.
const GRID_EPSILON: f64 = 1e-9;

/// Search strategy for interval variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStrategy {
    #[default]
    Bisection,
}

impl FromStr for IntervalStrategy {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bisection" => Ok(Self::Bisection),
            _ => Err(TunerError::UnknownStrategy {
                strategy: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IntervalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bisection => write!(f, "bisection"),
        }
    }
}

/// A discretized range: grid points `start + k * step`, capped at `stop`.
///
/// When `step` does not divide the range evenly, `stop` itself is the last
/// grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalDomain {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl IntervalDomain {
    pub fn new(start: f64, stop: f64, step: f64) -> TunerResult<Self> {
        let domain = Self { start, stop, step };
        domain.validate()?;
        Ok(domain)
    }

    pub fn validate(&self) -> TunerResult<()> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return Err(config_error!(
                "interval bounds must be finite, got [{}, {}] step {}",
                self.start,
                self.stop,
                self.step
            ));
        }
        if self.step <= 0.0 {
            return Err(config_error!("interval step must be positive, got {}", self.step));
        }
        if self.stop <= self.start {
            return Err(config_error!(
                "interval stop {} must be greater than start {}",
                self.stop,
                self.start
            ));
        }
        Ok(())
    }

    /// Index of the last grid point (the one equal to `stop`).
    pub fn last_index(&self) -> usize {
        let raw = (self.stop - self.start) / self.step;
        let rounded = raw.round();
        if (raw - rounded).abs() <= GRID_EPSILON * rounded.max(1.0) {
            rounded as usize
        } else {
            raw.ceil() as usize
        }
    }

    /// Number of grid points.
    pub fn grid_len(&self) -> usize {
        self.last_index() + 1
    }

    pub fn value_at(&self, index: usize) -> f64 {
        if index >= self.last_index() {
            self.stop
        } else {
            self.start + index as f64 * self.step
        }
    }

    /// Index of the grid point nearest to `value`; ties go to the upper
    /// point. Values outside the range clamp to the boundaries.
    pub fn snap_index(&self, value: f64) -> usize {
        let last = self.last_index();
        let steps = (value - self.start) / self.step;
        if steps <= 0.0 {
            return 0;
        }
        let lower = steps.floor() as usize;
        if lower >= last {
            return last;
        }
        let upper = lower + 1;
        if (value - self.value_at(lower)).abs() < (value - self.value_at(upper)).abs() {
            lower
        } else {
            upper
        }
    }

    pub fn snap(&self, value: f64) -> f64 {
        self.value_at(self.snap_index(value))
    }

    /// Distance between two grid points, in steps.
    fn steps_between(&self, from: usize, to: usize) -> f64 {
        (self.value_at(to) - self.value_at(from)) / self.step
    }

    /// Grid point halfway between `from` and `to`.
    fn center(&self, from: usize, to: usize) -> usize {
        let points = self.steps_between(from, to) + 1.0;
        let middle = (points / 2.0).floor();
        self.snap_index(self.value_at(from) + middle * self.step)
    }
}

/// A numeric variable searched by discretized bisection.
#[derive(Debug)]
pub struct IntervalVariable {
    guard: NameGuard,
    domain: IntervalDomain,
    initial_index: usize,
    priority: i32,
    required_neighbors: usize,
    strategy: IntervalStrategy,
}

impl IntervalVariable {
    /// Create an interval variable that needs `required_neighbors` sampled
    /// grid points on each side of its best value before it is exhausted.
    pub fn new(
        names: &NameRegistry,
        domain: IntervalDomain,
        required_neighbors: usize,
        options: VariableOptions,
    ) -> TunerResult<Self> {
        domain.validate()?;
        if required_neighbors == 0 {
            return Err(config_error!("required_neighbors must be at least 1"));
        }
        let initial_index = match &options.initial_value {
            None => 0,
            Some(value) => {
                let numeric = value.as_f64().ok_or_else(|| {
                    config_error!("interval initial value {} is not numeric", value)
                })?;
                domain.snap_index(numeric)
            }
        };

        let guard = names.register(options.name.as_deref())?;
        Ok(Self {
            guard,
            domain,
            initial_index,
            priority: options.priority,
            required_neighbors,
            strategy: IntervalStrategy::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: IntervalStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn domain(&self) -> &IntervalDomain {
        &self.domain
    }

    pub fn required_neighbors(&self) -> usize {
        self.required_neighbors
    }

    pub fn strategy(&self) -> IntervalStrategy {
        self.strategy
    }

    fn value(&self, index: usize) -> ParameterValue {
        ParameterValue::Float(self.domain.value_at(index))
    }

    /// Sorted, de-duplicated grid indices of every numeric scored value.
    fn sampled_indices(&self, scores: &Scores) -> Vec<usize> {
        let mut indices: Vec<usize> = scores
            .values()
            .filter_map(|value| match value.as_f64() {
                Some(v) => Some(self.domain.snap_index(v)),
                None => {
                    tracing::warn!("Ignoring non-numeric score key {} for {}", value, self.name());
                    None
                }
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    fn next_bisection(&self, scores: &Scores, reduction: &Reduction) -> TunerResult<Proposal> {
        let last = self.domain.last_index();

        for index in [self.initial_index, 0, last] {
            let value = self.value(index);
            if !scores.contains(&value) {
                return Ok(Proposal::Candidate(value));
            }
        }

        let (best_value, _) = scores.best(reduction)?;
        let best = match best_value.as_f64() {
            Some(v) => self.domain.snap_index(v),
            None => {
                return Err(unreachable_state!(
                    self.name(),
                    "best value {} is not numeric",
                    best_value
                ))
            }
        };

        let sampled = self.sampled_indices(scores);
        let n = self.required_neighbors;
        let (left, right) = closest_bounds(&sampled, best, n);

        let wanted_left: Vec<usize> = (1..=n).rev().filter_map(|i| best.checked_sub(i)).collect();
        let wanted_right: Vec<usize> = (1..=n).map(|i| best + i).filter(|k| *k <= last).collect();

        let left_done = wanted_left.is_empty() || wanted_left == left;
        let right_done = wanted_right.is_empty() || wanted_right == right;

        // Bound lists are never empty: a side without samples holds `best`.
        let nearest_left = left.last().copied().unwrap_or(best);
        let nearest_right = right.first().copied().unwrap_or(best);
        let left_gap = self.domain.steps_between(nearest_left, best);
        let right_gap = self.domain.steps_between(best, nearest_right);

        let index = match (left_done, right_done) {
            (true, true) => return Ok(Proposal::Exhausted),
            (true, false) => {
                if right_gap > n as f64 {
                    self.domain.center(best, nearest_right)
                } else {
                    missing_neighbor(self.name(), &wanted_right, &right)?
                }
            }
            (false, true) => {
                if left_gap > n as f64 {
                    self.domain.center(nearest_left, best)
                } else {
                    missing_neighbor(self.name(), &wanted_left, &left)?
                }
            }
            (false, false) => {
                let (center, wanted, bounds) = if left_gap >= right_gap {
                    (self.domain.center(nearest_left, best), &wanted_left, &left)
                } else {
                    (self.domain.center(best, nearest_right), &wanted_right, &right)
                };
                // Adjacent neighbors on both sides collapse the centre onto a
                // sampled point; fill the missing neighbors instead.
                if sampled.binary_search(&center).is_ok() {
                    missing_neighbor(self.name(), wanted, bounds)?
                } else {
                    center
                }
            }
        };

        tracing::trace!(
            variable = self.name(),
            best,
            left_gap,
            right_gap,
            index,
            "bisection proposal"
        );
        Ok(Proposal::Candidate(self.value(index)))
    }
}

/// Up to `n` sampled indices directly left and right of `best`, in ascending
/// order. A side with no sampled index yields `[best]`.
fn closest_bounds(sampled: &[usize], best: usize, n: usize) -> (Vec<usize>, Vec<usize>) {
    let split = sampled.partition_point(|k| *k < best);
    let above = sampled.partition_point(|k| *k <= best);

    let mut left: Vec<usize> = sampled[..split].iter().rev().take(n).copied().collect();
    left.reverse();
    if left.is_empty() {
        left.push(best);
    }

    let mut right: Vec<usize> = sampled[above..].iter().take(n).copied().collect();
    if right.is_empty() {
        right.push(best);
    }

    (left, right)
}

/// First wanted neighbor that has not been sampled yet.
fn missing_neighbor(variable: &str, wanted: &[usize], bounds: &[usize]) -> TunerResult<usize> {
    if wanted == bounds {
        return Err(unreachable_state!(
            variable,
            "side already complete with neighbors {:?}",
            bounds
        ));
    }
    wanted
        .iter()
        .copied()
        .find(|k| !bounds.contains(k))
        .ok_or_else(|| {
            unreachable_state!(
                variable,
                "no missing neighbor among {:?}, sampled {:?}",
                wanted,
                bounds
            )
        })
}

impl Variable for IntervalVariable {
    fn name(&self) -> &str {
        self.guard.name()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn cardinality(&self) -> usize {
        match self.strategy {
            IntervalStrategy::Bisection => {
                let intervals = (((self.domain.stop - self.domain.start) / self.domain.step)
                    .floor() as usize)
                    .max(1);
                let depth = (intervals as f64).log2().ceil() as usize;
                depth + 2 * self.required_neighbors
            }
        }
    }

    fn initial_value(&self) -> ParameterValue {
        self.value(self.initial_index)
    }

    fn next(&self, scores: &Scores, reduction: &Reduction) -> TunerResult<Proposal> {
        match self.strategy {
            IntervalStrategy::Bisection => self.next_bisection(scores, reduction),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} [{}, {}] step {} ({}, {} neighbors)",
            self.name(),
            self.domain.start,
            self.domain.stop,
            self.domain.step,
            self.strategy,
            self.required_neighbors
        )
    }
}
