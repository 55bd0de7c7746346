//! Parameter values, full assignments and per-coordinate score maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{TunerError, TunerResult};
use crate::reduction::Reduction;

/// A concrete value for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl ParameterValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Json(v) => v.as_f64(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::Json(serde_json::Value::String(v.to_string()))
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Json(serde_json::Value::Bool(v))
    }
}

/// One value per variable, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    values: BTreeMap<String, ParameterValue>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Numeric view of a coordinate.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParameterValue::as_f64)
    }

    /// Insert or replace the value of `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`Assignment::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Copy of this assignment with `name` removed.
    pub fn without(&self, name: &str) -> Self {
        let mut sub = self.clone();
        sub.values.remove(name);
        sub
    }

    /// True if every coordinate of `sub` is present here with an equal value.
    pub fn agrees_with(&self, sub: &Assignment) -> bool {
        sub.values
            .iter()
            .all(|(name, value)| self.values.get(name) == Some(value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Scores observed for a single variable while the others are held fixed.
///
/// Keeps insertion order: when several values share the best score, the one
/// observed first wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scores {
    entries: Vec<(ParameterValue, f64)>,
}

impl Scores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `score` for `value`, overwriting in place if already present.
    pub fn insert(&mut self, value: ParameterValue, score: f64) {
        match self.entries.iter_mut().find(|(v, _)| *v == value) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((value, score)),
        }
    }

    pub fn get(&self, value: &ParameterValue) -> Option<f64> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, s)| *s)
    }

    pub fn contains(&self, value: &ParameterValue) -> bool {
        self.entries.iter().any(|(v, _)| v == value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParameterValue, f64)> {
        self.entries.iter().map(|(v, s)| (v, *s))
    }

    pub fn values(&self) -> impl Iterator<Item = &ParameterValue> {
        self.entries.iter().map(|(v, _)| v)
    }

    /// The value whose score the reduction selects.
    pub fn best(&self, reduction: &Reduction) -> TunerResult<(&ParameterValue, f64)> {
        let scores: Vec<f64> = self.entries.iter().map(|(_, s)| *s).collect();
        if scores.is_empty() {
            return Err(TunerError::Reduction {
                message: "no scores observed".to_string(),
            });
        }
        let index = reduction
            .select(&scores)
            .ok_or_else(|| TunerError::Reduction {
                message: format!("{} reduction matched no observed score", reduction.name()),
            })?;
        let (value, score) = &self.entries[index];
        Ok((value, *score))
    }
}

impl FromIterator<(ParameterValue, f64)> for Scores {
    fn from_iter<I: IntoIterator<Item = (ParameterValue, f64)>>(iter: I) -> Self {
        let mut scores = Scores::new();
        for (value, score) in iter {
            scores.insert(value, score);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignment_without_and_agrees() {
        let full = Assignment::new()
            .with("a", 1_i64)
            .with("x", 0.25)
            .with("kind", "adam");

        let sub = full.without("x");
        assert_eq!(sub.len(), 2);
        assert!(sub.get("x").is_none());
        assert!(full.agrees_with(&sub));
        assert!(full.agrees_with(&Assignment::new()));

        let other = Assignment::new().with("a", 2_i64);
        assert!(!full.agrees_with(&other));

        let unknown = Assignment::new().with("missing", 1_i64);
        assert!(!full.agrees_with(&unknown));
    }

    #[test]
    fn assignment_display_is_sorted() {
        let assignment = Assignment::new().with("y", 0.5).with("a", -1_i64);
        assert_eq!(assignment.to_string(), "{a=-1, y=0.5}");
    }

    #[test]
    fn assignment_serializes_as_plain_map() {
        let assignment = Assignment::new()
            .with("a", -1_i64)
            .with("x", 0.1)
            .with("opt", "sgd");
        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value, json!({"a": -1, "x": 0.1, "opt": "sgd"}));

        let back: Assignment = serde_json::from_value(value).unwrap();
        assert_eq!(back, assignment);
    }

    #[test]
    fn scores_keep_insertion_order_for_ties() {
        let mut scores = Scores::new();
        scores.insert(ParameterValue::Float(2.0), 1.0);
        scores.insert(ParameterValue::Float(1.0), 1.0);
        scores.insert(ParameterValue::Float(0.0), 3.0);

        let (best, score) = scores.best(&Reduction::Minimize).unwrap();
        assert_eq!(best, &ParameterValue::Float(2.0));
        assert_eq!(score, 1.0);

        let (best, _) = scores.best(&Reduction::Maximize).unwrap();
        assert_eq!(best, &ParameterValue::Float(0.0));
    }

    #[test]
    fn scores_insert_overwrites() {
        let mut scores = Scores::new();
        scores.insert(ParameterValue::Int(1), 5.0);
        scores.insert(ParameterValue::Int(1), 4.0);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get(&ParameterValue::Int(1)), Some(4.0));
        assert!(!scores.contains(&ParameterValue::Int(2)));
    }

    #[test]
    fn best_of_empty_scores_is_an_error() {
        let err = Scores::new().best(&Reduction::Minimize).unwrap_err();
        assert!(matches!(err, TunerError::Reduction { .. }));
    }

    #[test]
    fn numeric_view() {
        assert_eq!(ParameterValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParameterValue::Json(json!(0.5)).as_f64(), Some(0.5));
        assert_eq!(ParameterValue::from("relu").as_f64(), None);
    }
}
