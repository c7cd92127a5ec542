use crate::error::{TelemetryError, TelemetryResult};
use std::fmt;

/// Which backend a sink is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Replace the value of an existing key in place, or append a new entry.
fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) -> Option<V> {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
        return Some(std::mem::replace(&mut slot.1, value));
    }
    entries.push((key, value));
    None
}

/// String annotations describing a run.
///
/// Keys are unique. Iteration follows insertion order so local output is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag, returning the previous value if the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        upsert(&mut self.entries, key.into(), value.into())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for TagSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// A single numeric observation.
///
/// Integers and floats stay distinct until a backend needs a single representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    /// Value as a double. Integers above 2^53 in magnitude lose precision.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

/// Numeric observations keyed by metric name, in insertion order.
///
/// Each `log_metrics` call with a `MetricSet` is one observation per key; logging the
/// same key again appends to that key's time series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    entries: Vec<(String, MetricValue)>,
}

impl MetricSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Option<MetricValue> {
        upsert(&mut self.entries, key.into(), value.into())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Reject the set if any value is NaN or infinite.
    pub fn validate(&self) -> TelemetryResult<()> {
        for (key, value) in self.iter() {
            if !value.is_finite() {
                return Err(TelemetryError::InvalidMetricValue {
                    key: key.to_string(),
                    value: value.as_f64(),
                });
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<MetricValue>> FromIterator<(K, V)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metrics = Self::new();
        for (key, value) in iter {
            metrics.insert(key, value);
        }
        metrics
    }
}

impl<K: Into<String>, V: Into<MetricValue>, const N: usize> From<[(K, V); N]> for MetricSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_set_preserves_insertion_order() {
        let tags = TagSet::new().with("b", "2").with("a", "1").with("c", "3");
        let keys: Vec<_> = tags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_tag_set_reinsert_replaces_in_place() {
        let mut tags = TagSet::from([("a", "1"), ("b", "2")]);
        let previous = tags.insert("a", "9");

        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().next(), Some(("a", "9")));
    }

    #[test]
    fn test_metric_value_display_keeps_type() {
        assert_eq!(MetricValue::from(42.0).to_string(), "42");
        assert_eq!(MetricValue::from(0.25).to_string(), "0.25");
        assert_eq!(MetricValue::from(7_i64).to_string(), "7");
        assert_eq!(MetricValue::from(-3).to_string(), "-3");
        assert!(matches!(MetricValue::from(7_i64), MetricValue::Int(7)));
    }

    #[test]
    fn test_metric_set_validate_rejects_non_finite() {
        let metrics = MetricSet::new().with("loss", 0.5).with("accuracy", f64::NAN);
        match metrics.validate() {
            Err(TelemetryError::InvalidMetricValue { key, .. }) => assert_eq!(key, "accuracy"),
            other => panic!("expected InvalidMetricValue, got {other:?}"),
        }

        let metrics = MetricSet::from([("lr", f64::INFINITY)]);
        assert!(metrics.validate().is_err());

        let metrics = MetricSet::from([("steps", 10)]);
        assert!(metrics.validate().is_ok());
    }

    #[test]
    fn test_int_as_f64() {
        assert!((MetricValue::Int(42).as_f64() - 42.0).abs() < f64::EPSILON);
    }
}
