//! SLA metric sets attached to a composition.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-composition target metric.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum SlaMetric {
    Latency99Percentile,
    Latency95Percentile,
    Latency90Percentile,
    Latency50Percentile,
    WorkflowConsistency,
}

/// Value domain of [`SlaMetric::WorkflowConsistency`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WorkflowConsistency {
    #[default]
    Any,
    Atomic,
    Acid,
}

impl fmt::Display for WorkflowConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowConsistency::Any => "Any",
            WorkflowConsistency::Atomic => "Atomic",
            WorkflowConsistency::Acid => "Acid",
        };
        f.write_str(s)
    }
}

/// Ordered metric → value mapping. Values are stringified on insertion, the
/// way downstream generators consume them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sla {
    metrics: BTreeMap<SlaMetric, String>,
}

impl Sla {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metric, stringifying the value. Returns the receiver for
    /// chaining; a repeated metric overwrites the previous value.
    pub fn add(&mut self, metric: SlaMetric, value: impl fmt::Display) -> &mut Self {
        self.metrics.insert(metric, value.to_string());
        self
    }

    /// Look up a metric's value.
    pub fn get(&self, metric: SlaMetric) -> Option<&str> {
        self.metrics.get(&metric).map(String::as_str)
    }

    /// Metrics in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (SlaMetric, &str)> {
        self.metrics.iter().map(|(&m, v)| (m, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
