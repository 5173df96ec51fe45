use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Count of operator invocations keyed by `mutator/operator`.
///
/// Owned by a single [`MutationContext`](crate::random::MutationContext), so
/// concurrent generations never share a counter.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OperatorUsageStats {
    counter: BTreeMap<String, u64>,
}

impl OperatorUsageStats {
    pub fn increment(&mut self, mutator: &str, operator: &str) {
        *self
            .counter
            .entry(format!("{mutator}/{operator}"))
            .or_insert(0) += 1;
    }

    /// Number of invocations recorded for one operator.
    pub fn get(&self, mutator: &str, operator: &str) -> u64 {
        self.counter
            .get(&format!("{mutator}/{operator}"))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counter.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counter.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counter.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for OperatorUsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, count) in &self.counter {
            writeln!(f, "{key}: {count}")?;
        }
        Ok(())
    }
}
