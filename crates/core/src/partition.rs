//! Partition resolution
//!
//! A partition is one independent upstream query (e.g. a single genre
//! search). Callers pass a [`QuerySelector`]; this module turns it into the
//! ordered list of partitions the pager has to visit.

use serde::{Deserialize, Serialize};

/// Configuration surface consumed by the aggregation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Largest `limit` the provider accepts in a single call.
    pub provider_max_batch: usize,
    pub default_market: String,
    /// Used when no partitions are configured.
    pub default_query: String,
    pub configured_partitions: Vec<String>,
}

impl CatalogConfig {
    /// Partitions visited for the "all" selector.
    pub fn all_partitions(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .configured_partitions
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if configured.is_empty() {
            vec![self.default_query.trim().to_string()]
        } else {
            configured
        }
    }

    pub fn market_or_default(&self, market: Option<&str>) -> String {
        match market.map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => self.default_market.clone(),
        }
    }
}

/// The `query` parameter as the caller sent it
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QuerySelector {
    #[default]
    Absent,
    Single(String),
    Many(Vec<String>),
}

impl QuerySelector {
    /// Build a selector from repeated query-string values.
    pub fn from_values(values: Vec<String>) -> Self {
        match values.len() {
            0 => QuerySelector::Absent,
            1 => QuerySelector::Single(values.into_iter().next().unwrap_or_default()),
            _ => QuerySelector::Many(values),
        }
    }
}

impl From<&str> for QuerySelector {
    fn from(value: &str) -> Self {
        QuerySelector::Single(value.to_string())
    }
}

/// Resolved partition list
#[derive(Debug, Clone, PartialEq)]
pub struct Partitions {
    pub queries: Vec<String>,
}

impl Partitions {
    /// Aggregate mode applies whenever more than one partition is involved.
    pub fn is_aggregate(&self) -> bool {
        self.queries.len() > 1
    }
}

/// Resolve the caller's selector against the configured partitions.
///
/// - array: non-empty trimmed entries, in order (no usable entry behaves as absent)
/// - string: empty or `all` (any case) expands to the configured list,
///   anything else is a single partition
/// - absent: same as the empty string
pub fn resolve_partitions(selector: &QuerySelector, config: &CatalogConfig) -> Partitions {
    let queries = match selector {
        QuerySelector::Many(values) => {
            let usable: Vec<String> = values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if usable.is_empty() {
                config.all_partitions()
            } else {
                usable
            }
        }
        QuerySelector::Single(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
                config.all_partitions()
            } else {
                vec![trimmed.to_string()]
            }
        }
        QuerySelector::Absent => config.all_partitions(),
    };

    Partitions { queries }
}

/// Key under which slices and totals of one partition are cached.
pub fn partition_key(market: &str, query: &str) -> String {
    format!("{market}|{query}")
}
