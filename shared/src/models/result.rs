//! Search result model.

use super::record::Record;
use serde::Serialize;

/// An enrichment step of a search that failed and was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Degradation {
    /// The count query failed; `total_count` is 0.
    Count {
        /// Why the step failed.
        reason: String,
    },
    /// Declared fields could not be resolved; `available_fields` is empty.
    Fields {
        /// Why the step failed.
        reason: String,
    },
}

/// Result of a log search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// Rows of the requested page.
    pub rows: Vec<Record>,

    /// Number of rows matching the filter across all pages.
    pub total_count: u64,

    /// Page size the rows were limited to.
    pub page_size: u32,

    /// Fields declared for the searched table.
    pub available_fields: Vec<String>,

    /// Enrichment steps that failed and were defaulted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Degradation>,
}

impl QueryResult {
    /// Returns true if any enrichment step was defaulted.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Returns true if the total count was defaulted after a failure.
    #[must_use]
    pub fn count_degraded(&self) -> bool {
        self.degraded
            .iter()
            .any(|d| matches!(d, Degradation::Count { .. }))
    }
}
