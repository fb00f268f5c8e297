use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::advisors::{AdvisorInfo, SelectorKind};
use crate::error::WisdomError;
use crate::sources::Quote;

/// Pseudo source id that resolves to one real source per calendar day.
pub const RANDOM_SOURCE: &str = "random";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Read-only quote and advisor lookups used by the server handlers.
pub trait WisdomProvider: Send + Sync {
    /// Quote for `score` from `source_id`; [`RANDOM_SOURCE`] resolves
    /// against `today`.
    fn lookup_quote(
        &self,
        score: f64,
        source_id: &str,
        today: NaiveDate,
    ) -> Result<Quote, WisdomError>;

    fn lookup_advisor(&self, kind: SelectorKind, key: &str) -> Result<AdvisorInfo, WisdomError>;

    /// Sorted ids of every available source.
    fn list_source_ids(&self) -> Vec<String>;

    fn source_summary(&self, id: &str) -> Option<SourceSummary>;

    fn advisors(&self, kind: SelectorKind) -> BTreeMap<String, AdvisorInfo>;
}
