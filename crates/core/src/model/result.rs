//! The analysis result aggregate.
//!
//! Produced by the analysis pipeline, stored and returned by the cache. The
//! cache never edits a result after it has been created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AnalysisOptions, CacheKey};

/// Resource measurements of a page.
///
/// Only `resource_count` is interpreted here; every other measurement the
/// pipeline records is kept verbatim in `details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCollection {
    pub resource_count: u64,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    pub has_frames: bool,
    pub has_service_worker: bool,
    pub page_size: PageSize,
}

/// One analysis run of one URL with one set of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub options: AnalysisOptions,
    /// Elapsed milliseconds of the analysis run.
    pub duration: u64,
    pub resources: ResourceCollection,
    pub metadata: PageMetadata,
}

impl AnalysisResult {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.url.clone(), &self.options)
    }

    /// Age of this result at `now`. Negative if `now` precedes the timestamp.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}
