//! Cache identity for analysis results.

use sha2::{Digest, Sha256};

use super::{AnalysisOptions, DeviceType, InteractionLevel};

/// The lookup key of an analysis: URL plus the two identity fields of its options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub interaction_level: InteractionLevel,
    pub device_type: DeviceType,
}

impl CacheKey {
    pub fn new(url: impl Into<String>, options: &AnalysisOptions) -> Self {
        Self { url: url.into(), interaction_level: options.interaction_level(), device_type: options.device_type() }
    }

    /// Stable hex digest used as the indexed storage key.
    pub fn digest(&self) -> String {
        compute_cache_key(&self.url, self.interaction_level, self.device_type)
    }
}

/// Compute the storage key for a URL and identity pair.
pub fn compute_cache_key(url: &str, interaction_level: InteractionLevel, device_type: DeviceType) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(interaction_level.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(device_type.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
