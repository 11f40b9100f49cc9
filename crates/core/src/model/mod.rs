//! Analysis domain model.
//!
//! Value objects describing how an analysis is configured and the result
//! aggregate the cache stores and returns.

pub mod device;
pub mod key;
pub mod options;
pub mod result;

pub use device::{DeviceConfiguration, Viewport};
pub use key::{CacheKey, compute_cache_key};
pub use options::{AnalysisOptions, DeviceType, InteractionLevel};
pub use result::{AnalysisResult, PageMetadata, PageSize, ResourceCollection};
