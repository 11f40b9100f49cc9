//! Analysis configuration value objects.
//!
//! The set of configurations is finite: three interaction levels times two
//! device types. Everything else an analysis needs is derived from those two
//! identity fields, so `AnalysisOptions` exposes the derived values through
//! accessors only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Fixed analysis timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// How much the analysis pipeline interacts with the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionLevel {
    Minimal,
    #[default]
    Default,
    Thorough,
}

impl InteractionLevel {
    pub const ALL: [InteractionLevel; 3] = [Self::Minimal, Self::Default, Self::Thorough];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::Thorough => "thorough",
        }
    }

    /// `(max_interactions, max_scroll_steps)` for this level.
    fn limits(self) -> (u32, u32) {
        match self {
            Self::Minimal => (0, 1),
            Self::Default => (2, 3),
            Self::Thorough => (5, 6),
        }
    }
}

impl fmt::Display for InteractionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(Self::Minimal),
            "default" => Ok(Self::Default),
            "thorough" => Ok(Self::Thorough),
            other => Err(Error::InvalidInput(format!(
                "unknown interaction level '{other}' (expected minimal, default or thorough)"
            ))),
        }
    }
}

/// Device class the page is emulated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceType {
    pub const ALL: [DeviceType; 2] = [Self::Desktop, Self::Mobile];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(Error::InvalidInput(format!("unknown device type '{other}' (expected desktop or mobile)"))),
        }
    }
}

/// Options an analysis was (or will be) run with.
///
/// Only `interaction_level` and `device_type` take part in cache identity.
/// `verbose_logging` is carried along but ignored by key comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OptionsRepr")]
pub struct AnalysisOptions {
    interaction_level: InteractionLevel,
    device_type: DeviceType,
    max_interactions: u32,
    max_scroll_steps: u32,
    timeout: u64,
    verbose_logging: bool,
}

/// Wire shape accepted on deserialization. Derived fields are recomputed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsRepr {
    #[serde(default)]
    interaction_level: InteractionLevel,
    #[serde(default)]
    device_type: DeviceType,
    #[serde(default = "default_verbose")]
    verbose_logging: bool,
}

fn default_verbose() -> bool {
    true
}

impl From<OptionsRepr> for AnalysisOptions {
    fn from(repr: OptionsRepr) -> Self {
        Self::new(repr.interaction_level, repr.device_type).with_verbose_logging(repr.verbose_logging)
    }
}

impl AnalysisOptions {
    /// Build the canonical options for a level/device pair.
    pub fn new(interaction_level: InteractionLevel, device_type: DeviceType) -> Self {
        let (max_interactions, max_scroll_steps) = interaction_level.limits();
        Self {
            interaction_level,
            device_type,
            max_interactions,
            max_scroll_steps,
            timeout: DEFAULT_TIMEOUT_MS,
            verbose_logging: default_verbose(),
        }
    }

    pub fn with_verbose_logging(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub fn interaction_level(&self) -> InteractionLevel {
        self.interaction_level
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn max_interactions(&self) -> u32 {
        self.max_interactions
    }

    pub fn max_scroll_steps(&self) -> u32 {
        self.max_scroll_steps
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout
    }

    pub fn verbose_logging(&self) -> bool {
        self.verbose_logging
    }

    /// Whether two option sets address the same cache entries.
    pub fn is_cache_equivalent(&self, other: &Self) -> bool {
        self.interaction_level == other.interaction_level && self.device_type == other.device_type
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new(InteractionLevel::default(), DeviceType::default())
    }
}
