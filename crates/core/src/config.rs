//! Configuration for the partition engine.
//!
//! This module defines the configuration structures used to parameterize the
//! engine and its command-line front end. It provides:
//! 1. **Defaults:** Baseline values applied when a field is omitted.
//! 2. **Structures:** General (logging), topology construction, and report display settings.
//!
//! Configuration is supplied as JSON, or use `Config::default()`.

use serde::Deserialize;

use crate::common::ByteUnit;

/// Default configuration constants.
mod defaults {
    /// Log filter applied when neither `RUST_LOG` nor the config sets one.
    pub const LOG_FILTER: &str = "warn";

    /// Blocks of one memory type must tile a single address range.
    ///
    /// The validator computes type-wide bounds from the first and last block,
    /// which is only meaningful when there are no holes in between.
    pub const REQUIRE_CONTIGUOUS: bool = true;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use socmap_core::config::Config;
///
/// let config = Config::default();
/// assert!(config.topology.require_contiguous);
/// assert_eq!(config.general.log_filter, "warn");
/// ```
///
/// Deserializing from JSON, with omitted sections falling back to defaults:
///
/// ```
/// use socmap_core::common::ByteUnit;
/// use socmap_core::config::Config;
///
/// let json = r#"{
///     "general": { "log_filter": "socmap_core=debug" },
///     "display": { "whole_numbers": true, "default_unit": "MB" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.log_filter, "socmap_core=debug");
/// assert!(config.topology.require_contiguous);
/// assert_eq!(config.display.default_unit, ByteUnit::Mb);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Topology construction settings
    #[serde(default)]
    pub topology: TopologyConfig,
    /// Report formatting settings
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or mistyped fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// General settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// `tracing` filter directive (same syntax as `RUST_LOG`)
    #[serde(default = "GeneralConfig::default_log_filter")]
    pub log_filter: String,
}

impl GeneralConfig {
    /// Returns the default log filter.
    fn default_log_filter() -> String {
        defaults::LOG_FILTER.to_string()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: Self::default_log_filter(),
        }
    }
}

/// Topology construction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    /// Reject SoC descriptions whose same-type blocks have gaps or overlaps.
    /// When false the irregularity is logged and the topology is built anyway.
    #[serde(default = "TopologyConfig::default_require_contiguous")]
    pub require_contiguous: bool,
}

impl TopologyConfig {
    /// Returns the default contiguity requirement.
    const fn default_require_contiguous() -> bool {
        defaults::REQUIRE_CONTIGUOUS
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            require_contiguous: defaults::REQUIRE_CONTIGUOUS,
        }
    }
}

/// Report formatting settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    /// Round usage figures to whole numbers
    #[serde(default)]
    pub whole_numbers: bool,

    /// Unit partition sizes are shown in when a partition has no `displayUnit`
    #[serde(default)]
    pub default_unit: ByteUnit,
}
