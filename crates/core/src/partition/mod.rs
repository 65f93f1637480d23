//! User-defined memory partitions.
//!
//! This module covers everything that operates on partitions. It provides:
//! 1. **Model:** `Partition`, `PartitionCore` and the `Access` permission levels.
//! 2. **Patches:** Typed partial updates with whole-field replace semantics.
//! 3. **Validation:** Field-by-field rules producing user-facing messages.
//! 4. **Store:** The committed list plus one draft, with validate-and-commit transitions.
//! 5. **Usage:** Occupancy and free-space queries over blocks.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::common::addr::{self, end_address, ranges_overlap};
use crate::common::{Addr, ByteUnit};
use crate::soc::MemoryBlock;

/// Typed partial updates to a draft partition.
pub mod patch;

/// The authoritative partition list and the draft being edited.
pub mod store;

/// Occupancy and free-space queries.
pub mod usage;

/// Field-by-field partition validation.
pub mod validate;

pub use patch::PartitionPatch;
pub use store::{EditSession, PartitionStore};
pub use validate::{Field, FieldError, FieldErrors, Validation, Validator};

/// Plugin-specific settings: project id, then control id, then value.
pub type PluginConfig = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Permission level a core is granted on a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Access {
    /// Read only.
    #[default]
    #[serde(rename = "R")]
    Read,
    /// Read and write.
    #[serde(rename = "R/W")]
    ReadWrite,
    /// Read and execute.
    #[serde(rename = "R/X")]
    ReadExecute,
    /// Read, write and execute.
    #[serde(rename = "R/W/X")]
    ReadWriteExecute,
}

impl Access {
    /// Individual permission letters making up this level.
    pub const fn levels(self) -> &'static [&'static str] {
        match self {
            Self::Read => &["R"],
            Self::ReadWrite => &["R", "W"],
            Self::ReadExecute => &["R", "X"],
            Self::ReadWriteExecute => &["R", "W", "X"],
        }
    }

    /// The `/`-separated spelling used by the SoC data model.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Read => "R",
            Self::ReadWrite => "R/W",
            Self::ReadExecute => "R/X",
            Self::ReadWriteExecute => "R/W/X",
        }
    }

    /// Returns `true` when every level of `self` appears in `block_access`.
    ///
    /// `block_access` is a block's declared permission string such as `R/W`.
    pub fn permitted_by(self, block_access: &str) -> bool {
        let granted: Vec<&str> = block_access.split('/').map(str::trim).collect();
        self.levels().iter().all(|level| granted.contains(level))
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" => Ok(Self::Read),
            "R/W" => Ok(Self::ReadWrite),
            "R/X" => Ok(Self::ReadExecute),
            "R/W/X" => Ok(Self::ReadWriteExecute),
            other => Err(format!("unknown access level `{other}`")),
        }
    }
}

/// A core's (project's) relationship to a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionCore {
    /// Unique per firmware project.
    pub project_id: String,
    /// Hardware core; several projects may share one (secure/non-secure split).
    pub core_id: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Permission level on the partition.
    #[serde(default)]
    pub access: Access,
    /// Whether this project owns the partition.
    #[serde(default)]
    pub owner: bool,
}

/// A user-defined allocation inside one or more memory blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Unique (case-insensitive) identifier-like name.
    #[serde(default)]
    pub display_name: String,
    /// Memory type; must match a block `Type`.
    #[serde(rename = "type", default)]
    pub mem_type: String,
    /// Block containing `start_address`; `None` in a blank draft.
    #[serde(default, deserialize_with = "blank_block")]
    pub base_block: Option<MemoryBlock>,
    /// Blocks the partition spans, in address order.
    #[serde(default)]
    pub block_names: Vec<String>,
    /// First byte; `None` until an address has been entered.
    #[serde(default, with = "addr::optional")]
    pub start_address: Option<Addr>,
    /// Size in bytes; zero until a size has been entered.
    #[serde(default)]
    pub size: u64,
    /// Assigned projects/cores.
    #[serde(default)]
    pub projects: Vec<PartitionCore>,
    /// Plugin-specific settings per project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PluginConfig>,
    /// Unit the size was entered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<ByteUnit>,
}

impl Partition {
    /// Inclusive `[start, end]` range, when both address and a non-zero size are set.
    pub fn range(&self) -> Option<(u64, u64)> {
        let start = self.start_address?.0;
        end_address(start, self.size).map(|end| (start, end))
    }

    /// Inclusive end address.
    pub fn end_address(&self) -> Option<Addr> {
        self.range().map(|(_, end)| Addr(end))
    }

    /// Returns `true` when both partitions have ranges and they share an address.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.range(), other.range()) {
            (Some((a0, a1)), Some((b0, b1))) => ranges_overlap(a0, a1, b0, b1),
            _ => false,
        }
    }

    /// Returns `true` when this partition starts at `addr` (numeric comparison).
    pub fn starts_at(&self, addr: Addr) -> bool {
        self.start_address == Some(addr)
    }

    /// Name in the form used for uniqueness checks.
    pub fn name_key(&self) -> String {
        self.display_name.trim().to_uppercase()
    }

    /// Returns `true` when at least one assigned project owns the partition.
    pub fn has_owner(&self) -> bool {
        self.projects.iter().any(|p| p.owner)
    }
}

/// Decodes a partition list from JSON text.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed input.
pub fn partitions_from_json(json: &str) -> Result<Vec<Partition>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Encodes a partition list as pretty-printed JSON.
///
/// # Errors
///
/// Returns the `serde_json` error if a plugin config value cannot be encoded.
pub fn partitions_to_json(partitions: &[Partition]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(partitions)
}

/// Accepts `null`, an absent field, or the all-empty placeholder block a
/// blank draft is saved with, mapping all three to `None`.
fn blank_block<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MemoryBlock>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => {
            let blank = value
                .get("Name")
                .and_then(serde_json::Value::as_str)
                .is_none_or(str::is_empty);
            if blank {
                Ok(None)
            } else {
                serde_json::from_value(value)
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}
