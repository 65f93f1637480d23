//! SoC data model as supplied by the host application.
//!
//! These types mirror the JSON SoC description: a list of cores, each listing
//! the memory blocks (and alias windows) it can reach, plus the memory type
//! table. Field names follow the data model's PascalCase spelling.

use serde::{Deserialize, Serialize};

use crate::common::Addr;
use crate::common::addr::ranges_overlap;
use crate::common::error::TopologyError;

/// A contiguous, named region of the SoC address space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryBlock {
    /// Unique block name, e.g. `sysram0`.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// First address of the block (inclusive).
    pub address_start: Addr,
    /// Last address of the block (inclusive).
    pub address_end: Addr,
    /// Data width in bits.
    #[serde(default)]
    pub width: u32,
    /// Permission string such as `R/W` or `R/W/X`.
    #[serde(default)]
    pub access: String,
    /// Memory class such as `Flash` or `RAM`.
    #[serde(rename = "Type")]
    pub mem_type: String,
    /// `Internal` or `External`.
    #[serde(default)]
    pub location: String,
    /// Required alignment in bytes for partitions placed in this block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_alignment: Option<u64>,
    /// TrustZone marker (`Secure`, `NonSecure`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_zone: Option<String>,
}

impl MemoryBlock {
    /// Total bytes covered by the block.
    pub const fn size(&self) -> u64 {
        self.address_end
            .0
            .saturating_sub(self.address_start.0)
            .saturating_add(1)
    }

    /// Returns `true` when `addr` lies inside the block.
    pub fn contains(&self, addr: Addr) -> bool {
        addr >= self.address_start && addr <= self.address_end
    }

    /// Returns `true` when the inclusive range `[start, end]` touches the block.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        ranges_overlap(start, end, self.address_start.0, self.address_end.0)
    }

    /// Bytes of the inclusive range `[start, end]` that fall inside the block.
    pub fn bytes_within(&self, start: u64, end: u64) -> u64 {
        let lo = start.max(self.address_start.0);
        let hi = end.min(self.address_end.0);
        if hi < lo { 0 } else { hi - lo + 1 }
    }

    /// Minimum alignment, treating an explicit zero as "no constraint".
    pub fn alignment(&self) -> Option<u64> {
        self.minimum_alignment.filter(|&a| a > 0)
    }

    /// Checks the `start <= end` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvertedRange`] when the bounds are swapped.
    pub fn check_range(&self) -> Result<(), TopologyError> {
        if self.address_start > self.address_end {
            return Err(TopologyError::InvertedRange {
                name: self.name.clone(),
                start: self.address_start,
                end: self.address_end,
            });
        }
        Ok(())
    }
}

/// A secondary address window through which a core reaches an existing block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryAliasRef {
    /// Name of the aliased block.
    pub name: String,
    /// Alias kind, e.g. `Secure` or `NonSecure`.
    #[serde(default)]
    pub alias_type: String,
    /// Address of the block's first byte through this alias.
    pub alias_base_address: Addr,
}

/// One entry of a core's `Memory` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoreMemory {
    /// Alias window onto a block described elsewhere.
    Alias(MemoryAliasRef),
    /// A block the core can address directly.
    Block(MemoryBlock),
}

/// A processor core and the memory it can reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoreDescriptor {
    /// Hardware core identifier, e.g. `CM4`.
    pub id: String,
    /// Human-readable core name.
    #[serde(default)]
    pub description: String,
    /// Blocks and aliases visible to this core.
    #[serde(default)]
    pub memory: Vec<CoreMemory>,
}

impl CoreDescriptor {
    /// Iterates over the directly addressable blocks, skipping aliases.
    pub fn blocks(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.memory.iter().filter_map(|m| match m {
            CoreMemory::Block(block) => Some(block),
            CoreMemory::Alias(_) => None,
        })
    }

    /// Iterates over the alias entries.
    pub fn aliases(&self) -> impl Iterator<Item = &MemoryAliasRef> {
        self.memory.iter().filter_map(|m| match m {
            CoreMemory::Alias(alias) => Some(alias),
            CoreMemory::Block(_) => None,
        })
    }
}

/// Whether a memory class loses its contents on reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryType {
    /// Type name matching `MemoryBlock::mem_type`.
    pub name: String,
    /// `true` for RAM-like memory.
    #[serde(default)]
    pub is_volatile: bool,
}

/// A firmware project bound to a core; the unit partitions are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectInfo {
    /// Unique project identifier.
    pub project_id: String,
    /// Core the project runs on.
    pub core_id: String,
    /// Human-readable project name.
    #[serde(default)]
    pub description: String,
    /// Secure/non-secure world for TrustZone splits; `None` when not applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

/// The subset of the SoC data model the engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SocDescriptor {
    /// All cores of the SoC.
    #[serde(default)]
    pub cores: Vec<CoreDescriptor>,
    /// Memory type table.
    #[serde(default)]
    pub memory_types: Vec<MemoryType>,
}

impl SocDescriptor {
    /// Decodes a SoC description from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Decode`] on malformed JSON or missing fields.
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        serde_json::from_str(json).map_err(|e| TopologyError::Decode(e.to_string()))
    }
}
