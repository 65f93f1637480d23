//! Typed partial updates.
//!
//! A [`PartitionPatch`] names the fields it replaces; every named field is
//! replaced whole (a new `projects` list replaces the old list, it is never
//! merged element by element). Nullable fields use `Option<Option<T>>` so a
//! patch can clear them.

use super::{Partition, PartitionCore, PluginConfig};
use crate::common::{Addr, ByteUnit};
use crate::soc::MemoryBlock;

/// A set of whole-field replacements for a [`Partition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionPatch {
    /// New display name.
    pub display_name: Option<String>,
    /// New memory type.
    pub mem_type: Option<String>,
    /// New base block, or `Some(None)` to clear it.
    pub base_block: Option<Option<MemoryBlock>>,
    /// New spanned block list.
    pub block_names: Option<Vec<String>>,
    /// New start address, or `Some(None)` to clear it.
    pub start_address: Option<Option<Addr>>,
    /// New size in bytes.
    pub size: Option<u64>,
    /// New project list.
    pub projects: Option<Vec<PartitionCore>>,
    /// New plugin config, or `Some(None)` to clear it.
    pub config: Option<Option<PluginConfig>>,
    /// New display unit, or `Some(None)` to clear it.
    pub display_unit: Option<Option<ByteUnit>>,
}

impl PartitionPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the display name.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replaces the memory type.
    #[must_use]
    pub fn mem_type(mut self, mem_type: impl Into<String>) -> Self {
        self.mem_type = Some(mem_type.into());
        self
    }

    /// Replaces the base block.
    #[must_use]
    pub fn base_block(mut self, block: Option<MemoryBlock>) -> Self {
        self.base_block = Some(block);
        self
    }

    /// Replaces the spanned block list.
    #[must_use]
    pub fn block_names(mut self, names: Vec<String>) -> Self {
        self.block_names = Some(names);
        self
    }

    /// Replaces the start address.
    #[must_use]
    pub fn start_address(mut self, addr: Option<Addr>) -> Self {
        self.start_address = Some(addr);
        self
    }

    /// Replaces the size.
    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Replaces the project list.
    #[must_use]
    pub fn projects(mut self, projects: Vec<PartitionCore>) -> Self {
        self.projects = Some(projects);
        self
    }

    /// Replaces the plugin config.
    #[must_use]
    pub fn config(mut self, config: Option<PluginConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the display unit.
    #[must_use]
    pub const fn display_unit(mut self, unit: Option<ByteUnit>) -> Self {
        self.display_unit = Some(unit);
        self
    }

    /// Returns `true` when the patch names no field.
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.mem_type.is_none()
            && self.base_block.is_none()
            && self.block_names.is_none()
            && self.start_address.is_none()
            && self.size.is_none()
            && self.projects.is_none()
            && self.config.is_none()
            && self.display_unit.is_none()
    }

    /// Returns `true` when the patch touches anything the derived block
    /// fields depend on: address, size, type or the assigned cores.
    pub const fn changes_placement(&self) -> bool {
        self.start_address.is_some()
            || self.size.is_some()
            || self.mem_type.is_some()
            || self.projects.is_some()
    }

    /// Returns `true` when the patch sets the block fields explicitly.
    pub const fn sets_blocks(&self) -> bool {
        self.base_block.is_some() || self.block_names.is_some()
    }

    /// Writes every named field into `partition`.
    pub fn apply(self, partition: &mut Partition) {
        if let Some(name) = self.display_name {
            partition.display_name = name;
        }
        if let Some(mem_type) = self.mem_type {
            partition.mem_type = mem_type;
        }
        if let Some(block) = self.base_block {
            partition.base_block = block;
        }
        if let Some(names) = self.block_names {
            partition.block_names = names;
        }
        if let Some(addr) = self.start_address {
            partition.start_address = addr;
        }
        if let Some(size) = self.size {
            partition.size = size;
        }
        if let Some(projects) = self.projects {
            partition.projects = projects;
        }
        if let Some(config) = self.config {
            partition.config = config;
        }
        if let Some(unit) = self.display_unit {
            partition.display_unit = unit;
        }
    }
}
