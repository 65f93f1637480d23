//! Immutable memory topology built once from the SoC description.
//!
//! This module turns per-core memory lists into the block index every other
//! component reads. It performs:
//! 1. **Deduplication:** A block listed by several cores is indexed once; the first listing wins.
//! 2. **Ordering:** Blocks are sorted by start address, and grouped per memory type.
//! 3. **Invariant checks:** Inverted ranges are rejected; same-type gaps and overlaps are
//!    rejected or logged depending on [`TopologyConfig`].
//! 4. **Lookups:** Containing block, spanned blocks, per-core access, and alias windows.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::model::{CoreDescriptor, MemoryBlock, MemoryType, ProjectInfo, SocDescriptor};
use super::traits::CoreMemoryAccess;
use crate::common::Addr;
use crate::common::addr::{end_address, offset_address};
use crate::common::error::TopologyError;
use crate::config::TopologyConfig;
use crate::partition::PartitionCore;

/// One core's own listing of the blocks it can reach.
#[derive(Debug, Clone)]
pub struct CoreView {
    /// Hardware core identifier.
    pub id: String,
    /// Human-readable core name.
    pub description: String,
    /// The core's copy of each block, keyed by block name.
    pub blocks: BTreeMap<String, MemoryBlock>,
}

/// An alias window onto a block, as listed by one core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreAlias {
    /// Aliased block name.
    pub name: String,
    /// Core that lists the alias.
    pub core_id: String,
    /// Alias kind, e.g. `Secure`.
    pub alias_type: String,
    /// Address of the block's first byte through the alias.
    pub alias_base_address: Addr,
}

impl CoreAlias {
    /// Translates an address inside the aliased block to this window.
    ///
    /// `None` when `address` lies below `block_start` or the result overflows.
    pub fn translate(&self, block_start: Addr, address: Addr) -> Option<Addr> {
        let offset = address.0.checked_sub(block_start.0)?;
        offset_address(self.alias_base_address, offset)
    }
}

/// The deduplicated, address-sorted memory map of a SoC.
///
/// Built once per session and shared by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Topology {
    blocks: Vec<MemoryBlock>,
    by_type: BTreeMap<String, Vec<MemoryBlock>>,
    index: HashMap<String, usize>,
    cores: BTreeMap<String, CoreView>,
    aliases: HashMap<String, Vec<CoreAlias>>,
    memory_types: Vec<MemoryType>,
}

impl Topology {
    /// Builds the topology from a decoded SoC description.
    ///
    /// # Errors
    ///
    /// See [`Topology::build`].
    pub fn from_soc(soc: &SocDescriptor, config: &TopologyConfig) -> Result<Self, TopologyError> {
        Self::build(&soc.cores, soc.memory_types.clone(), config)
    }

    /// Builds the topology from core descriptors and the memory type table.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvertedRange`] for a block whose start lies
    /// above its end, and [`TopologyError::Gap`] or [`TopologyError::Overlap`]
    /// when `config.require_contiguous` is set and two consecutive blocks of
    /// one type do not abut exactly.
    pub fn build(
        cores: &[CoreDescriptor],
        memory_types: Vec<MemoryType>,
        config: &TopologyConfig,
    ) -> Result<Self, TopologyError> {
        let mut unique: HashMap<String, MemoryBlock> = HashMap::new();
        let mut core_views = BTreeMap::new();
        let mut aliases: HashMap<String, Vec<CoreAlias>> = HashMap::new();

        for core in cores {
            let mut view = CoreView {
                id: core.id.clone(),
                description: core.description.clone(),
                blocks: BTreeMap::new(),
            };

            for block in core.blocks() {
                block.check_range()?;
                if let Some(existing) = unique.get(&block.name) {
                    if existing.address_start != block.address_start
                        || existing.address_end != block.address_end
                    {
                        warn!(
                            block = %block.name,
                            core = %core.id,
                            "block listed with a different range; keeping the first listing"
                        );
                    }
                } else {
                    let _ = unique.insert(block.name.clone(), block.clone());
                }
                let _ = view.blocks.insert(block.name.clone(), block.clone());
            }

            for alias in core.aliases() {
                aliases.entry(alias.name.clone()).or_default().push(CoreAlias {
                    name: alias.name.clone(),
                    core_id: core.id.clone(),
                    alias_type: alias.alias_type.clone(),
                    alias_base_address: alias.alias_base_address,
                });
            }

            let _ = core_views.insert(core.id.clone(), view);
        }

        let mut blocks: Vec<MemoryBlock> = unique.into_values().collect();
        blocks.sort_by(|a, b| {
            a.address_start
                .cmp(&b.address_start)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut by_type: BTreeMap<String, Vec<MemoryBlock>> = BTreeMap::new();
        for block in &blocks {
            by_type
                .entry(block.mem_type.clone())
                .or_default()
                .push(block.clone());
        }

        for (mem_type, typed) in &by_type {
            check_contiguity(mem_type, typed, config.require_contiguous)?;
        }

        let index = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();

        debug!(
            blocks = blocks.len(),
            types = by_type.len(),
            cores = core_views.len(),
            "memory topology built"
        );

        Ok(Self {
            blocks,
            by_type,
            index,
            cores: core_views,
            aliases,
            memory_types,
        })
    }

    /// All blocks, sorted by start address.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Looks up a block by name.
    pub fn block(&self, name: &str) -> Option<&MemoryBlock> {
        self.index.get(name).map(|&i| &self.blocks[i])
    }

    /// Blocks whose names appear in `names`, in address order. Unknown names are skipped.
    pub fn blocks_named<S: AsRef<str>>(&self, names: &[S]) -> Vec<&MemoryBlock> {
        self.blocks
            .iter()
            .filter(|b| names.iter().any(|n| n.as_ref() == b.name))
            .collect()
    }

    /// Blocks of one memory type, sorted by start address; empty for an unknown type.
    pub fn blocks_for_type(&self, mem_type: &str) -> &[MemoryBlock] {
        self.by_type
            .get(mem_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct memory type names, in order of first appearance by address.
    pub fn memory_type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            if !names.contains(&block.mem_type.as_str()) {
                names.push(&block.mem_type);
            }
        }
        names
    }

    /// The memory type table supplied with the SoC description.
    pub fn memory_types(&self) -> &[MemoryType] {
        &self.memory_types
    }

    /// Volatility of `mem_type` from the type table; `None` for an unlisted type.
    pub fn is_volatile(&self, mem_type: &str) -> Option<bool> {
        self.memory_types
            .iter()
            .find(|t| t.name == mem_type)
            .map(|t| t.is_volatile)
    }

    /// First block whose range contains `addr`.
    pub fn find_block_containing(&self, addr: Addr) -> Option<&MemoryBlock> {
        block_containing(&self.blocks, addr)
    }

    /// Names of every block the range `[addr, addr + size - 1]` touches.
    pub fn blocks_spanned(&self, addr: Addr, size: u64) -> Vec<String> {
        spanned_block_names(&self.blocks, addr, size)
    }

    /// Looks up a core's view of the memory map.
    pub fn core(&self, id: &str) -> Option<&CoreView> {
        self.cores.get(id)
    }

    /// All cores, ordered by identifier.
    pub fn cores(&self) -> impl Iterator<Item = &CoreView> {
        self.cores.values()
    }

    /// Alias windows onto `block` listed by any of `core_ids`.
    pub fn aliases_for(&self, block: &str, core_ids: &[&str]) -> Vec<&CoreAlias> {
        if core_ids.is_empty() {
            return Vec::new();
        }
        self.aliases
            .get(block)
            .map(|list| {
                list.iter()
                    .filter(|a| core_ids.contains(&a.core_id.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` when some core in `cores` cannot reach `block` as memory of `mem_type`.
    pub fn is_block_disabled(&self, block: &MemoryBlock, cores: &[PartitionCore], mem_type: &str) -> bool {
        cores.iter().any(|core| {
            self.core(&core.core_id)
                .and_then(|view| view.blocks.get(&block.name))
                .is_none_or(|b| b.mem_type != mem_type)
        })
    }

    /// Projects whose core can reach at least one block of `mem_type`.
    pub fn assignable_cores<'p>(&self, projects: &'p [ProjectInfo], mem_type: &str) -> Vec<&'p ProjectInfo> {
        projects
            .iter()
            .filter(|p| {
                self.core(&p.core_id)
                    .is_some_and(|view| view.blocks.values().any(|b| b.mem_type == mem_type))
            })
            .collect()
    }
}

impl CoreMemoryAccess for Topology {
    fn block_access(&self, core_id: &str, block: &str) -> Option<String> {
        self.cores
            .get(core_id)
            .and_then(|view| view.blocks.get(block))
            .map(|b| b.access.clone())
    }

    fn core_label(&self, core_id: &str) -> Option<String> {
        self.cores.get(core_id).map(|view| {
            if view.description.is_empty() {
                view.id.clone()
            } else {
                view.description.clone()
            }
        })
    }
}

/// First block in `blocks` whose range contains `addr`.
pub fn block_containing(blocks: &[MemoryBlock], addr: Addr) -> Option<&MemoryBlock> {
    blocks.iter().find(|b| b.contains(addr))
}

/// Names of the blocks in `blocks` touched by `[addr, addr + size - 1]`.
///
/// A zero size spans nothing.
pub fn spanned_block_names(blocks: &[MemoryBlock], addr: Addr, size: u64) -> Vec<String> {
    let end = match end_address(addr.0, size) {
        Some(end) => end,
        None if size == 0 => return Vec::new(),
        None => u64::MAX,
    };
    blocks
        .iter()
        .filter(|b| b.overlaps(addr.0, end))
        .map(|b| b.name.clone())
        .collect()
}

fn check_contiguity(mem_type: &str, typed: &[MemoryBlock], strict: bool) -> Result<(), TopologyError> {
    for pair in typed.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let error = if next.address_start <= prev.address_end {
            TopologyError::Overlap {
                mem_type: mem_type.to_string(),
                previous: prev.name.clone(),
                next: next.name.clone(),
            }
        } else if prev.address_end.0.checked_add(1) != Some(next.address_start.0) {
            TopologyError::Gap {
                mem_type: mem_type.to_string(),
                previous: prev.name.clone(),
                next: next.name.clone(),
            }
        } else {
            continue;
        };

        if strict {
            return Err(error);
        }
        warn!(%error, "memory type bounds may include unmapped space");
    }
    Ok(())
}
