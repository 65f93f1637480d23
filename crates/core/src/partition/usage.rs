//! Occupancy and free-space queries.
//!
//! All functions are pure reads over a partition list and one or more blocks.
//! Only the part of a partition that falls inside a block counts towards that
//! block's occupancy, so a partition spanning two blocks is split between them.

use super::Partition;
use crate::common::Addr;
use crate::soc::{MemoryBlock, MemoryType};

/// Partitions listing `block` among their spanned blocks, sorted by start address.
pub fn partitions_in_block<'p>(partitions: &'p [Partition], block: &MemoryBlock) -> Vec<&'p Partition> {
    let mut found: Vec<&Partition> = partitions
        .iter()
        .filter(|p| p.block_names.contains(&block.name))
        .collect();
    found.sort_by_key(|p| p.start_address);
    found
}

/// Sum of partition sizes.
pub fn total_partition_size<'p>(partitions: impl IntoIterator<Item = &'p Partition>) -> u64 {
    partitions.into_iter().map(|p| p.size).sum()
}

/// Bytes of `partition` that fall inside `block`.
pub fn occupied_in_block(partition: &Partition, block: &MemoryBlock) -> u64 {
    partition
        .range()
        .map_or(0, |(start, end)| block.bytes_within(start, end))
}

/// Free bytes left in `block` once `partitions` are subtracted.
pub fn remaining_in_block<'p>(block: &MemoryBlock, partitions: impl IntoIterator<Item = &'p Partition>) -> u64 {
    let used: u64 = partitions
        .into_iter()
        .map(|p| occupied_in_block(p, block))
        .sum();
    block.size().saturating_sub(used)
}

/// Free bytes in `block`, considering only partitions that list it.
pub fn available_memory(block: &MemoryBlock, partitions: &[Partition]) -> u64 {
    remaining_in_block(block, partitions_in_block(partitions, block))
}

/// Returns `true` when `block` has no free bytes left.
///
/// When the draft already has a size it is already counted in `partitions`
/// under its own name, so that entry is skipped. If skipping it leaves
/// nothing, the full list is used.
pub fn is_block_occupied(block: &MemoryBlock, draft: &Partition, partitions: &[Partition]) -> bool {
    let others: Vec<Partition> = if draft.size > 0 {
        partitions
            .iter()
            .filter(|p| p.display_name != draft.display_name)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    let counted: &[Partition] = if others.is_empty() { partitions } else { &others };
    available_memory(block, counted) == 0
}

/// Lowest address in `block` at which a new partition could start.
///
/// The scan only considers partitions whose base block has the same type:
/// 1. A partition running into the block from below pushes the result to its end.
/// 2. Otherwise the block start is free unless a partition based in the block starts there.
/// 3. Otherwise partitions based in the block are walked in address order until the first gap.
///
/// A full block yields an address at or past `block.address_end`; callers
/// detect that with [`is_block_occupied`] before offering the block.
pub fn first_available_address(block: &MemoryBlock, partitions: &[Partition]) -> Addr {
    let block_start = block.address_start.0;
    let block_end = block.address_end.0;

    let mut same_type: Vec<(u64, u64, &Partition)> = partitions
        .iter()
        .filter(|p| {
            p.base_block
                .as_ref()
                .is_some_and(|b| b.mem_type == block.mem_type)
        })
        .filter_map(|p| {
            let start = p.start_address?.0;
            Some((start, start.saturating_add(p.size), p))
        })
        .collect();
    same_type.sort_by_key(|&(start, _, _)| start);

    if let Some(&(_, end, _)) = same_type
        .iter()
        .find(|&&(start, end, _)| start < block_start && end > block_start)
    {
        return Addr(end.min(block_end));
    }

    let in_block: Vec<(u64, u64)> = same_type
        .iter()
        .filter(|(_, _, p)| p.base_block.as_ref().is_some_and(|b| b.name == block.name))
        .map(|&(start, end, _)| (start, end))
        .collect();

    match in_block.first() {
        Some(&(first, _)) if first == block_start => {}
        _ => return block.address_start,
    }

    let mut offset = block_start;
    for (start, end) in in_block {
        if start > offset {
            break;
        }
        offset = offset.max(end);
    }
    Addr(offset)
}

/// Total bytes across `blocks`.
pub fn total_block_memory<'b>(blocks: impl IntoIterator<Item = &'b MemoryBlock>) -> u64 {
    blocks.into_iter().map(MemoryBlock::size).sum()
}

/// Sum of sizes of partitions of `mem_type`.
pub fn total_for_type(partitions: &[Partition], mem_type: &str) -> u64 {
    total_partition_size(partitions.iter().filter(|p| p.mem_type == mem_type))
}

/// Partitions whose type is marked volatile in `memory_types`.
pub fn volatile_partitions<'p>(partitions: &'p [Partition], memory_types: &[MemoryType]) -> Vec<&'p Partition> {
    filter_by_volatility(partitions, memory_types, true)
}

/// Partitions whose type is marked non-volatile in `memory_types`.
///
/// A partition whose type is missing from the table is in neither set.
pub fn non_volatile_partitions<'p>(partitions: &'p [Partition], memory_types: &[MemoryType]) -> Vec<&'p Partition> {
    filter_by_volatility(partitions, memory_types, false)
}

fn filter_by_volatility<'p>(partitions: &'p [Partition], memory_types: &[MemoryType], volatile: bool) -> Vec<&'p Partition> {
    partitions
        .iter()
        .filter(|p| {
            memory_types
                .iter()
                .any(|t| t.name == p.mem_type && t.is_volatile == volatile)
        })
        .collect()
}
