//! Layout geometry for the occupancy bar.
//!
//! This module turns address ranges into percentages of a block (or of a run
//! of same-type blocks) for a horizontal bar. It provides:
//! 1. **Widths and offsets:** Where a partition starts and how much of the bar it covers.
//! 2. **Segments:** Offset, width and the corner rounding at the bar's ends.
//! 3. **Free gaps:** Unoccupied stretches of a block, where an "add" control can go.
//!
//! Percentages are `f64` in `0.0..=100.0`. A zero-width range yields `0.0`
//! rather than dividing by zero.

#![allow(clippy::float_cmp)]

use crate::common::Addr;
use crate::partition::Partition;
use crate::partition::usage::occupied_in_block;
use crate::soc::MemoryBlock;

/// Corner rounding of a segment, from where it meets the ends of the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderRadius {
    /// Touches neither end.
    #[default]
    None,
    /// Spans the whole bar.
    Full,
    /// Touches the left end only.
    Left,
    /// Touches the right end only.
    Right,
}

impl BorderRadius {
    /// CSS `border-radius` value, or `None` when the corners stay square.
    pub const fn css(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Full => Some("2px"),
            Self::Left => Some("2px 0 0 2px"),
            Self::Right => Some("0 2px 2px 0"),
        }
    }
}

/// A partition's position on the bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// Left edge, in percent.
    pub offset: f64,
    /// Width, in percent.
    pub width: f64,
    /// Corner rounding.
    pub radius: BorderRadius,
}

/// An unoccupied stretch of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// First free address.
    pub address: Addr,
    /// Last free address.
    pub end_address: Addr,
    /// Left edge within the block, in percent.
    pub offset: f64,
    /// Width within the block, in percent.
    pub width: f64,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Left edge of `partition` within `[start, end]`; zero when it starts at or before `start`.
pub fn partition_offset(partition: &Partition, start: u64, end: u64) -> f64 {
    match partition.start_address {
        Some(addr) if addr.0 > start => percent(addr.0 - start, end.saturating_sub(start)),
        _ => 0.0,
    }
}

/// Share of `blocks`' total size taken by `block`.
pub fn block_width(block: &MemoryBlock, blocks: &[MemoryBlock]) -> f64 {
    let total: u64 = blocks.iter().map(MemoryBlock::size).sum();
    percent(block.size(), total)
}

/// Share of `block` covered by `partition`.
pub fn partition_width(partition: &Partition, block: &MemoryBlock) -> f64 {
    percent(occupied_in_block(partition, block), block.size())
}

/// Width of `partition` across the run `[start, end]`; 100 when it reaches `end`.
pub fn multi_block_partition_width(partition: &Partition, start: u64, end: u64) -> f64 {
    match partition.end_address() {
        None => 0.0,
        Some(last) if last.0 >= end => 100.0,
        Some(_) => percent(partition.size, end.saturating_sub(start)),
    }
}

/// Corner rounding for a segment at `offset` with `width`.
pub fn border_radius(offset: f64, width: f64) -> BorderRadius {
    let at_start = offset == 0.0;
    let at_end = (offset + width).round() == 100.0;
    match (at_start, at_end) {
        (true, true) => BorderRadius::Full,
        (true, false) => BorderRadius::Left,
        (false, true) => BorderRadius::Right,
        (false, false) => BorderRadius::None,
    }
}

/// Position of `partition` inside a single block's bar.
pub fn single_block_segment(partition: &Partition, block: &MemoryBlock) -> Segment {
    let width = partition_width(partition, block);
    let offset = partition_offset(partition, block.address_start.0, block.address_end.0);
    Segment {
        offset,
        width,
        radius: border_radius(offset, width),
    }
}

/// Position of `partition` across the address-sorted run `blocks`.
///
/// A partition reaching the end of the run is clipped so that it never
/// overflows the bar. Returns `None` for an empty run.
pub fn multi_block_segment(partition: &Partition, blocks: &[MemoryBlock]) -> Option<Segment> {
    let start = blocks.first()?.address_start.0;
    let end = blocks.last()?.address_end.0;

    let offset = partition_offset(partition, start, end);
    let mut width = multi_block_partition_width(partition, start, end);
    if width == 100.0 && offset > 0.0 {
        width -= offset;
    }
    Some(Segment {
        offset,
        width,
        radius: border_radius(offset, width),
    })
}

/// Returns `true` when the partition's segment reaches the right end of the run.
pub fn reaches_end(partition: &Partition, blocks: &[MemoryBlock]) -> bool {
    multi_block_segment(partition, blocks).is_some_and(|s| s.offset + s.width >= 100.0)
}

/// Returns `true` when the partition's segment starts at the left end of the run.
pub fn starts_at_origin(partition: &Partition, blocks: &[MemoryBlock]) -> bool {
    multi_block_segment(partition, blocks).is_some_and(|s| s.offset == 0.0)
}

/// Partitions drawn on a run of blocks: those sharing the first block's type.
pub fn partitions_of_type<'p>(blocks: &[MemoryBlock], partitions: &'p [Partition]) -> Vec<&'p Partition> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    partitions
        .iter()
        .filter(|p| p.mem_type == first.mem_type)
        .collect()
}

/// Unoccupied stretches of `block`, after merging overlapping partitions.
pub fn free_gaps(block: &MemoryBlock, partitions: &[Partition]) -> Vec<Gap> {
    let start = block.address_start.0;
    let end = block.address_end.0;
    let span = end - start;

    let mut covered: Vec<(u64, u64)> = partitions
        .iter()
        .filter_map(Partition::range)
        .filter(|&(s, e)| s <= end && e >= start)
        .map(|(s, e)| (s.max(start), e.min(end)))
        .collect();
    covered.sort_by_key(|&(s, _)| s);

    // Inclusive bounds; touching ranges merge.
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(covered.len());
    for (s, e) in covered {
        match merged.last_mut() {
            Some(last) if s <= last.1.saturating_add(1) => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }

    let gap = |from: u64, to: u64| Gap {
        address: Addr(from),
        end_address: Addr(to),
        offset: percent(from - start, span),
        width: percent(to - from, span),
    };

    let mut gaps = Vec::new();
    let mut cursor = Some(start);
    for (s, e) in merged {
        if let Some(free) = cursor.filter(|&c| c < s) {
            gaps.push(gap(free, s - 1));
        }
        cursor = e.checked_add(1);
    }
    if let Some(free) = cursor.filter(|&c| c <= end) {
        gaps.push(gap(free, end));
    }
    gaps
}
