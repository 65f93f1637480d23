//! Partition validation.
//!
//! This module checks a candidate partition against its siblings and the
//! blocks of its memory type. It provides:
//! 1. **Field errors:** A closed set of user-facing messages, at most one per field.
//! 2. **Rule evaluation:** Six independent field checks; within a field the first failing rule wins.
//! 3. **Access lookups:** Core-to-block permissions come from a [`CoreMemoryAccess`] collaborator.
//!
//! Validation never fails with `Err`: a rejected partition is a [`Validation`]
//! whose `errors` name the offending fields.

use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use super::Partition;
use crate::common::addr::{end_address, ranges_overlap};
use crate::common::units::min_alignment_label;
use crate::soc::topology::block_containing;
use crate::soc::{CoreMemoryAccess, MemoryBlock};

/// A single rule violation, rendered as the message shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The memory type is empty.
    #[error("Type is required")]
    TypeRequired,
    /// No block has the partition's memory type.
    #[error("No valid memory blocks for this type")]
    NoBlocksForType,
    /// The trimmed name is empty.
    #[error("Partition name is required")]
    NameRequired,
    /// The name starts with something other than a letter or underscore.
    #[error("Partition name must start with a letter or underscore")]
    NameBadStart,
    /// The name contains a character outside `[A-Za-z0-9_]`.
    #[error("Partition name can only contain letters, numbers and underscores")]
    NameBadChars,
    /// Another partition has the same name, ignoring case.
    #[error("Partition name must be unique (case-insensitive)")]
    NameTaken,
    /// No project is assigned.
    #[error("Cores are required")]
    CoresRequired,
    /// No assigned project is marked owner.
    #[error("One core must be an owner")]
    OwnerRequired,
    /// No block of the type is reachable by every assigned core.
    #[error("No valid memory blocks for the selected cores")]
    NoSharedBlock,
    /// The start address is missing.
    #[error("Address is required")]
    AddressRequired,
    /// The start address is not a multiple of the first block's alignment.
    #[error("Address must be aligned to the block minimum alignment of {0}")]
    AddressMisaligned(String),
    /// Some assigned core cannot reach the block containing the start address.
    #[error("Core does not have access to this memory block")]
    AddressNoAccess,
    /// The start address lies outside the type's address range.
    #[error("Address is out of range for memory type")]
    AddressOutOfRange,
    /// The start address lies inside another partition.
    #[error("Address overlaps with another partition")]
    AddressOverlaps,
    /// The size is zero.
    #[error("Size must be greater than 0")]
    SizeRequired,
    /// The end address lies past the type's last block.
    #[error("Size exceeds memory block range")]
    SizeOutOfRange,
    /// The range reaches into another partition.
    #[error("Size extends into existing partition")]
    SizeOverlaps,
    /// The size is not a multiple of the last block's alignment.
    #[error("Size must be aligned to the block minimum alignment of {0}")]
    SizeMisaligned(String),
    /// The labelled core cannot reach every spanned block.
    #[error("Core {0} does not have access to all memory blocks.")]
    CoreMissingBlocks(String),
    /// A core's requested access exceeds what a spanned block grants it.
    #[error("Core permissions do not match memory block permissions")]
    PermissionMismatch,
}

/// The fields a [`FieldError`] can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `displayName`
    DisplayName,
    /// `type`
    Type,
    /// `cores`
    Cores,
    /// `blocks`
    Blocks,
    /// `startAddress`
    StartAddress,
    /// `size`
    Size,
}

impl Field {
    /// All fields, in report order.
    pub const ALL: [Self; 6] = [
        Self::DisplayName,
        Self::Type,
        Self::Cores,
        Self::Blocks,
        Self::StartAddress,
        Self::Size,
    ];

    /// Key used in the serialized error map.
    pub const fn label(self) -> &'static str {
        match self {
            Self::DisplayName => "displayName",
            Self::Type => "type",
            Self::Cores => "cores",
            Self::Blocks => "blocks",
            Self::StartAddress => "startAddress",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-field validation outcome; `None` means the field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    /// Name errors.
    pub display_name: Option<FieldError>,
    /// Memory type errors.
    pub mem_type: Option<FieldError>,
    /// Core assignment errors.
    pub cores: Option<FieldError>,
    /// Shared-block errors.
    pub blocks: Option<FieldError>,
    /// Start address errors.
    pub start_address: Option<FieldError>,
    /// Size errors.
    pub size: Option<FieldError>,
}

impl FieldErrors {
    /// Error recorded for `field`.
    pub const fn get(&self, field: Field) -> Option<&FieldError> {
        match field {
            Field::DisplayName => self.display_name.as_ref(),
            Field::Type => self.mem_type.as_ref(),
            Field::Cores => self.cores.as_ref(),
            Field::Blocks => self.blocks.as_ref(),
            Field::StartAddress => self.start_address.as_ref(),
            Field::Size => self.size.as_ref(),
        }
    }

    /// Iterates over the failing fields in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|e| (field, e)))
    }

    /// Returns `true` when every field passed.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

/// Serialized as the form-error map: every field present, `""` when it passed.
impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_struct("FieldErrors", Field::ALL.len())?;
        for field in Field::ALL {
            let message = self.get(field).map(ToString::to_string).unwrap_or_default();
            map.serialize_field(field.label(), &message)?;
        }
        map.end()
    }
}

/// Result of validating one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Validation {
    /// `true` when no field reported an error.
    pub valid: bool,
    /// Per-field errors.
    pub errors: FieldErrors,
}

impl From<FieldErrors> for Validation {
    fn from(errors: FieldErrors) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates partitions against a per-core memory view.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a, A: CoreMemoryAccess + ?Sized> {
    access: &'a A,
}

impl<'a, A: CoreMemoryAccess + ?Sized> Validator<'a, A> {
    /// Creates a validator reading core access from `access`.
    pub const fn new(access: &'a A) -> Self {
        Self { access }
    }

    /// Validates `candidate` against `others` (its siblings, never itself)
    /// and the address-sorted blocks of its memory type.
    pub fn validate(&self, candidate: &Partition, others: &[Partition], blocks_for_type: &[MemoryBlock]) -> Validation {
        FieldErrors {
            display_name: check_name(candidate, others),
            mem_type: check_type(candidate, blocks_for_type),
            cores: check_cores(candidate),
            blocks: self.check_shared_block(candidate, blocks_for_type),
            start_address: self.check_address(candidate, others, blocks_for_type),
            size: self.check_size(candidate, others, blocks_for_type),
        }
        .into()
    }

    fn all_cores_reach(&self, candidate: &Partition, block: &str) -> bool {
        candidate
            .projects
            .iter()
            .all(|p| self.access.can_access(&p.core_id, block))
    }

    fn check_shared_block(&self, candidate: &Partition, blocks_for_type: &[MemoryBlock]) -> Option<FieldError> {
        if candidate.projects.is_empty() || candidate.mem_type.is_empty() {
            return None;
        }
        let shared = blocks_for_type
            .iter()
            .any(|b| self.all_cores_reach(candidate, &b.name));
        (!shared).then_some(FieldError::NoSharedBlock)
    }

    fn check_address(
        &self,
        candidate: &Partition,
        others: &[Partition],
        blocks_for_type: &[MemoryBlock],
    ) -> Option<FieldError> {
        let (Some(first), Some(last)) = (blocks_for_type.first(), blocks_for_type.last()) else {
            return Some(FieldError::NoBlocksForType);
        };
        let Some(addr) = candidate.start_address else {
            return Some(FieldError::AddressRequired);
        };

        if let Some(block) = named_block(blocks_for_type, candidate.block_names.first())
            && let Some(alignment) = block.alignment()
            && !addr.is_aligned(alignment)
        {
            return Some(FieldError::AddressMisaligned(min_alignment_label(alignment)));
        }

        if let Some(base) = block_containing(blocks_for_type, addr)
            && !candidate.projects.is_empty()
            && !self.all_cores_reach(candidate, &base.name)
        {
            return Some(FieldError::AddressNoAccess);
        }

        if addr < first.address_start || addr > last.address_end {
            return Some(FieldError::AddressOutOfRange);
        }

        let occupied = others.iter().any(|p| {
            p.range()
                .is_some_and(|(start, end)| ranges_overlap(start, end, addr.0, addr.0))
        });
        occupied.then_some(FieldError::AddressOverlaps)
    }

    fn check_size(
        &self,
        candidate: &Partition,
        others: &[Partition],
        blocks_for_type: &[MemoryBlock],
    ) -> Option<FieldError> {
        if candidate.size == 0 {
            return Some(FieldError::SizeRequired);
        }

        if let Some(start) = candidate.start_address {
            let end = end_address(start.0, candidate.size);

            if !candidate.mem_type.is_empty()
                && let Some(last) = blocks_for_type.last()
                && end.is_none_or(|end| end > last.address_end.0)
            {
                return Some(FieldError::SizeOutOfRange);
            }

            if let Some(end) = end {
                let collides = others.iter().any(|p| {
                    p.range()
                        .is_some_and(|(s, e)| ranges_overlap(s, e, start.0, end))
                });
                if collides {
                    return Some(FieldError::SizeOverlaps);
                }
            }
        }

        if let Some(block) = named_block(blocks_for_type, candidate.block_names.last())
            && let Some(alignment) = block.alignment()
            && candidate.size % alignment != 0
        {
            return Some(FieldError::SizeMisaligned(min_alignment_label(alignment)));
        }

        self.check_core_permissions(candidate)
    }

    fn check_core_permissions(&self, candidate: &Partition) -> Option<FieldError> {
        for project in &candidate.projects {
            let core = project.core_id.as_str();
            let reaches_all = candidate
                .block_names
                .iter()
                .all(|b| self.access.can_access(core, b));
            if !reaches_all {
                let label = self
                    .access
                    .core_label(core)
                    .unwrap_or_else(|| core.to_string());
                return Some(FieldError::CoreMissingBlocks(label));
            }

            let permitted = candidate
                .block_names
                .iter()
                .filter_map(|b| self.access.block_access(core, b))
                .all(|granted| project.access.permitted_by(&granted));
            if !permitted {
                return Some(FieldError::PermissionMismatch);
            }
        }
        None
    }
}

fn named_block<'b>(blocks: &'b [MemoryBlock], name: Option<&String>) -> Option<&'b MemoryBlock> {
    let name = name?;
    blocks.iter().find(|b| &b.name == name)
}

fn check_type(candidate: &Partition, blocks_for_type: &[MemoryBlock]) -> Option<FieldError> {
    if candidate.mem_type.is_empty() {
        Some(FieldError::TypeRequired)
    } else if blocks_for_type.is_empty() {
        Some(FieldError::NoBlocksForType)
    } else {
        None
    }
}

fn check_name(candidate: &Partition, others: &[Partition]) -> Option<FieldError> {
    let name = candidate.display_name.as_str();
    if name.trim().is_empty() {
        return Some(FieldError::NameRequired);
    }

    let mut chars = name.chars();
    if !chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    {
        return Some(FieldError::NameBadStart);
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some(FieldError::NameBadChars);
    }

    let key = candidate.name_key();
    others
        .iter()
        .any(|p| p.name_key() == key)
        .then_some(FieldError::NameTaken)
}

fn check_cores(candidate: &Partition) -> Option<FieldError> {
    if candidate.projects.is_empty() {
        Some(FieldError::CoresRequired)
    } else if !candidate.has_owner() {
        Some(FieldError::OwnerRequired)
    } else {
        None
    }
}
