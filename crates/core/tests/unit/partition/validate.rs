//! # Validation Rule Tests
//!
//! This module exercises the validator one field at a time. Most tests use the
//! reference topology; the access-related tests script the per-core view with
//! a mock so the exact collaborator calls are visible.

use mockall::predicate::{always, eq};
use pretty_assertions::assert_eq;
use rstest::rstest;
use socmap_core::partition::{Access, Field, FieldError};
use socmap_core::{Partition, Validator};

use crate::common::fixtures::{PartitionBuilder, block, core, topology};
use crate::common::mocks::MockCoreAccess;

/// A valid CM4-owned RAM partition of 4 KB at the bottom of `sram0`.
fn ram_partition(name: &str) -> Partition {
    let topo = topology();
    PartitionBuilder::new(name, "RAM")
        .at(&topo, 0x2000_0000, 0x1000)
        .core(core("CM4", Access::ReadWrite, true))
        .build()
}

// ══════════════════════════════════════════════════════════
// Name and type
// ══════════════════════════════════════════════════════════

/// Name rules report the first violation only.
#[rstest]
#[case("", FieldError::NameRequired)]
#[case("   ", FieldError::NameRequired)]
#[case("9lives", FieldError::NameBadStart)]
#[case("-x", FieldError::NameBadStart)]
#[case("boot-loader", FieldError::NameBadChars)]
#[case("app data", FieldError::NameBadChars)]
fn invalid_names(#[case] name: &str, #[case] expected: FieldError) {
    let topo = topology();
    let mut p = ram_partition("x");
    p.display_name = name.to_string();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.display_name, Some(expected));
    assert!(!result.valid);
}

/// Names may start with an underscore and contain digits.
#[test]
fn identifier_names_pass() {
    let topo = topology();
    let p = ram_partition("_shared_2");
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert!(result.valid, "{}", result.errors);
}

/// Uniqueness ignores case and surrounding whitespace.
#[test]
fn duplicate_name_is_case_insensitive() {
    let topo = topology();
    let existing = PartitionBuilder::new("Heap ", "RAM").at(&topo, 0x2001_0000, 0x100).build();
    let p = ram_partition("HEAP");
    let result = Validator::new(topo.as_ref()).validate(&p, &[existing], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.display_name, Some(FieldError::NameTaken));
}

/// A missing type and a type without blocks are distinct errors.
#[test]
fn type_rules() {
    let topo = topology();
    let validator = Validator::new(topo.as_ref());

    let mut p = ram_partition("x");
    p.mem_type = String::new();
    let result = validator.validate(&p, &[], &[]);
    assert_eq!(result.errors.mem_type, Some(FieldError::TypeRequired));

    p.mem_type = "EEPROM".to_string();
    let result = validator.validate(&p, &[], topo.blocks_for_type("EEPROM"));
    assert_eq!(result.errors.mem_type, Some(FieldError::NoBlocksForType));
    assert_eq!(result.errors.start_address, Some(FieldError::NoBlocksForType));
}

// ══════════════════════════════════════════════════════════
// Cores and blocks
// ══════════════════════════════════════════════════════════

/// No cores, then no owner.
#[test]
fn core_rules() {
    let topo = topology();
    let validator = Validator::new(topo.as_ref());
    let blocks = topo.blocks_for_type("RAM");

    let mut p = ram_partition("x");
    p.projects.clear();
    assert_eq!(validator.validate(&p, &[], blocks).errors.cores, Some(FieldError::CoresRequired));

    p.projects = vec![core("CM4", Access::Read, false)];
    assert_eq!(validator.validate(&p, &[], blocks).errors.cores, Some(FieldError::OwnerRequired));
}

/// Blocks must be shared by every assigned core.
#[test]
fn no_shared_block_for_cores() {
    let topo = topology();
    // The RAM type has blocks, but an unknown core sees none of them.
    let p = PartitionBuilder::new("x", "RAM")
        .at(&topo, 0x2000_0000, 0x100)
        .core(core("CM4", Access::Read, true))
        .core(core("DSP", Access::Read, false))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.blocks, Some(FieldError::NoSharedBlock));
    assert_eq!(result.errors.start_address, Some(FieldError::AddressNoAccess));
}

// ══════════════════════════════════════════════════════════
// Start address
// ══════════════════════════════════════════════════════════

/// A missing address is required; a missing size is reported separately.
#[test]
fn missing_address_and_size() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .raw(None, 0)
        .core(core("CM4", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.start_address, Some(FieldError::AddressRequired));
    assert_eq!(result.errors.size, Some(FieldError::SizeRequired));
    assert_eq!(result.errors.iter().map(|(f, _)| f).collect::<Vec<_>>(), vec![Field::StartAddress, Field::Size]);
}

/// Addresses outside the type's span are out of range.
#[rstest]
#[case(0x1FFF_FFFF)]
#[case(0x2004_0000)]
fn address_out_of_range(#[case] addr: u64) {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .raw(Some(addr), 0x10)
        .core(core("CM4", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.start_address, Some(FieldError::AddressOutOfRange));
}

/// An address inside a block the core cannot reach is an access error.
#[test]
fn address_in_unreachable_block() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .at(&topo, 0x2002_0000, 0x100)
        .core(core("RV", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.start_address, Some(FieldError::AddressNoAccess));
    assert_eq!(result.errors.size, Some(FieldError::CoreMissingBlocks("RISC-V".to_string())));
}

/// Adjacent partitions do not overlap.
#[test]
fn adjacent_partitions_are_valid() {
    let topo = topology();
    let below = PartitionBuilder::new("below", "RAM").at(&topo, 0x2000_0000, 0x1000).build();
    let p = PartitionBuilder::new("x", "RAM")
        .at(&topo, 0x2000_1000, 0x1000)
        .core(core("CM4", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[below], topo.blocks_for_type("RAM"));
    assert!(result.valid, "{}", result.errors);
}

// ══════════════════════════════════════════════════════════
// Size
// ══════════════════════════════════════════════════════════

/// A partition running past the last block of its type is rejected.
#[test]
fn size_past_type_end() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .at(&topo, 0x2003_F000, 0x2000)
        .core(core("CM4", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.size, Some(FieldError::SizeOutOfRange));
    assert_eq!(result.errors.start_address, None);
}

/// A range that wraps past the end of the address space is out of range, not a panic.
#[test]
fn size_overflowing_address_space() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .raw(Some(0x2000_0000), u64::MAX)
        .blocks(&["sram0"])
        .core(core("CM4", Access::Read, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert_eq!(result.errors.size, Some(FieldError::SizeOutOfRange));
}

/// A partition may span two blocks when every core reaches both.
#[test]
fn spanning_partition_is_valid() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "RAM")
        .at(&topo, 0x2001_F000, 0x2000)
        .core(core("CM4", Access::ReadWriteExecute, true))
        .build();
    assert_eq!(p.block_names, vec!["sram0", "sram1"]);
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("RAM"));
    assert!(result.valid, "{}", result.errors);
}

/// Requested access beyond the block's grant is a permission mismatch.
#[test]
fn access_exceeding_block_permissions() {
    let topo = topology();
    let p = PartitionBuilder::new("x", "Flash")
        .at(&topo, 0x1000_0000, 0x2000)
        .core(core("RV", Access::ReadWrite, true))
        .build();
    let result = Validator::new(topo.as_ref()).validate(&p, &[], topo.blocks_for_type("Flash"));
    assert_eq!(result.errors.size, Some(FieldError::PermissionMismatch));
}

// ══════════════════════════════════════════════════════════
// Collaborator seam
// ══════════════════════════════════════════════════════════

/// The missing-blocks message names the core by its label.
#[test]
fn missing_blocks_message_uses_core_label() {
    let mut access = MockCoreAccess::new();
    let _ = access
        .expect_block_access()
        .with(eq("M7"), eq("ram1"))
        .returning(|_, _| None);
    let _ = access
        .expect_block_access()
        .with(eq("M7"), always())
        .returning(|_, _| Some("R/W".to_string()));
    let _ = access
        .expect_core_label()
        .with(eq("M7"))
        .times(1)
        .returning(|_| Some("Cortex-M7".to_string()));

    let blocks = [
        block("ram0", 0x2000_0000, 0x2000_FFFF, "RAM"),
        block("ram1", 0x2001_0000, 0x2001_FFFF, "RAM"),
    ];
    let p = PartitionBuilder::new("x", "RAM")
        .raw(Some(0x2000_F000), 0x2000)
        .blocks(&["ram0", "ram1"])
        .core(core("M7", Access::Read, true))
        .build();

    let result = Validator::new(&access).validate(&p, &[], &blocks);
    assert_eq!(
        result.errors.size.as_ref().map(ToString::to_string).as_deref(),
        Some("Core Cortex-M7 does not have access to all memory blocks.")
    );
}

/// With every block granted, only structural rules remain.
#[test]
fn permissive_view_accepts_well_formed_partition() {
    let access = MockCoreAccess::granting("R/W/X");
    let blocks = [block("ram0", 0x2000_0000, 0x2000_FFFF, "RAM")];
    let p = PartitionBuilder::new("x", "RAM")
        .raw(Some(0x2000_0000), 0x100)
        .blocks(&["ram0"])
        .core(core("ANY", Access::ReadWriteExecute, true))
        .build();
    let result = Validator::new(&access).validate(&p, &[], &blocks);
    assert!(result.valid, "{}", result.errors);
}
