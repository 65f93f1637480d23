//! # End-to-End Validation Scenarios
//!
//! Partitions decoded from their persisted JSON form and validated against
//! the reference SoC, as the form would submit them.

use pretty_assertions::assert_eq;
use socmap_core::partition::partitions_from_json;
use socmap_core::partition::{Access, FieldError, FieldErrors, Validation};
use socmap_core::{Partition, PartitionStore, Topology, Validator};

use crate::common::fixtures::{PartitionBuilder, core, init_tracing, topology, unaligned_topology};

fn validate(topology: &Topology, candidate: &Partition, others: &[Partition]) -> Validation {
    Validator::new(topology).validate(candidate, others, topology.blocks_for_type(&candidate.mem_type))
}

fn decode_one(json: &str) -> Partition {
    partitions_from_json(&format!("[{json}]")).unwrap().remove(0)
}

/// An aligned flash partition owned by a read-only core passes every rule.
#[test]
fn aligned_flash_partition_is_valid() {
    let topo = topology();
    let candidate = decode_one(
        r#"{
            "displayName": "boot",
            "type": "Flash",
            "blockNames": ["flash0"],
            "startAddress": "0x10000000",
            "size": 8192,
            "projects": [{ "projectId": "RV-app", "coreId": "RV", "access": "R", "owner": true }]
        }"#,
    );

    let result = validate(&topo, &candidate, &[]);
    assert_eq!(result, Validation::from(FieldErrors::default()));
    assert!(result.valid);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["errors"]["startAddress"], "");
}

/// A misaligned address and size each report the block's alignment.
#[test]
fn misaligned_address_and_size() {
    let topo = topology();
    let candidate = PartitionBuilder::new("blob", "Flash")
        .at(&topo, 0x1030_000F, 100)
        .core(core("CM4", Access::Read, true))
        .build();

    let result = validate(&topo, &candidate, &[]);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(
        result.errors.start_address.as_ref().map(ToString::to_string).as_deref(),
        Some("Address must be aligned to the block minimum alignment of 8 KB")
    );
    assert_eq!(
        result.errors.size.as_ref().map(ToString::to_string).as_deref(),
        Some("Size must be aligned to the block minimum alignment of 8 KB")
    );
}

/// A candidate starting inside an existing partition reports both overlaps.
#[test]
fn overlapping_candidate_reports_address_and_size() {
    let topo = unaligned_topology();
    let existing = PartitionBuilder::new("small", "Flash")
        .at(&topo, 0x1000_00F0, 10)
        .core(core("CM4", Access::Read, true))
        .build();
    assert_eq!(existing.range(), Some((0x1000_00F0, 0x1000_00F9)));

    let candidate = PartitionBuilder::new("large", "Flash")
        .at(&topo, 0x1000_00F5, 16384)
        .core(core("CM4", Access::Read, true))
        .build();

    let result = validate(&topo, &candidate, &[existing]);
    assert_eq!(result.errors.start_address, Some(FieldError::AddressOverlaps));
    assert_eq!(result.errors.size, Some(FieldError::SizeOverlaps));
    assert_eq!(
        serde_json::to_value(&result.errors).unwrap()["size"],
        "Size extends into existing partition"
    );
}

/// Validation is a pure function of its inputs.
#[test]
fn validation_is_idempotent() {
    init_tracing();
    let topo = topology();
    let existing = PartitionBuilder::new("heap", "RAM")
        .at(&topo, 0x2000_0000, 0x1000)
        .core(core("CM4", Access::ReadWrite, true))
        .build();
    let candidate = PartitionBuilder::new("Heap", "RAM")
        .at(&topo, 0x2000_0800, 0x1000)
        .core(core("RV", Access::ReadWriteExecute, false))
        .build();

    let first = validate(&topo, &candidate, std::slice::from_ref(&existing));
    let second = validate(&topo, &candidate, std::slice::from_ref(&existing));
    assert_eq!(first, second);
    assert!(!first.valid);

    let mut store = PartitionStore::with_partitions(topo, vec![existing]);
    store.open_for_create();
    store.change_active_type("RAM").unwrap();
    assert_eq!(store.validate_active().unwrap(), store.validate_active().unwrap());
}
