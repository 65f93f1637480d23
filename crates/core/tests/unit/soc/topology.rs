//! # Memory Topology Tests
//!
//! This module verifies construction of the block index from per-core memory
//! lists: deduplication, ordering, contiguity checks, per-core views, alias
//! windows, and the lookups the validator depends on.

use pretty_assertions::assert_eq;
use socmap_core::common::TopologyError;
use socmap_core::config::TopologyConfig;
use socmap_core::partition::Access;
use socmap_core::soc::{CoreDescriptor, CoreMemory, ProjectInfo};
use socmap_core::{Addr, CoreMemoryAccess, Topology};

use crate::common::fixtures::{block, core, topology};

fn descriptor(id: &str, blocks: Vec<socmap_core::MemoryBlock>) -> CoreDescriptor {
    CoreDescriptor {
        id: id.to_string(),
        description: String::new(),
        memory: blocks.into_iter().map(CoreMemory::Block).collect(),
    }
}

// ══════════════════════════════════════════════════════════
// Construction
// ══════════════════════════════════════════════════════════

/// A block listed by two cores is indexed once, and blocks come out sorted.
#[test]
fn blocks_are_deduplicated_and_sorted() {
    let topo = topology();
    let names: Vec<&str> = topo.blocks().iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["flash0", "flash1", "sram0", "sram1"]);
}

/// The first listing of a block wins over later ones.
#[test]
fn first_listing_wins() {
    let mut narrowed = block("ram0", 0x2000_0000, 0x2000_0FFF, "RAM");
    narrowed.access = "R".to_string();
    let cores = [
        descriptor("A", vec![block("ram0", 0x2000_0000, 0x2000_FFFF, "RAM")]),
        descriptor("B", vec![narrowed]),
    ];
    let topo = Topology::build(&cores, Vec::new(), &TopologyConfig::default()).unwrap();
    assert_eq!(topo.block("ram0").unwrap().address_end, Addr(0x2000_FFFF));
    // Each core still keeps its own view.
    assert_eq!(topo.block_access("B", "ram0").as_deref(), Some("R"));
    assert_eq!(topo.block_access("A", "ram0").as_deref(), Some("R/W"));
}

/// Inverted bounds are rejected.
#[test]
fn inverted_range_is_error() {
    let cores = [descriptor("A", vec![block("bad", 0x2000_0000, 0x1000_0000, "RAM")])];
    let err = Topology::build(&cores, Vec::new(), &TopologyConfig::default()).unwrap_err();
    assert!(matches!(err, TopologyError::InvertedRange { ref name, .. } if name == "bad"));
}

/// Same-type blocks that overlap are rejected when contiguity is required.
#[test]
fn overlap_is_error_when_strict() {
    let cores = [descriptor(
        "A",
        vec![
            block("ram0", 0x2000_0000, 0x2000_FFFF, "RAM"),
            block("ram1", 0x2000_8000, 0x2001_FFFF, "RAM"),
        ],
    )];
    let err = Topology::build(&cores, Vec::new(), &TopologyConfig::default()).unwrap_err();
    assert_eq!(
        err,
        TopologyError::Overlap {
            mem_type: "RAM".to_string(),
            previous: "ram0".to_string(),
            next: "ram1".to_string(),
        }
    );
}

// ══════════════════════════════════════════════════════════
// Lookups
// ══════════════════════════════════════════════════════════

/// Blocks per type are sorted and empty for an unknown type.
#[test]
fn blocks_for_type() {
    let topo = topology();
    let flash: Vec<&str> = topo.blocks_for_type("Flash").iter().map(|b| b.name.as_str()).collect();
    assert_eq!(flash, vec!["flash0", "flash1"]);
    assert!(topo.blocks_for_type("EEPROM").is_empty());
}

/// Name lookups come back in address order and skip unknown names.
#[test]
fn blocks_named_in_address_order() {
    let topo = topology();
    let found: Vec<&str> = topo
        .blocks_named(&["sram1", "bogus", "flash0"])
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(found, vec!["flash0", "sram1"]);

    let partition_blocks = vec!["sram0".to_string(), "sram1".to_string()];
    assert_eq!(topo.blocks_named(&partition_blocks).len(), 2);
    assert!(topo.blocks_named::<&str>(&[]).is_empty());
}

/// Containment and span queries return absence rather than errors.
#[test]
fn containing_and_spanned_blocks() {
    let topo = topology();
    assert_eq!(topo.find_block_containing(Addr(0x1001_0000)).map(|b| b.name.as_str()), Some("flash1"));
    assert!(topo.find_block_containing(Addr(0x0)).is_none());
    assert_eq!(topo.blocks_spanned(Addr(0x1000_F000), 0x2000), vec!["flash0", "flash1"]);
    assert_eq!(topo.blocks_spanned(Addr(0x1000_F000), 0x1000), vec!["flash0"]);
    assert!(topo.blocks_spanned(Addr(0x5000_0000), 0x10).is_empty());
}

/// Volatility comes from the memory type table.
#[test]
fn volatility_lookup() {
    let topo = topology();
    assert_eq!(topo.is_volatile("RAM"), Some(true));
    assert_eq!(topo.is_volatile("Flash"), Some(false));
    assert_eq!(topo.is_volatile("EEPROM"), None);
}

/// Core labels fall back to the id; unknown cores have no access.
#[test]
fn core_access_view() {
    let topo = topology();
    assert_eq!(topo.core_label("CM4").as_deref(), Some("ARM Cortex-M4"));
    assert_eq!(topo.core_label("DSP"), None);
    assert!(topo.can_access("RV", "flash0"));
    assert!(!topo.can_access("RV", "flash1"));
    assert!(!topo.can_access("DSP", "flash0"));
}

/// A block is disabled when any assigned core cannot reach it.
#[test]
fn block_disabled_for_core_set() {
    let topo = topology();
    let flash1 = topo.block("flash1").unwrap();
    let flash0 = topo.block("flash0").unwrap();
    let both = [core("CM4", Access::Read, true), core("RV", Access::Read, false)];
    assert!(topo.is_block_disabled(flash1, &both, "Flash"));
    assert!(!topo.is_block_disabled(flash0, &both, "Flash"));
    assert!(topo.is_block_disabled(flash0, &both, "RAM"));
    assert!(!topo.is_block_disabled(flash1, &[], "Flash"));
}

/// Projects are assignable when their core reaches the type at all.
#[test]
fn assignable_cores_filter() {
    let topo = topology();
    let projects = vec![
        ProjectInfo {
            project_id: "cm4-app".to_string(),
            core_id: "CM4".to_string(),
            description: String::new(),
            secure: Some(true),
        },
        ProjectInfo {
            project_id: "dsp-app".to_string(),
            core_id: "DSP".to_string(),
            description: String::new(),
            secure: None,
        },
    ];
    let ids: Vec<&str> = topo
        .assignable_cores(&projects, "RAM")
        .iter()
        .map(|p| p.project_id.as_str())
        .collect();
    assert_eq!(ids, vec!["cm4-app"]);
}

/// Alias windows are found per listing core and translate block offsets.
#[test]
fn alias_windows() {
    let topo = topology();
    let aliases = topo.aliases_for("sram0", &["CM4", "RV"]);
    assert_eq!(aliases.len(), 1);
    assert_eq!(aliases[0].alias_type, "Secure");
    assert_eq!(
        aliases[0].translate(Addr(0x2000_0000), Addr(0x2000_0400)),
        Some(Addr(0x3000_0400))
    );
    assert!(topo.aliases_for("sram0", &["RV"]).is_empty());
    assert!(topo.aliases_for("sram0", &[]).is_empty());
}
