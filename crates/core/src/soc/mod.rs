//! System-on-Chip memory description.
//!
//! This module organizes the inputs the engine receives from the host
//! application and the immutable topology built from them.

/// SoC data model types (blocks, cores, aliases, memory types, projects).
pub mod model;

/// Deduplicated, address-sorted block index and per-core views.
pub mod topology;

/// Collaborator traits at the topology boundary.
pub mod traits;

pub use model::{CoreDescriptor, CoreMemory, MemoryAliasRef, MemoryBlock, MemoryType, ProjectInfo, SocDescriptor};
pub use topology::{CoreAlias, CoreView, Topology};
pub use traits::CoreMemoryAccess;
