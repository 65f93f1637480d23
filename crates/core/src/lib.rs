//! SoC memory partition engine.
//!
//! This crate allocates user-defined partitions inside the memory blocks of a
//! multi-core SoC and checks them against the hardware's constraints:
//! 1. **SoC:** The block/core data model and the immutable [`Topology`] built from it.
//! 2. **Partitions:** The partition model, typed patches, the [`Validator`] and the [`PartitionStore`].
//! 3. **Usage:** Occupancy, free space and first-free-address queries.
//! 4. **Layout:** Percentage geometry for drawing blocks and partitions.
//! 5. **Common:** Addresses, byte units, and error types.
//!
//! ```
//! use std::sync::Arc;
//! use socmap_core::{Config, PartitionStore, SocDescriptor, Topology};
//!
//! let soc = SocDescriptor::from_json(r#"{
//!     "Cores": [{ "Id": "CM4", "Memory": [
//!         { "Name": "sram0", "AddressStart": "0x20000000", "AddressEnd": "0x2000FFFF",
//!           "Access": "R/W", "Type": "RAM" }
//!     ] }]
//! }"#).unwrap();
//! let topology = Topology::from_soc(&soc, &Config::default().topology).unwrap();
//! let mut store = PartitionStore::new(Arc::new(topology));
//! store.open_for_create();
//! assert!(!store.validate_active().unwrap().valid);
//! ```

/// Common types (addresses, byte units, errors).
pub mod common;
/// Engine configuration (defaults and serde-deserialized structures).
pub mod config;
/// Percentage geometry for the occupancy bar.
pub mod layout;
/// Partition model, patches, validation, store and usage queries.
pub mod partition;
/// SoC data model and memory topology.
pub mod soc;

/// Address newtype; hex on the wire, `u64` in memory.
pub use crate::common::Addr;
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Partition record and its editing helpers.
pub use crate::partition::{Partition, PartitionCore, PartitionPatch, PartitionStore, Validation, Validator};
/// SoC inputs and the topology built from them.
pub use crate::soc::{CoreMemoryAccess, MemoryBlock, SocDescriptor, Topology};
