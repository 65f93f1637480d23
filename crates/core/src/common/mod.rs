//! Common utilities and types shared by every part of the engine.
//!
//! This module provides the fundamental building blocks for the topology,
//! validator and store. It includes:
//! 1. **Address Types:** The `Addr` newtype, hex conversion and range arithmetic.
//! 2. **Units:** Byte units and the human-readable size formatting used in reports.
//! 3. **Error Handling:** Structural error types for parsing, topology and store transitions.

/// Address type and range arithmetic.
pub mod addr;

/// Error types for parsing, topology construction and store transitions.
pub mod error;

/// Byte units and size formatting.
pub mod units;

pub use addr::{Addr, end_address, ranges_overlap, to_hex};
pub use error::{ParseAddrError, StoreError, StoreResult, TopologyError};
pub use units::{ByteUnit, convert_units};
