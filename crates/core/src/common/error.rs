//! Error types for the partition engine.
//!
//! Validation failures are not errors: they are returned as data in
//! [`FieldErrors`](crate::partition::FieldErrors). The types here cover the
//! structural failures that remain:
//! 1. **Parsing:** Hex addresses that cannot be read.
//! 2. **Topology:** SoC descriptions that violate the block invariants.
//! 3. **Store:** State-machine transitions that cannot be applied.

use thiserror::Error;

use super::addr::Addr;
use crate::partition::FieldErrors;

/// Failure to parse a hex address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAddrError {
    /// Nothing left after trimming whitespace and the `0x` prefix.
    #[error("address is empty")]
    Empty,

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex address `{0}`")]
    InvalidDigit(String),

    /// More than 16 significant hex digits.
    #[error("hex address `{0}` does not fit in 64 bits")]
    Overflow(String),
}

/// A SoC description that cannot be turned into a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A block whose start lies above its end.
    #[error("memory block `{name}` has start {start} above end {end}")]
    InvertedRange {
        /// Block name.
        name: String,
        /// Declared start address.
        start: Addr,
        /// Declared end address.
        end: Addr,
    },

    /// Two address-adjacent blocks of one type leave unmapped space between them.
    #[error("memory type `{mem_type}` has a gap between `{previous}` and `{next}`")]
    Gap {
        /// Memory type shared by both blocks.
        mem_type: String,
        /// Lower block.
        previous: String,
        /// Upper block.
        next: String,
    },

    /// Two blocks of one type claim the same addresses.
    #[error("memory type `{mem_type}` has overlapping blocks `{previous}` and `{next}`")]
    Overlap {
        /// Memory type shared by both blocks.
        mem_type: String,
        /// Lower block.
        previous: String,
        /// Upper block.
        next: String,
    },

    /// The SoC JSON could not be decoded.
    #[error("invalid SoC description: {0}")]
    Decode(String),
}

/// A partition store transition that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Commit or update requested while no draft is open.
    #[error("no partition is being edited")]
    NoActivePartition,

    /// The draft failed validation; the committed list is unchanged.
    #[error("partition failed validation: {0}")]
    Invalid(FieldErrors),

    /// No committed partition starts at the given address.
    #[error("no partition starts at {0}")]
    NotFound(Addr),

    /// An edit commit named a different partition than the one opened.
    #[error("the open edit is for the partition at {opened}, not {requested}")]
    EditMismatch {
        /// Start address recorded when the edit was opened.
        opened: Addr,
        /// Start address passed to the commit.
        requested: Addr,
    },

    /// The named memory block is not part of the topology.
    #[error("unknown memory block `{0}`")]
    UnknownBlock(String),
}

/// Result alias for store transitions.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
