//! Collaborator traits at the topology boundary.
//!
//! The validator never walks SoC data directly; it asks a [`CoreMemoryAccess`]
//! implementation which blocks a core can see and with what permissions. The
//! production implementation is [`Topology`](crate::soc::Topology); tests can
//! substitute a mock.

/// Per-core view of the memory map.
///
/// A core may list the same block as another core with a different access
/// string (a read-only view from a secondary core, for instance), so access is
/// always looked up per `(core, block)` pair.
pub trait CoreMemoryAccess {
    /// Returns the access string `core_id` has on `block`, or `None` if the
    /// core cannot address the block (or the core is unknown).
    fn block_access(&self, core_id: &str, block: &str) -> Option<String>;

    /// Returns a human-readable label for `core_id`, if the core is known.
    fn core_label(&self, core_id: &str) -> Option<String>;

    /// Returns `true` when `core_id` can address `block`.
    fn can_access(&self, core_id: &str, block: &str) -> bool {
        self.block_access(core_id, block).is_some()
    }
}
