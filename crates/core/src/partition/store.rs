//! Partition store.
//!
//! The store owns the committed partition list and at most one draft. All
//! mutation of the list goes through a transition on [`PartitionStore`]:
//! 1. **Open:** `open_for_create`, `open_for_create_in_block` or `open_for_edit` start a draft.
//! 2. **Edit:** `update_active` and the narrower helpers change the draft; nothing is validated yet.
//! 3. **Commit:** `commit_create` and `commit_edit` validate and apply in one call.
//! 4. **Close:** `cancel` drops the draft; `remove` deletes a committed partition directly.
//!
//! A commit that fails validation leaves both the list and the draft untouched.

use std::sync::Arc;

use tracing::{debug, info};

use super::usage::first_available_address;
use super::validate::{Validation, Validator};
use super::{Partition, PartitionCore, PartitionPatch};
use crate::common::Addr;
use crate::common::error::{StoreError, StoreResult};
use crate::soc::Topology;
use crate::soc::topology::{block_containing, spanned_block_names};

/// Editing lifecycle of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditSession {
    /// No draft; the sidebar is minimised.
    #[default]
    Closed,
    /// Drafting a new partition.
    Creating(Partition),
    /// Drafting changes to the committed partition that started at `original_start`.
    Editing {
        /// Start address of the partition when it was opened.
        original_start: Addr,
        /// The working copy.
        draft: Partition,
    },
}

impl EditSession {
    /// The draft, when one is open.
    pub const fn draft(&self) -> Option<&Partition> {
        match self {
            Self::Closed => None,
            Self::Creating(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }

    fn draft_mut(&mut self) -> Option<&mut Partition> {
        match self {
            Self::Closed => None,
            Self::Creating(draft) | Self::Editing { draft, .. } => Some(draft),
        }
    }

    /// Returns `true` while a draft is open.
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// The authoritative partition list plus the draft being edited.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    topology: Arc<Topology>,
    partitions: Vec<Partition>,
    session: EditSession,
}

impl PartitionStore {
    /// Creates an empty store over `topology`.
    pub const fn new(topology: Arc<Topology>) -> Self {
        Self::with_partitions(topology, Vec::new())
    }

    /// Creates a store holding previously persisted partitions.
    ///
    /// The list is trusted as-is; it is not re-validated.
    pub const fn with_partitions(topology: Arc<Topology>, partitions: Vec<Partition>) -> Self {
        Self {
            topology,
            partitions,
            session: EditSession::Closed,
        }
    }

    /// The shared topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Committed partitions, in commit order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Consumes the store, returning the committed list.
    pub fn into_partitions(self) -> Vec<Partition> {
        self.partitions
    }

    /// Current editing session.
    pub const fn session(&self) -> &EditSession {
        &self.session
    }

    /// The open draft, if any.
    pub const fn active(&self) -> Option<&Partition> {
        self.session.draft()
    }

    /// Committed partition starting at `start`.
    pub fn find(&self, start: Addr) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.starts_at(start))
    }

    /// Opens a blank draft.
    pub fn open_for_create(&mut self) {
        debug!("opening blank partition draft");
        self.session = EditSession::Creating(Partition::default());
    }

    /// Opens a draft typed after `block_name` and placed at its first free address.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownBlock`] if the block is not in the topology.
    pub fn open_for_create_in_block(&mut self, block_name: &str) -> StoreResult<()> {
        let block = self
            .topology
            .block(block_name)
            .ok_or_else(|| StoreError::UnknownBlock(block_name.to_string()))?;
        let start = first_available_address(block, &self.partitions);

        debug!(block = %block.name, start = %start, "opening partition draft in block");
        self.session = EditSession::Creating(Partition {
            mem_type: block.mem_type.clone(),
            base_block: Some(block.clone()),
            start_address: Some(start),
            ..Partition::default()
        });
        Ok(())
    }

    /// Opens a copy of the committed partition starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no partition starts there.
    pub fn open_for_edit(&mut self, start: Addr) -> StoreResult<()> {
        let draft = self.find(start).cloned().ok_or(StoreError::NotFound(start))?;
        debug!(name = %draft.display_name, start = %start, "opening partition for edit");
        self.session = EditSession::Editing {
            original_start: start,
            draft,
        };
        Ok(())
    }

    /// Replaces every field `patch` names on the draft.
    ///
    /// When the patch moves or resizes the draft without setting the block
    /// fields itself, `base_block` and `block_names` are derived again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] if no draft is open.
    pub fn update_active(&mut self, patch: PartitionPatch) -> StoreResult<()> {
        let rederive = patch.changes_placement() && !patch.sets_blocks();
        let topology = Arc::clone(&self.topology);
        let draft = self
            .session
            .draft_mut()
            .ok_or(StoreError::NoActivePartition)?;
        patch.apply(draft);
        if rederive {
            derive_placement(&topology, draft);
        }
        Ok(())
    }

    /// Changes the draft's memory type, clearing everything that depended on the old one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] if no draft is open.
    pub fn change_active_type(&mut self, mem_type: &str) -> StoreResult<()> {
        let draft = self
            .session
            .draft_mut()
            .ok_or(StoreError::NoActivePartition)?;
        *draft = Partition {
            display_name: std::mem::take(&mut draft.display_name),
            mem_type: mem_type.to_string(),
            display_unit: draft.display_unit,
            ..Partition::default()
        };
        Ok(())
    }

    /// Assigns the draft's cores; a single core becomes the owner.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] if no draft is open.
    pub fn assign_active_cores(&mut self, mut cores: Vec<PartitionCore>) -> StoreResult<()> {
        if let [only] = cores.as_mut_slice() {
            only.owner = true;
        }
        self.update_active(PartitionPatch::new().projects(cores))
    }

    /// Moves the draft to the first free address of `block_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownBlock`] for a block outside the topology
    /// and [`StoreError::NoActivePartition`] if no draft is open.
    pub fn select_active_block(&mut self, block_name: &str) -> StoreResult<()> {
        let block = self
            .topology
            .block(block_name)
            .ok_or_else(|| StoreError::UnknownBlock(block_name.to_string()))?;
        let start = first_available_address(block, &self.partitions);
        let draft = self.session.draft().ok_or(StoreError::NoActivePartition)?;
        let block_names = spanned_block_names(self.topology.blocks_for_type(&draft.mem_type), start, draft.size);

        let patch = PartitionPatch::new()
            .base_block(Some(block.clone()))
            .start_address(Some(start))
            .block_names(block_names);
        self.update_active(patch)
    }

    /// Validates the draft against the partitions it would sit beside.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] if no draft is open.
    pub fn validate_active(&self) -> StoreResult<Validation> {
        let draft = self.session.draft().ok_or(StoreError::NoActivePartition)?;
        let siblings = match &self.session {
            EditSession::Editing { original_start, .. } => self.siblings_of(*original_start),
            _ => self.partitions.clone(),
        };
        Ok(self.validate(draft, &siblings))
    }

    /// Validates the draft against every committed partition and appends it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] if no draft is open and
    /// [`StoreError::Invalid`] if the draft fails validation.
    pub fn commit_create(&mut self) -> StoreResult<()> {
        let draft = self.session.draft().ok_or(StoreError::NoActivePartition)?;
        let validation = self.validate(draft, &self.partitions);
        if !validation.valid {
            debug!(errors = %validation.errors, "partition create rejected");
            return Err(StoreError::Invalid(validation.errors));
        }

        let draft = draft.clone();
        info!(name = %draft.display_name, start = ?draft.start_address, size = draft.size, "partition created");
        self.partitions.push(draft);
        self.session = EditSession::Closed;
        Ok(())
    }

    /// Validates the draft against every other partition and replaces the one
    /// that started at `original_start`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActivePartition`] unless a partition was opened
    /// with [`open_for_edit`](Self::open_for_edit),
    /// [`StoreError::EditMismatch`] if `original_start` is not the address it
    /// was opened at, [`StoreError::NotFound`] if that partition is gone, and
    /// [`StoreError::Invalid`] if the draft fails validation.
    pub fn commit_edit(&mut self, original_start: Addr) -> StoreResult<()> {
        let EditSession::Editing { original_start: opened, draft } = &self.session else {
            debug!(requested = %original_start, "edit commit without an open edit");
            return Err(StoreError::NoActivePartition);
        };
        if *opened != original_start {
            return Err(StoreError::EditMismatch { opened: *opened, requested: original_start });
        }
        let index = self
            .partitions
            .iter()
            .position(|p| p.starts_at(original_start))
            .ok_or(StoreError::NotFound(original_start))?;

        let siblings = self.siblings_of(original_start);
        let validation = self.validate(draft, &siblings);
        if !validation.valid {
            debug!(errors = %validation.errors, "partition edit rejected");
            return Err(StoreError::Invalid(validation.errors));
        }

        let draft = draft.clone();
        info!(name = %draft.display_name, from = %original_start, to = ?draft.start_address, "partition updated");
        self.partitions[index] = draft;
        self.session = EditSession::Closed;
        Ok(())
    }

    /// Deletes the committed partition starting at `start`.
    pub fn remove(&mut self, start: Addr) -> Option<Partition> {
        let index = self.partitions.iter().position(|p| p.starts_at(start))?;
        let removed = self.partitions.remove(index);
        info!(name = %removed.display_name, start = %start, "partition removed");
        Some(removed)
    }

    /// Drops the draft without touching the committed list.
    pub fn cancel(&mut self) {
        if self.session.is_open() {
            debug!("partition draft discarded");
        }
        self.session = EditSession::Closed;
    }

    fn siblings_of(&self, original_start: Addr) -> Vec<Partition> {
        self.partitions
            .iter()
            .filter(|p| !p.starts_at(original_start))
            .cloned()
            .collect()
    }

    fn validate(&self, draft: &Partition, siblings: &[Partition]) -> Validation {
        Validator::new(self.topology.as_ref()).validate(
            draft,
            siblings,
            self.topology.blocks_for_type(&draft.mem_type),
        )
    }
}

/// Recomputes `base_block` and `block_names` from address, size and type.
///
/// When the address is missing or falls in a block some assigned core cannot
/// use, the base block is kept and the spanned list is cleared.
fn derive_placement(topology: &Topology, draft: &mut Partition) {
    let blocks = topology.blocks_for_type(&draft.mem_type);
    let usable = draft.start_address.and_then(|addr| {
        block_containing(blocks, addr)
            .filter(|b| !topology.is_block_disabled(b, &draft.projects, &draft.mem_type))
            .map(|b| (addr, b))
    });

    match usable {
        Some((addr, block)) => {
            draft.base_block = Some(block.clone());
            draft.block_names = spanned_block_names(blocks, addr, draft.size);
        }
        None => draft.block_names.clear(),
    }
}
