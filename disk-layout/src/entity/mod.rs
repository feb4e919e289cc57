// SPDX-License-Identifier: GPL-3.0-only

//! The layout tree
//!
//! A resolved disk image is a tree rooted at a [`PartitionTable`]. Every node
//! is an [`Entity`]; what a node can do is exposed through small capability
//! traits ([`Container`], [`Sizeable`], [`Mountable`], [`VolumeContainer`],
//! [`MetadataProvider`], [`UniqueEntity`]) that algorithms query at runtime
//! through the `as_*` accessors instead of matching on the concrete type.
//!
//! Each node owns its children directly. There are no parent pointers; walks
//! carry the ancestry with them (see [`crate::traverse`]).

mod btrfs;
mod filesystem;
mod luks;
mod lvm;
mod partition;
mod partition_table;

use std::any::Any;
use std::fmt;

use disk_types::FsType;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use btrfs::{Btrfs, BtrfsSubvolume, DEFAULT_BTRFS_COMPRESSION};
pub use filesystem::{Filesystem, FsSpec, FstabOptions};
pub use luks::{Argon2id, ClevisBind, LUKS_METADATA_SIZE, LuksContainer};
pub use lvm::{
    LVM_EXTENT_SIZE, LVM_METADATA_SIZE, LvmLogicalVolume, LvmVolumeGroup, lv_name_for_mountpoint,
};
pub use partition::Partition;
pub use partition_table::PartitionTable;

/// Concrete variant of a node, for logging and the few places that must
/// tell variants apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    PartitionTable,
    Partition,
    Filesystem,
    Luks,
    VolumeGroup,
    LogicalVolume,
    Btrfs,
    BtrfsSubvolume,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartitionTable => "partition table",
            Self::Partition => "partition",
            Self::Filesystem => "filesystem",
            Self::Luks => "LUKS container",
            Self::VolumeGroup => "LVM volume group",
            Self::LogicalVolume => "LVM logical volume",
            Self::Btrfs => "btrfs volume",
            Self::BtrfsSubvolume => "btrfs subvolume",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the layout tree
pub trait Entity: fmt::Debug {
    fn kind(&self) -> EntityKind;

    fn as_any(&self) -> &dyn Any;

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        None
    }

    fn as_sizeable(&self) -> Option<&dyn Sizeable> {
        None
    }

    fn as_sizeable_mut(&mut self) -> Option<&mut dyn Sizeable> {
        None
    }

    fn as_mountable(&self) -> Option<&dyn Mountable> {
        None
    }

    fn as_volume_container(&self) -> Option<&dyn VolumeContainer> {
        None
    }

    fn as_volume_container_mut(&mut self) -> Option<&mut dyn VolumeContainer> {
        None
    }

    fn as_metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        None
    }

    fn as_unique_mut(&mut self) -> Option<&mut dyn UniqueEntity> {
        None
    }
}

/// An entity with ordered children
///
/// Indexing past `child_count()` is a programming error and panics.
pub trait Container {
    fn child_count(&self) -> usize;
    fn child(&self, index: usize) -> &dyn Entity;
    fn child_mut(&mut self, index: usize) -> &mut dyn Entity;
}

/// An entity with a size in bytes that can only grow
pub trait Sizeable {
    fn size(&self) -> u64;

    /// Grow to at least `size`. Returns whether anything changed.
    fn ensure_size(&mut self, size: u64) -> bool;
}

/// An entity that ends up in fstab
pub trait Mountable {
    fn mountpoint(&self) -> &str;
    fn fs_type(&self) -> FsType;
    fn fs_spec(&self) -> FsSpec;
    fn fstab_options(&self) -> FstabOptions;
}

/// An entity that can create a new mountable volume inside itself
pub trait VolumeContainer {
    /// Create a volume for `mountpoint` and return the index of the new
    /// child. `default_fs` is a hint; containers that only hold one kind of
    /// volume (btrfs subvolumes) ignore it.
    fn create_volume(&mut self, mountpoint: &str, default_fs: FsType, size: u64) -> Result<usize>;

    /// Round `size` up to the allocation unit of this container.
    fn align_up(&self, size: u64) -> u64;
}

/// An entity that reserves part of its space for its own metadata
pub trait MetadataProvider {
    fn metadata_size(&self) -> u64;

    /// Smallest size able to hold the current children plus metadata, but
    /// never less than `size`.
    fn min_size(&self, size: u64) -> u64;
}

/// An entity carrying an identifier generated from the seeded source
pub trait UniqueEntity {
    /// Assign an identifier if none is set yet.
    fn gen_uuid(&mut self, rng: &mut dyn RngCore);
}

/// What a partition, LUKS container or logical volume holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Filesystem(Filesystem),
    Luks(LuksContainer),
    #[serde(rename = "lvm")]
    VolumeGroup(LvmVolumeGroup),
    Btrfs(Btrfs),
}

impl Payload {
    pub fn as_entity(&self) -> &dyn Entity {
        match self {
            Self::Filesystem(fs) => fs,
            Self::Luks(luks) => luks,
            Self::VolumeGroup(vg) => vg,
            Self::Btrfs(btrfs) => btrfs,
        }
    }

    pub fn as_entity_mut(&mut self) -> &mut dyn Entity {
        match self {
            Self::Filesystem(fs) => fs,
            Self::Luks(luks) => luks,
            Self::VolumeGroup(vg) => vg,
            Self::Btrfs(btrfs) => btrfs,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.as_entity().kind()
    }

    /// Mountpoint of the payload itself, if it is mountable
    pub fn mountpoint(&self) -> Option<&str> {
        self.as_entity().as_mountable().map(|m| m.mountpoint())
    }
}

impl From<Filesystem> for Payload {
    fn from(fs: Filesystem) -> Self {
        Self::Filesystem(fs)
    }
}

impl From<LuksContainer> for Payload {
    fn from(luks: LuksContainer) -> Self {
        Self::Luks(luks)
    }
}

impl From<LvmVolumeGroup> for Payload {
    fn from(vg: LvmVolumeGroup) -> Self {
        Self::VolumeGroup(vg)
    }
}

impl From<Btrfs> for Payload {
    fn from(btrfs: Btrfs) -> Self {
        Self::Btrfs(btrfs)
    }
}

/// Size a payload contributes to its parent: its own minimum for
/// metadata-carrying containers, its size for sizeable entities, else zero.
pub(crate) fn payload_min_size(payload: &dyn Entity) -> u64 {
    if let Some(provider) = payload.as_metadata_provider() {
        provider.min_size(0)
    } else if let Some(sizeable) = payload.as_sizeable() {
        sizeable.size()
    } else {
        0
    }
}
