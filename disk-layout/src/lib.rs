// SPDX-License-Identifier: GPL-3.0-only

//! Partition table layout engine for bootable disk images
//!
//! Given a base partition table template and a list of requested mountpoints
//! with minimum sizes, the engine produces a fully resolved table: every
//! partition has its final offset and size, every filesystem its identifier
//! and mount options, and every mountpoint the LUKS, LVM or Btrfs containers
//! it lives inside.
//!
//! ## Architecture
//!
//! - **entity**: the layout tree and the capability traits its nodes expose
//! - **traverse**: depth-first walks and mountpoint lookup by path
//! - **resize**: size propagation from a leaf up to the table
//! - **layout**: offset assignment and root growth (`relayout`)
//! - **identifiers**: seeded UUID and volume-ID generation
//! - **resolver**: mountpoint creation, LVM/Btrfs wrapping and the
//!   [`new_partition_table`] entry point
//! - **pathpolicy**: mountpoint allow/deny policies
//! - **template**: loading templates and requests from TOML or JSON
//! - **features**: which build tools a layout needs
//!
//! The engine never touches a block device. It is a pure transform of
//! `(template, request, seed)` into a resolved table, and the template is
//! always cloned before any mutation so one template can serve many
//! concurrent requests.

pub mod entity;
pub mod error;
pub mod features;
pub mod identifiers;
pub mod layout;
pub mod pathpolicy;
pub mod resize;
pub mod resolver;
pub mod template;
pub mod traverse;

pub use entity::{
    Argon2id, Btrfs, BtrfsSubvolume, ClevisBind, Container, Entity, EntityKind, Filesystem,
    FsSpec, FstabOptions, LuksContainer, LvmLogicalVolume, LvmVolumeGroup, MetadataProvider,
    Mountable, Partition, PartitionTable, Payload, Sizeable, UniqueEntity, VolumeContainer,
};
pub use error::{LayoutError, Result};
pub use features::TableFeatures;
pub use pathpolicy::{
    BOOTC_MOUNTPOINT_POLICIES, MOUNTPOINT_POLICIES, PathPolicies, PathPolicy, PathTrie,
    check_mountpoints_policy,
};
pub use resolver::{LayoutRequest, MountpointRequest, PartitioningMode, new_partition_table};
pub use traverse::{
    EntityPath, entity_path, find_directory_entity_path, for_each_entity, for_each_fstab_entity,
    for_each_mountable,
};

// Re-export shared types
pub use disk_types;
