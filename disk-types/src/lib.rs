// SPDX-License-Identifier: GPL-3.0-only

//! Shared data types for the disk image layout engine
//!
//! This crate holds the vocabulary that the layout engine and its callers
//! agree on, without any of the layout logic itself:
//!
//! - **common**: size units, grain alignment and human-readable sizes
//! - **table**: partition table schemes, filesystem types, architectures
//! - **partition_types**: GPT GUIDs and DOS type bytes, plus a catalogue of
//!   their human-readable names loaded from TOML at first use
//! - **size**: serde helpers that accept sizes as integers or strings
//!
//! ## Architecture
//!
//! `disk-layout` builds its entity tree on top of these types. Templates and
//! requests loaded from TOML reuse the serde implementations defined here, so
//! the same spelling (`"gpt"`, `"xfs"`, `"2 GiB"`) is accepted everywhere.

pub mod common;
pub mod partition_types;
pub mod size;
pub mod table;

pub use common::{
    ByteRange, DEFAULT_GRAIN_BYTES, DEFAULT_SECTOR_SIZE, GIB, KIB, MAX_LAYOUT_SIZE, MIB, TIB,
    align_up, bytes_to_pretty, checked_align_up, pretty_to_bytes,
};
pub use partition_types::{
    PARTITION_TYPES, PartitionTypeInfo, get_all_partition_type_infos, type_id_for,
};
pub use table::{Arch, FsType, PartitionRole, PartitionTableType};
