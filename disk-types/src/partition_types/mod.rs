// SPDX-License-Identifier: GPL-3.0-only

//! Partition type catalog and utilities
//!
//! Provides the partition type identifiers the layout engine writes into
//! GPT and DOS/MBR partition tables, and a catalogue of their names used when
//! describing a resolved layout.

mod catalog;
mod guids;
mod query;

use serde::Deserialize;

use crate::table::{Arch, PartitionRole, PartitionTableType};

pub use catalog::PARTITION_TYPES;
pub use guids::*;
pub use query::{get_all_partition_type_infos, type_id_for};

/// Catalogue entry for one partition type identifier.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PartitionTypeInfo {
    pub table_type: PartitionTableType,
    /// GUID for gpt, two hex digits for dos
    pub ty: String,
    pub name: String,
    /// Roles the engine writes this identifier for
    #[serde(default)]
    pub roles: Vec<PartitionRole>,
    /// Set for the discoverable root and usr GUIDs
    #[serde(default)]
    pub architecture: Arch,
}

impl PartitionTypeInfo {
    /// Look a type up by identifier. GUIDs compare case-insensitively.
    pub fn find_by_id(type_id: &str) -> Option<PartitionTypeInfo> {
        query::find_by_id(type_id)
    }

    pub fn serves(&self, role: PartitionRole) -> bool {
        self.roles.contains(&role)
    }
}
