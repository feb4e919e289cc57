// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;

use disk_types::{
    Arch, DEFAULT_GRAIN_BYTES, DEFAULT_SECTOR_SIZE, FsType, PartitionRole, PartitionTableType,
    type_id_for,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Container, Entity, EntityKind, Filesystem, Mountable, Partition, Sizeable, UniqueEntity,
    VolumeContainer,
};
use crate::error::{LayoutError, Result};
use crate::identifiers::new_random_uuid;
use crate::traverse::entity_path;

/// Root of the layout tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionTable {
    /// Total image size in bytes
    #[serde(with = "disk_types::size")]
    pub size: u64,

    /// Table UUID, gpt only
    pub uuid: String,

    #[serde(rename = "type")]
    pub table_type: PartitionTableType,

    pub partitions: Vec<Partition>,

    /// Sector size in bytes, 512 when unset
    pub sector_size: u64,

    /// Bytes reserved after the last partition
    #[serde(with = "disk_types::size")]
    pub extra_padding: u64,

    /// Bytes left free between the header and the first partition
    #[serde(with = "disk_types::size")]
    pub start_offset: u64,
}

impl PartitionTable {
    pub fn new(table_type: PartitionTableType) -> Self {
        Self {
            table_type,
            ..Default::default()
        }
    }

    /// Effective sector size
    pub fn sector_size(&self) -> u64 {
        if self.sector_size == 0 {
            DEFAULT_SECTOR_SIZE
        } else {
            self.sector_size
        }
    }

    /// Convert a byte count into whole sectors, rounding down
    pub fn bytes_to_sectors(&self, bytes: u64) -> u64 {
        bytes / self.sector_size()
    }

    pub fn sectors_to_bytes(&self, sectors: u64) -> u64 {
        sectors * self.sector_size()
    }

    /// Round `size` up to the partition grain
    pub fn align_up(&self, size: u64) -> u64 {
        disk_types::align_up(size, DEFAULT_GRAIN_BYTES)
    }

    /// Bytes reserved at the start of the disk for the table itself.
    ///
    /// One sector for the MBR and, on gpt, the header, plus the gpt entry
    /// array of at least 128 entries of 128 bytes.
    pub fn header_size(&self) -> u64 {
        match self.table_type {
            PartitionTableType::Dos => self.sector_size(),
            PartitionTableType::Gpt => {
                let entries = self.partitions.len().max(128) as u64;
                self.sector_size() + entries * 128
            }
        }
    }

    /// Bytes reserved after the last partition
    pub fn footer_size(&self) -> u64 {
        let footer = match self.table_type {
            PartitionTableType::Dos => 0,
            // backup header
            PartitionTableType::Gpt => self.header_size(),
        };
        footer.saturating_add(self.extra_padding)
    }

    /// The mountable entity for `mountpoint`, if any
    pub fn find_mountable(&self, mountpoint: &str) -> Option<&dyn Mountable> {
        let path = entity_path(self, mountpoint)?;
        path.leaf(self).as_mountable()
    }

    pub fn contains_mountpoint(&self, mountpoint: &str) -> bool {
        entity_path(self, mountpoint).is_some()
    }

    /// The mountable entity for `mountpoint` if it sits directly on a
    /// partition, without LUKS, LVM or btrfs in between
    pub fn find_mountable_on_plain(&self, mountpoint: &str) -> Option<&dyn Mountable> {
        let path = entity_path(self, mountpoint)?;
        let entities = path.entities(self);
        if entities.len() > 1 && entities[1].kind() == EntityKind::Partition {
            entities[0].as_mountable()
        } else {
            None
        }
    }

    /// Size of the closest sizeable entity holding `mountpoint`
    pub fn mountpoint_size(&self, mountpoint: &str) -> Result<u64> {
        let path = entity_path(self, mountpoint)
            .ok_or_else(|| LayoutError::MountpointNotFound(mountpoint.to_string()))?;
        path.entities(self)
            .into_iter()
            .find_map(|entity| entity.as_sizeable().map(|s| s.size()))
            .ok_or_else(|| LayoutError::MountpointNotFound(mountpoint.to_string()))
    }

    /// Index of the partition whose subtree holds `/`
    pub fn root_partition_index(&self) -> Option<usize> {
        entity_path(self, "/").and_then(|path| path.indices().first().copied())
    }
}

impl Entity for PartitionTable {
    fn kind(&self) -> EntityKind {
        EntityKind::PartitionTable
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_sizeable(&self) -> Option<&dyn Sizeable> {
        Some(self)
    }

    fn as_sizeable_mut(&mut self) -> Option<&mut dyn Sizeable> {
        Some(self)
    }

    fn as_volume_container(&self) -> Option<&dyn VolumeContainer> {
        Some(self)
    }

    fn as_volume_container_mut(&mut self) -> Option<&mut dyn VolumeContainer> {
        Some(self)
    }

    fn as_unique_mut(&mut self) -> Option<&mut dyn UniqueEntity> {
        Some(self)
    }
}

impl Container for PartitionTable {
    fn child_count(&self) -> usize {
        self.partitions.len()
    }

    fn child(&self, index: usize) -> &dyn Entity {
        &self.partitions[index]
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        &mut self.partitions[index]
    }
}

impl Sizeable for PartitionTable {
    fn size(&self) -> u64 {
        self.size
    }

    fn ensure_size(&mut self, size: u64) -> bool {
        if size > self.size {
            self.size = size;
            return true;
        }
        false
    }
}

impl VolumeContainer for PartitionTable {
    fn create_volume(&mut self, mountpoint: &str, default_fs: FsType, size: u64) -> Result<usize> {
        let max = self.table_type.max_partitions();
        if self.partitions.len() >= max {
            return Err(LayoutError::PartitionLimit {
                table_type: self.table_type,
                max,
            });
        }

        let role = if mountpoint == "/boot" {
            PartitionRole::Boot
        } else {
            PartitionRole::Data
        };
        let part_type = type_id_for(self.table_type, role, Arch::Unset)
            .map_err(|e| LayoutError::PartitionType(e.to_string()))?;

        debug!(
            "Creating {} partition for {} ({} bytes)",
            default_fs, mountpoint, size
        );
        self.partitions.push(Partition {
            size,
            part_type: part_type.to_string(),
            payload: Some(Filesystem::new(default_fs, mountpoint).into()),
            ..Default::default()
        });
        Ok(self.partitions.len() - 1)
    }

    fn align_up(&self, size: u64) -> u64 {
        PartitionTable::align_up(self, size)
    }
}

impl UniqueEntity for PartitionTable {
    fn gen_uuid(&mut self, rng: &mut dyn RngCore) {
        if self.uuid.is_empty() && self.table_type == PartitionTableType::Gpt {
            self.uuid = new_random_uuid(rng).to_string();
        }
    }
}
