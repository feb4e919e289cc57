// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;
use std::collections::HashSet;

use disk_types::{FsType, MIB, align_up};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Container, Entity, EntityKind, Filesystem, MetadataProvider, Payload, Sizeable, UniqueEntity,
    VolumeContainer,
};
use crate::error::{LayoutError, Result};
use crate::identifiers::{gen_unique_string, new_random_uuid};

/// Space reserved for LVM2 metadata in a volume group
pub const LVM_METADATA_SIZE: u64 = MIB;

/// Physical extent size; logical volume sizes are multiples of it
pub const LVM_EXTENT_SIZE: u64 = 4 * MIB;

/// Derive a logical volume name from a mountpoint.
///
/// `/` maps to `rootlv`, `/var/log` to `var_loglv`.
pub fn lv_name_for_mountpoint(mountpoint: &str) -> String {
    if mountpoint == "/" {
        return "rootlv".to_string();
    }
    let name = mountpoint.trim_start_matches('/').replace('/', "_");
    format!("{name}lv")
}

/// An LVM2 volume group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmVolumeGroup {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub logical_volumes: Vec<LvmLogicalVolume>,
}

impl LvmVolumeGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            uuid: String::new(),
            logical_volumes: Vec::new(),
        }
    }

    /// Append a logical volume and return its index.
    ///
    /// An empty `name` is derived from the payload's mountpoint and made
    /// unique within the group. The size is rounded up to whole extents.
    pub fn create_logical_volume(
        &mut self,
        name: &str,
        size: u64,
        payload: Payload,
    ) -> Result<usize> {
        let name = if name.is_empty() {
            let Some(mountpoint) = payload.mountpoint() else {
                return Err(LayoutError::UnsupportedParent {
                    mountpoint: String::new(),
                    parent: format!("{} inside {}", payload.kind(), EntityKind::LogicalVolume),
                });
            };
            let names: HashSet<&str> = self
                .logical_volumes
                .iter()
                .map(|lv| lv.name.as_str())
                .collect();
            gen_unique_string(&lv_name_for_mountpoint(mountpoint), &names)?
        } else {
            name.to_string()
        };

        debug!("Creating logical volume {}/{}", self.name, name);
        self.logical_volumes.push(LvmLogicalVolume {
            name,
            size: align_up(size, LVM_EXTENT_SIZE),
            payload,
        });
        Ok(self.logical_volumes.len() - 1)
    }
}

impl Entity for LvmVolumeGroup {
    fn kind(&self) -> EntityKind {
        EntityKind::VolumeGroup
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

    fn as_volume_container(&self) -> Option<&dyn VolumeContainer> {
        Some(self)
    }

    fn as_volume_container_mut(&mut self) -> Option<&mut dyn VolumeContainer> {
        Some(self)
    }

    fn as_metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        Some(self)
    }

    fn as_unique_mut(&mut self) -> Option<&mut dyn UniqueEntity> {
        Some(self)
    }
}

impl Container for LvmVolumeGroup {
    fn child_count(&self) -> usize {
        self.logical_volumes.len()
    }

    fn child(&self, index: usize) -> &dyn Entity {
        &self.logical_volumes[index]
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        &mut self.logical_volumes[index]
    }
}

impl VolumeContainer for LvmVolumeGroup {
    fn create_volume(&mut self, mountpoint: &str, default_fs: FsType, size: u64) -> Result<usize> {
        if default_fs == FsType::Btrfs {
            return Err(LayoutError::UnsupportedFilesystem {
                fs_type: default_fs,
                context: format!("logical volume {mountpoint:?}"),
            });
        }
        let filesystem = Filesystem::new(default_fs, mountpoint);
        self.create_logical_volume("", size, filesystem.into())
    }

    fn align_up(&self, size: u64) -> u64 {
        align_up(size, LVM_EXTENT_SIZE)
    }
}

impl MetadataProvider for LvmVolumeGroup {
    fn metadata_size(&self) -> u64 {
        LVM_METADATA_SIZE
    }

    fn min_size(&self, size: u64) -> u64 {
        let lv_total = self
            .logical_volumes
            .iter()
            .fold(0u64, |total, lv| total.saturating_add(lv.size));
        align_up(
            size.max(lv_total.saturating_add(self.metadata_size())),
            LVM_EXTENT_SIZE,
        )
    }
}

impl UniqueEntity for LvmVolumeGroup {
    fn gen_uuid(&mut self, rng: &mut dyn RngCore) {
        if self.uuid.is_empty() {
            self.uuid = new_random_uuid(rng).to_string();
        }
    }
}

/// An LVM2 logical volume holding exactly one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmLogicalVolume {
    pub name: String,

    #[serde(with = "disk_types::size")]
    pub size: u64,

    pub payload: Payload,
}

impl Entity for LvmLogicalVolume {
    fn kind(&self) -> EntityKind {
        EntityKind::LogicalVolume
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
}

impl Container for LvmLogicalVolume {
    fn child_count(&self) -> usize {
        1
    }

    fn child(&self, index: usize) -> &dyn Entity {
        assert_eq!(index, 0, "logical volume has exactly one child");
        self.payload.as_entity()
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        assert_eq!(index, 0, "logical volume has exactly one child");
        self.payload.as_entity_mut()
    }
}

impl Sizeable for LvmLogicalVolume {
    fn size(&self) -> u64 {
        self.size
    }

    fn ensure_size(&mut self, size: u64) -> bool {
        if size > self.size {
            self.size = align_up(size, LVM_EXTENT_SIZE);
            return true;
        }
        false
    }
}
