// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;

use disk_types::FsType;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    Container, Entity, EntityKind, FsSpec, FstabOptions, MetadataProvider, Mountable, Sizeable,
    UniqueEntity, VolumeContainer,
};
use crate::error::{LayoutError, Result};
use crate::identifiers::new_random_uuid;

/// Compression applied to subvolumes created by the engine
pub const DEFAULT_BTRFS_COMPRESSION: &str = "zstd:1";

/// Subvolume name for a mountpoint: `/` is `root`, anything else loses its
/// leading slash.
fn subvolume_name(mountpoint: &str) -> String {
    if mountpoint == "/" {
        "root".to_string()
    } else {
        mountpoint.trim_start_matches('/').to_string()
    }
}

/// A btrfs volume and its subvolumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Btrfs {
    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub mountpoint: String,

    #[serde(default)]
    pub subvolumes: Vec<BtrfsSubvolume>,
}

impl Btrfs {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            uuid: String::new(),
            label: label.into(),
            mountpoint: String::new(),
            subvolumes: Vec::new(),
        }
    }
}

impl Entity for Btrfs {
    fn kind(&self) -> EntityKind {
        EntityKind::Btrfs
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

impl Container for Btrfs {
    fn child_count(&self) -> usize {
        self.subvolumes.len()
    }

    fn child(&self, index: usize) -> &dyn Entity {
        &self.subvolumes[index]
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        &mut self.subvolumes[index]
    }
}

impl VolumeContainer for Btrfs {
    fn create_volume(&mut self, mountpoint: &str, _default_fs: FsType, size: u64) -> Result<usize> {
        let name = subvolume_name(mountpoint);
        if name.is_empty() {
            return Err(LayoutError::MissingSubvolumeName);
        }
        debug!("Creating btrfs subvolume {} for {}", name, mountpoint);
        self.subvolumes.push(BtrfsSubvolume {
            name,
            size,
            mountpoint: mountpoint.to_string(),
            group_id: 0,
            compress: DEFAULT_BTRFS_COMPRESSION.to_string(),
            read_only: false,
            uuid: self.uuid.clone(),
        });
        Ok(self.subvolumes.len() - 1)
    }

    fn align_up(&self, size: u64) -> u64 {
        size
    }
}

impl MetadataProvider for Btrfs {
    fn metadata_size(&self) -> u64 {
        0
    }

    fn min_size(&self, size: u64) -> u64 {
        let total: u64 = self.subvolumes.iter().map(|subvol| subvol.size).sum();
        size.max(total)
    }
}

impl UniqueEntity for Btrfs {
    fn gen_uuid(&mut self, rng: &mut dyn RngCore) {
        if self.uuid.is_empty() {
            self.uuid = new_random_uuid(rng).to_string();
        }
        for subvol in &mut self.subvolumes {
            subvol.uuid = self.uuid.clone();
        }
    }
}

/// A btrfs subvolume
///
/// Subvolumes share the UUID of their volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtrfsSubvolume {
    pub name: String,

    #[serde(default, with = "disk_types::size")]
    pub size: u64,

    #[serde(default)]
    pub mountpoint: String,

    #[serde(default)]
    pub group_id: u64,

    #[serde(default)]
    pub compress: String,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub uuid: String,
}

impl Entity for BtrfsSubvolume {
    fn kind(&self) -> EntityKind {
        EntityKind::BtrfsSubvolume
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_sizeable(&self) -> Option<&dyn Sizeable> {
        Some(self)
    }

    fn as_sizeable_mut(&mut self) -> Option<&mut dyn Sizeable> {
        Some(self)
    }

    fn as_mountable(&self) -> Option<&dyn Mountable> {
        Some(self)
    }
}

impl Sizeable for BtrfsSubvolume {
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

impl Mountable for BtrfsSubvolume {
    fn mountpoint(&self) -> &str {
        &self.mountpoint
    }

    fn fs_type(&self) -> FsType {
        FsType::Btrfs
    }

    fn fs_spec(&self) -> FsSpec {
        FsSpec {
            uuid: self.uuid.clone(),
            label: String::new(),
        }
    }

    fn fstab_options(&self) -> FstabOptions {
        let mut ops = format!("subvol={}", self.name);
        if !self.compress.is_empty() {
            ops.push_str(",compress=");
            ops.push_str(&self.compress);
        }
        if self.read_only {
            ops.push_str(",ro");
        }
        FstabOptions {
            mnt_ops: ops,
            freq: 0,
            pass_no: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn subvolume_names_follow_mountpoints() {
        let mut btrfs = Btrfs::new("root");
        let root = btrfs.create_volume("/", FsType::Xfs, 0).expect("root");
        let home = btrfs.create_volume("/var/lib", FsType::Xfs, 0).expect("var");
        assert_eq!(btrfs.subvolumes[root].name, "root");
        assert_eq!(btrfs.subvolumes[home].name, "var/lib");
        assert!(matches!(
            btrfs.create_volume("", FsType::Btrfs, 0),
            Err(LayoutError::MissingSubvolumeName)
        ));
    }

    #[test]
    fn fstab_options_carry_subvolume() {
        let mut btrfs = Btrfs::new("root");
        let idx = btrfs.create_volume("/home", FsType::Btrfs, 0).expect("home");
        btrfs.subvolumes[idx].read_only = true;
        assert_eq!(
            btrfs.subvolumes[idx].fstab_options().mnt_ops,
            "subvol=home,compress=zstd:1,ro"
        );
        assert!(btrfs.subvolumes[idx].fstab_options().read_only());
    }

    #[test]
    fn subvolumes_inherit_volume_uuid() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut btrfs = Btrfs::new("root");
        btrfs.create_volume("/", FsType::Btrfs, 0).expect("root");
        btrfs.gen_uuid(&mut rng);
        assert!(!btrfs.uuid.is_empty());
        assert_eq!(btrfs.subvolumes[0].fs_spec().uuid, btrfs.uuid);
    }
}
