// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;

use disk_types::FsType;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind, Mountable, UniqueEntity};
use crate::identifiers::{new_random_uuid, new_volume_id};

/// Identity of a filesystem as used in the first fstab column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsSpec {
    pub uuid: String,
    pub label: String,
}

/// The option columns of an fstab line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabOptions {
    pub mnt_ops: String,
    pub freq: u64,
    pub pass_no: u64,
}

impl FstabOptions {
    /// Whether the options mount the filesystem read-only
    pub fn read_only(&self) -> bool {
        self.mnt_ops.split(',').any(|opt| opt == "ro")
    }
}

impl Default for FstabOptions {
    fn default() -> Self {
        Self {
            mnt_ops: "defaults".to_string(),
            freq: 0,
            pass_no: 0,
        }
    }
}

fn default_fstab_options() -> String {
    "defaults".to_string()
}

/// A formatted filesystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    pub fs_type: FsType,

    /// UUID, or volume ID for vfat
    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub label: String,

    /// Mountpoint, empty if not mounted
    #[serde(default)]
    pub mountpoint: String,

    #[serde(default = "default_fstab_options")]
    pub fstab_options: String,

    #[serde(default)]
    pub fstab_freq: u64,

    #[serde(default)]
    pub fstab_passno: u64,
}

impl Filesystem {
    /// A filesystem with standard mount options
    pub fn new(fs_type: FsType, mountpoint: impl Into<String>) -> Self {
        Self {
            fs_type,
            uuid: String::new(),
            label: String::new(),
            mountpoint: mountpoint.into(),
            fstab_options: default_fstab_options(),
            fstab_freq: 0,
            fstab_passno: 0,
        }
    }
}

impl Entity for Filesystem {
    fn kind(&self) -> EntityKind {
        EntityKind::Filesystem
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_mountable(&self) -> Option<&dyn Mountable> {
        Some(self)
    }

    fn as_unique_mut(&mut self) -> Option<&mut dyn UniqueEntity> {
        Some(self)
    }
}

impl Mountable for Filesystem {
    fn mountpoint(&self) -> &str {
        &self.mountpoint
    }

    fn fs_type(&self) -> FsType {
        self.fs_type
    }

    fn fs_spec(&self) -> FsSpec {
        FsSpec {
            uuid: self.uuid.clone(),
            label: self.label.clone(),
        }
    }

    fn fstab_options(&self) -> FstabOptions {
        FstabOptions {
            mnt_ops: self.fstab_options.clone(),
            freq: self.fstab_freq,
            pass_no: self.fstab_passno,
        }
    }
}

impl UniqueEntity for Filesystem {
    fn gen_uuid(&mut self, rng: &mut dyn RngCore) {
        if !self.uuid.is_empty() {
            return;
        }
        self.uuid = match self.fs_type {
            FsType::Vfat => new_volume_id(rng),
            _ => new_random_uuid(rng).to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn vfat_gets_a_volume_id() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut esp = Filesystem::new(FsType::Vfat, "/boot/efi");
        esp.gen_uuid(&mut rng);
        assert_eq!(esp.uuid.len(), 9);
        assert_eq!(&esp.uuid[4..5], "-");

        let mut root = Filesystem::new(FsType::Xfs, "/");
        root.gen_uuid(&mut rng);
        assert_eq!(root.uuid.len(), 36);
    }

    #[test]
    fn existing_uuid_is_kept() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut fs = Filesystem::new(FsType::Ext4, "/home");
        fs.uuid = "fixed".into();
        fs.gen_uuid(&mut rng);
        assert_eq!(fs.uuid, "fixed");
    }

    #[test]
    fn read_only_detection() {
        let mut fs = Filesystem::new(FsType::Xfs, "/");
        assert!(!fs.fstab_options().read_only());
        fs.fstab_options = "defaults,ro".into();
        assert!(fs.fstab_options().read_only());
        fs.fstab_options = "errors=remount-ro".into();
        assert!(!fs.fstab_options().read_only());
    }
}
