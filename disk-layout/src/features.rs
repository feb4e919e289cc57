// SPDX-License-Identifier: GPL-3.0-only

//! Which tools a layout needs at build time

use disk_types::FsType;

use crate::entity::{EntityKind, PartitionTable};
use crate::traverse::visit_entities;

/// Storage technologies used by a partition table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableFeatures {
    pub lvm: bool,
    pub btrfs: bool,
    pub xfs: bool,
    pub fat: bool,
    pub ext4: bool,
    pub luks: bool,
}

impl PartitionTable {
    /// Scan the tree for the technologies it uses
    pub fn features(&self) -> TableFeatures {
        let mut features = TableFeatures::default();
        visit_entities(self, |entity| {
            match entity.kind() {
                EntityKind::VolumeGroup | EntityKind::LogicalVolume => features.lvm = true,
                EntityKind::Btrfs | EntityKind::BtrfsSubvolume => features.btrfs = true,
                EntityKind::Luks => features.luks = true,
                EntityKind::Filesystem => {
                    if let Some(mountable) = entity.as_mountable() {
                        match mountable.fs_type() {
                            FsType::Xfs => features.xfs = true,
                            FsType::Ext4 => features.ext4 = true,
                            FsType::Vfat => features.fat = true,
                            FsType::Btrfs => features.btrfs = true,
                        }
                    }
                }
                EntityKind::PartitionTable | EntityKind::Partition => {}
            }
        });
        features
    }

    /// Packages providing the tools needed to create this layout
    pub fn get_build_packages(&self) -> Vec<String> {
        let features = self.features();
        let mut packages = Vec::new();

        if features.lvm {
            packages.push("lvm2");
        }
        if features.btrfs {
            packages.push(FsType::Btrfs.build_package());
        }
        if features.xfs {
            packages.push(FsType::Xfs.build_package());
        }
        if features.fat {
            packages.push(FsType::Vfat.build_package());
        }
        if features.ext4 {
            packages.push(FsType::Ext4.build_package());
        }
        if features.luks {
            packages.extend(["clevis", "clevis-luks", "cryptsetup"]);
        }

        packages.into_iter().map(str::to_string).collect()
    }
}
