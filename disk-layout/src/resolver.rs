// SPDX-License-Identifier: GPL-3.0-only

//! Resolving requested mountpoints against a template
//!
//! [`new_partition_table`] is the entry point: it clones the template, grows
//! or creates every requested mountpoint, wraps the root in LVM or btrfs if
//! asked to, applies directory size quotas, lays out the partitions and
//! finally assigns identifiers from the request's seed.

use std::collections::BTreeMap;
use std::fmt;

use disk_types::{
    Arch, FsType, GIB, MAX_LAYOUT_SIZE, MIB, PartitionRole, PartitionTableType, type_id_for,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::{
    Btrfs, BtrfsSubvolume, DEFAULT_BTRFS_COMPRESSION, EntityKind, LvmVolumeGroup, Mountable,
    PartitionTable, Payload, VolumeContainer,
};
use crate::error::{LayoutError, Result};
use crate::resize::{align_entity_branch, clamp_fs_size, resize_entity_branch};
use crate::traverse::{EntityPath, entity_path, find_directory_entity_path, for_each_entity};

/// Size of the `/boot` partition added when wrapping the root in LVM or
/// btrfs
pub const DEFAULT_BOOT_PARTITION_SIZE: u64 = 512 * MIB;

/// How to turn a template into the requested layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitioningMode {
    /// Keep the template as is; new mountpoints become partitions
    Raw,

    /// Always move the root filesystem into LVM
    Lvm,

    /// Move the root into LVM only if new mountpoints have to be created
    #[default]
    AutoLvm,

    /// Move the root into a btrfs subvolume
    Btrfs,
}

impl PartitioningMode {
    /// Mode for the boolean LVM switch of older callers
    pub fn from_lvmify(lvmify: bool) -> Self {
        if lvmify { Self::Lvm } else { Self::Raw }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Lvm => "lvm",
            Self::AutoLvm => "auto_lvm",
            Self::Btrfs => "btrfs",
        }
    }
}

impl fmt::Display for PartitioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mountpoint and the minimum size it should get
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountpointRequest {
    pub mountpoint: String,

    #[serde(default, with = "disk_types::size")]
    pub min_size: u64,
}

impl MountpointRequest {
    pub fn new(mountpoint: impl Into<String>, min_size: u64) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            min_size,
        }
    }
}

/// Everything needed to resolve a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutRequest {
    /// Requested mountpoints, processed in order
    pub mountpoints: Vec<MountpointRequest>,

    /// Minimum image size; 0 keeps whatever the layout needs
    #[serde(with = "disk_types::size")]
    pub image_size: u64,

    pub mode: PartitioningMode,

    /// Selects the discoverable root partition type when wrapping in btrfs
    pub architecture: Arch,

    /// Filesystem for new mountpoints, xfs when unset
    pub default_fs: Option<FsType>,

    /// Minimum space per directory, summed per mountpoint; the defaults
    /// from [`default_required_sizes`] apply when unset
    pub required_sizes: Option<BTreeMap<String, u64>>,

    pub seed: u64,
}

impl LayoutRequest {
    pub fn new(mountpoints: Vec<MountpointRequest>, image_size: u64, lvmify: bool, seed: u64) -> Self {
        Self {
            mountpoints,
            image_size,
            mode: PartitioningMode::from_lvmify(lvmify),
            seed,
            ..Default::default()
        }
    }
}

/// Space the root and `/usr` directories need regardless of the request
pub fn default_required_sizes() -> BTreeMap<String, u64> {
    BTreeMap::from([("/".to_string(), GIB), ("/usr".to_string(), 2 * GIB)])
}

fn boot_fs_type(default_fs: FsType) -> FsType {
    match default_fs {
        FsType::Ext4 => FsType::Ext4,
        _ => FsType::Xfs,
    }
}

/// Resolve `template` for `request`.
///
/// The template is cloned first and never modified, so it can be shared
/// between concurrent callers.
pub fn new_partition_table(
    template: &PartitionTable,
    request: &LayoutRequest,
) -> Result<PartitionTable> {
    check_sizes(template, request)?;

    let mut table = template.clone();
    let features = table.features();

    if features.lvm && matches!(request.mode, PartitioningMode::Raw | PartitioningMode::Btrfs) {
        return Err(LayoutError::UnsupportedMode(request.mode));
    }

    let requested_fs = request.default_fs.unwrap_or_default();
    let mut default_fs = requested_fs;

    let missing = table.apply_customization(&request.mountpoints, default_fs, false)?;

    match request.mode {
        PartitioningMode::Lvm => table.ensure_lvm(requested_fs)?,
        PartitioningMode::AutoLvm if !missing.is_empty() && !features.btrfs => {
            table.ensure_lvm(requested_fs)?
        }
        PartitioningMode::Btrfs => {
            default_fs = FsType::Btrfs;
            table.ensure_btrfs(requested_fs, request.architecture)?;
        }
        PartitioningMode::Raw | PartitioningMode::AutoLvm => {}
    }

    table.apply_customization(&missing, default_fs, true)?;

    let required_sizes = request
        .required_sizes
        .clone()
        .unwrap_or_else(default_required_sizes);
    table.ensure_directory_sizes(&required_sizes)?;

    table.relayout(request.image_size);
    check_size("partition table", table.size)?;

    let mut rng = StdRng::seed_from_u64(request.seed);
    table.generate_uuids(&mut rng);

    info!(
        "Resolved {} table with {} partitions ({} mode, {} bytes)",
        table.table_type,
        table.partitions.len(),
        request.mode,
        table.size
    );
    Ok(table)
}

fn check_size(what: &str, size: u64) -> Result<()> {
    if size > MAX_LAYOUT_SIZE {
        return Err(LayoutError::SizeOutOfRange {
            what: what.to_string(),
            size,
        });
    }
    Ok(())
}

/// Every size in the template and the request must stay below
/// [`MAX_LAYOUT_SIZE`] so that alignment and summing cannot overflow.
fn check_sizes(template: &PartitionTable, request: &LayoutRequest) -> Result<()> {
    check_size("image size", request.image_size)?;
    for wanted in &request.mountpoints {
        check_size(&wanted.mountpoint, wanted.min_size)?;
    }
    for (dir, size) in request.required_sizes.iter().flatten() {
        check_size(dir, *size)?;
    }

    check_size("template size", template.size)?;
    check_size("start offset", template.start_offset)?;
    check_size("extra padding", template.extra_padding)?;
    for_each_entity(template, |entity, _| match entity.as_sizeable() {
        Some(sizeable) => check_size(entity.kind().as_str(), sizeable.size()),
        None => Ok(()),
    })
}

impl PartitionTable {
    /// Grow existing mountpoints to their requested size.
    ///
    /// Mountpoints that do not exist yet are created when `create` is set
    /// and returned otherwise.
    pub fn apply_customization(
        &mut self,
        mountpoints: &[MountpointRequest],
        default_fs: FsType,
        create: bool,
    ) -> Result<Vec<MountpointRequest>> {
        let mut missing = Vec::new();
        for request in mountpoints {
            let size = clamp_fs_size(&request.mountpoint, request.min_size);
            match entity_path(self, &request.mountpoint) {
                Some(path) => {
                    let size = align_entity_branch(self, &path, size);
                    debug!("Growing {} to {} bytes", request.mountpoint, size);
                    resize_entity_branch(self, &path, size);
                }
                None if create => {
                    self.create_filesystem(&request.mountpoint, default_fs, size)?;
                }
                None => missing.push(request.clone()),
            }
        }
        Ok(missing)
    }

    /// Create a volume for `mountpoint` in the innermost volume container
    /// holding the root filesystem, then grow it to `size`.
    ///
    /// # Panics
    ///
    /// Panics if the table has no root mountpoint.
    pub fn create_filesystem(&mut self, mountpoint: &str, default_fs: FsType, size: u64) -> Result<()> {
        let Some(root_path) = entity_path(self, "/") else {
            panic!("no root filesystem found in partition table");
        };
        let position = root_path
            .entities(self)
            .iter()
            .position(|entity| entity.as_volume_container().is_some())
            .unwrap_or_else(|| panic!("no volume container holds the root filesystem"));

        let container_path = root_path.ancestor(position);
        let container = container_path.leaf_mut(self);
        let kind = container.kind();
        let index = match container.as_volume_container_mut() {
            Some(container) => container.create_volume(mountpoint, default_fs, 0)?,
            None => panic!("{kind} is not a volume container"),
        };

        let volume_path = container_path.child(index);
        let size = align_entity_branch(self, &volume_path, size);
        resize_entity_branch(self, &volume_path, size);
        info!("Created {} in {} ({} bytes)", mountpoint, kind, size);
        Ok(())
    }

    fn root_parent(&self) -> (EntityPath, EntityKind) {
        let Some(root_path) = entity_path(self, "/") else {
            panic!("no root filesystem found in partition table");
        };
        let parent = root_path.ancestor(1);
        let kind = parent.leaf(self).kind();
        (parent, kind)
    }

    fn ensure_boot_partition(&mut self, default_fs: FsType) -> Result<()> {
        if entity_path(self, "/boot").is_some() {
            return Ok(());
        }
        let fs_type = boot_fs_type(default_fs);
        self.create_volume("/boot", fs_type, DEFAULT_BOOT_PARTITION_SIZE)?;
        info!("Added {} /boot partition", fs_type);
        Ok(())
    }

    /// Take the root filesystem out of the partition holding it, which must
    /// be the parent at `path`.
    fn take_root_filesystem(&mut self, path: &EntityPath, wrapper: &str) -> Result<(usize, Payload)> {
        let index = path.indices()[0];
        let partition = &mut self.partitions[index];
        match partition.payload.take() {
            Some(payload @ Payload::Filesystem(_)) => Ok((index, payload)),
            other => {
                let parent = other
                    .as_ref()
                    .map_or("empty partition".to_string(), |p| p.kind().to_string());
                partition.payload = other;
                Err(LayoutError::UnsupportedParent {
                    mountpoint: "/".to_string(),
                    parent: format!("{parent} cannot be wrapped in {wrapper}"),
                })
            }
        }
    }

    /// Move a plain root filesystem into an LVM logical volume.
    ///
    /// A root already on LVM is left alone. A separate `/boot` is created
    /// first since the bootloader cannot read LVM.
    pub fn ensure_lvm(&mut self, default_fs: FsType) -> Result<()> {
        let (parent, kind) = self.root_parent();
        match kind {
            EntityKind::LogicalVolume => return Ok(()),
            EntityKind::Partition => {}
            other => {
                return Err(LayoutError::UnsupportedParent {
                    mountpoint: "/".to_string(),
                    parent: format!("{other} cannot be moved to LVM"),
                });
            }
        }

        self.ensure_boot_partition(default_fs)?;

        let (index, filesystem) = self.take_root_filesystem(&parent, "LVM")?;
        let lvm_type = type_id_for(self.table_type, PartitionRole::Lvm, Arch::Unset)
            .map_err(|e| LayoutError::PartitionType(e.to_string()))?;

        let partition = &mut self.partitions[index];
        let mut vg = LvmVolumeGroup::new("rootvg");
        vg.description = "created via lvm2".to_string();
        vg.create_logical_volume("rootlv", partition.size, filesystem)?;

        partition.payload = Some(vg.into());
        // relayout grows the partition to fit the volume group
        partition.size = 0;
        partition.part_type = lvm_type.to_string();

        info!("Moved root filesystem to rootvg/rootlv");
        Ok(())
    }

    /// Move a plain root filesystem into a `root` btrfs subvolume.
    ///
    /// A root already on btrfs is left alone. A separate `/boot` is created
    /// first.
    pub fn ensure_btrfs(&mut self, default_fs: FsType, architecture: Arch) -> Result<()> {
        let (parent, kind) = self.root_parent();
        match kind {
            EntityKind::Btrfs => return Ok(()),
            EntityKind::Partition => {}
            other => {
                return Err(LayoutError::UnsupportedParent {
                    mountpoint: "/".to_string(),
                    parent: format!("{other} cannot be moved to btrfs"),
                });
            }
        }

        self.ensure_boot_partition(default_fs)?;

        let (index, filesystem) = self.take_root_filesystem(&parent, "btrfs")?;
        let read_only = filesystem
            .as_entity()
            .as_mountable()
            .is_some_and(|m| m.fstab_options().read_only());

        // without an architecture the current type is kept
        let root_type = match (self.table_type, architecture) {
            (PartitionTableType::Gpt, Arch::Unset) => None,
            (table_type, arch) => Some(
                type_id_for(table_type, PartitionRole::Root, arch)
                    .map_err(|e| LayoutError::PartitionType(e.to_string()))?,
            ),
        };

        let partition = &mut self.partitions[index];
        let mut btrfs = Btrfs::new("root");
        btrfs.subvolumes.push(BtrfsSubvolume {
            name: "root".to_string(),
            size: partition.size,
            mountpoint: "/".to_string(),
            group_id: 0,
            compress: DEFAULT_BTRFS_COMPRESSION.to_string(),
            read_only,
            uuid: String::new(),
        });

        partition.payload = Some(btrfs.into());
        partition.size = 0;
        if let Some(root_type) = root_type {
            partition.part_type = root_type.to_string();
        }

        info!("Moved root filesystem to btrfs subvolume root");
        Ok(())
    }

    /// Make sure each directory in `dir_sizes` has at least the given space.
    ///
    /// Each directory is charged to the mountpoint holding it and the sums
    /// are applied per mountpoint, so `/` and `/usr` on the same filesystem
    /// add up.
    pub fn ensure_directory_sizes(&mut self, dir_sizes: &BTreeMap<String, u64>) -> Result<()> {
        let mut per_mountpoint: BTreeMap<String, (EntityPath, u64)> = BTreeMap::new();

        for (dir, size) in dir_sizes {
            if !dir.starts_with('/') {
                return Err(LayoutError::InvalidMountpoint {
                    path: dir.clone(),
                    reason: "directory must be absolute".to_string(),
                });
            }
            let Some(path) = find_directory_entity_path(self, dir) else {
                panic!("no root filesystem found in partition table");
            };
            let mountpoint = path
                .leaf(self)
                .as_mountable()
                .map(|m| m.mountpoint().to_string())
                .unwrap_or_default();
            let entry = per_mountpoint.entry(mountpoint).or_insert((path, 0));
            entry.1 = entry.1.saturating_add(*size);
        }

        for (mountpoint, (path, size)) in per_mountpoint {
            debug!("Directories on {} need {} bytes", mountpoint, size);
            resize_entity_branch(self, &path, size);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use disk_types::partition_types::{LVM_PARTITION_DOS_ID, ROOT_PARTITION_X86_64_GUID};

    use super::*;
    use crate::entity::{Filesystem, Partition};

    fn plain_table(table_type: PartitionTableType) -> PartitionTable {
        let mut pt = PartitionTable::new(table_type);
        pt.partitions.push(Partition {
            size: 2 * GIB,
            payload: Some(Filesystem::new(FsType::Xfs, "/").into()),
            ..Default::default()
        });
        pt
    }

    #[test]
    fn mode_from_lvmify() {
        assert_eq!(PartitioningMode::from_lvmify(true), PartitioningMode::Lvm);
        assert_eq!(PartitioningMode::from_lvmify(false), PartitioningMode::Raw);
        assert_eq!(PartitioningMode::default(), PartitioningMode::AutoLvm);
    }

    #[test]
    fn ensure_lvm_on_dos() {
        let mut pt = plain_table(PartitionTableType::Dos);
        pt.ensure_lvm(FsType::Ext4).expect("lvm");

        let boot = pt.find_mountable("/boot").expect("boot");
        assert_eq!(boot.fs_type(), FsType::Ext4);

        let root_part = &pt.partitions[0];
        assert_eq!(root_part.part_type, LVM_PARTITION_DOS_ID);
        assert_eq!(root_part.size, 0);
        match &root_part.payload {
            Some(Payload::VolumeGroup(vg)) => {
                assert_eq!(vg.name, "rootvg");
                assert_eq!(vg.logical_volumes[0].name, "rootlv");
                assert_eq!(vg.logical_volumes[0].size, 2 * GIB);
            }
            other => panic!("unexpected payload {other:?}"),
        }

        // already on LVM
        pt.ensure_lvm(FsType::Xfs).expect("second call");
        assert_eq!(pt.partitions.len(), 2);
    }

    #[test]
    fn ensure_btrfs_sets_root_type() {
        let mut pt = plain_table(PartitionTableType::Gpt);
        if let Some(Payload::Filesystem(fs)) = &mut pt.partitions[0].payload {
            fs.fstab_options = "ro".to_string();
        }
        pt.ensure_btrfs(FsType::Xfs, Arch::X86_64).expect("btrfs");

        let root_part = &pt.partitions[0];
        assert_eq!(root_part.part_type, ROOT_PARTITION_X86_64_GUID);
        match &root_part.payload {
            Some(Payload::Btrfs(btrfs)) => {
                assert_eq!(btrfs.subvolumes[0].name, "root");
                assert!(btrfs.subvolumes[0].read_only);
                assert_eq!(btrfs.subvolumes[0].compress, "zstd:1");
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(pt.contains_mountpoint("/boot"));
    }

    #[test]
    fn ensure_lvm_rejects_btrfs_root() {
        let mut pt = plain_table(PartitionTableType::Gpt);
        pt.ensure_btrfs(FsType::Xfs, Arch::Unset).expect("btrfs");
        assert!(matches!(
            pt.ensure_lvm(FsType::Xfs),
            Err(LayoutError::UnsupportedParent { .. })
        ));
    }

    #[test]
    fn customization_defers_missing_mountpoints() {
        let mut pt = plain_table(PartitionTableType::Gpt);
        let requests = vec![
            MountpointRequest::new("/", 3 * GIB),
            MountpointRequest::new("/home", 0),
        ];
        let missing = pt
            .apply_customization(&requests, FsType::Xfs, false)
            .expect("first pass");
        assert_eq!(missing, vec![MountpointRequest::new("/home", 0)]);
        assert_eq!(pt.partitions[0].size, 3 * GIB);

        pt.apply_customization(&missing, FsType::Xfs, true)
            .expect("second pass");
        assert_eq!(pt.mountpoint_size("/home").expect("home"), GIB);
    }

    #[test]
    fn relative_directories_are_rejected() {
        let mut pt = plain_table(PartitionTableType::Gpt);
        let sizes = BTreeMap::from([("usr".to_string(), GIB)]);
        assert!(matches!(
            pt.ensure_directory_sizes(&sizes),
            Err(LayoutError::InvalidMountpoint { .. })
        ));
    }

    #[test]
    fn lvm_tables_reject_raw_mode() {
        let mut pt = plain_table(PartitionTableType::Gpt);
        pt.ensure_lvm(FsType::Xfs).expect("lvm");
        let request = LayoutRequest {
            mode: PartitioningMode::Raw,
            ..Default::default()
        };
        assert!(matches!(
            new_partition_table(&pt, &request),
            Err(LayoutError::UnsupportedMode(PartitioningMode::Raw))
        ));
    }
}
