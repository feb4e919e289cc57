// SPDX-License-Identifier: GPL-3.0-only

use disk_layout::disk_types::partition_types::{
    BIOS_BOOT_PARTITION_GUID, EFI_FILESYSTEM_UUID, EFI_SYSTEM_PARTITION_GUID,
    ESP_FSTAB_OPTIONS, FILESYSTEM_DATA_GUID,
};
use disk_layout::disk_types::{FsType, GIB, MIB, PartitionTableType};
use disk_layout::{
    Btrfs, ClevisBind, Filesystem, LuksContainer, LvmVolumeGroup, Partition, PartitionTable,
    PartitioningMode, VolumeContainer,
};

pub fn bios_boot_partition(size: u64) -> Partition {
    Partition {
        size,
        part_type: BIOS_BOOT_PARTITION_GUID.to_string(),
        bootable: true,
        ..Default::default()
    }
}

pub fn xfs_partition(mountpoint: &str, size: u64) -> Partition {
    Partition {
        size,
        part_type: FILESYSTEM_DATA_GUID.to_string(),
        payload: Some(Filesystem::new(FsType::Xfs, mountpoint).into()),
        ..Default::default()
    }
}

pub fn esp_partition() -> Partition {
    let mut esp = Filesystem::new(FsType::Vfat, "/boot/efi");
    esp.label = "EFI-SYSTEM".to_string();
    esp.fstab_options = ESP_FSTAB_OPTIONS.to_string();
    esp.fstab_passno = 2;
    Partition {
        size: 200 * MIB,
        part_type: EFI_SYSTEM_PARTITION_GUID.to_string(),
        payload: Some(esp.into()),
        ..Default::default()
    }
}

/// BIOS boot partition of 2048 bytes and an xfs root
pub fn minimal_gpt() -> PartitionTable {
    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.partitions.push(bios_boot_partition(2048));
    pt.partitions.push(xfs_partition("/", GIB));
    pt
}

/// Only an xfs root, no `/boot`
pub fn root_only_gpt() -> PartitionTable {
    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.partitions.push(xfs_partition("/", GIB));
    pt
}

/// BIOS boot, ESP with a generated volume ID, and an xfs root
pub fn efi_gpt() -> PartitionTable {
    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.partitions.push(bios_boot_partition(MIB));
    pt.partitions.push(esp_partition());
    pt.partitions.push(xfs_partition("/", 2 * GIB));
    pt
}

/// Same as [`efi_gpt`] with the well-known ESP volume ID
pub fn efi_gpt_fixed_esp() -> PartitionTable {
    let mut pt = efi_gpt();
    if let Some(disk_layout::Payload::Filesystem(esp)) = &mut pt.partitions[1].payload {
        esp.uuid = EFI_FILESYSTEM_UUID.to_string();
    }
    pt
}

pub fn root_volume_group() -> LvmVolumeGroup {
    let mut vg = LvmVolumeGroup::new("rootvg");
    vg.create_volume("/", FsType::Xfs, 2 * GIB)
        .expect("create rootlv");
    vg
}

/// An xfs `/boot` and a volume group holding the root
pub fn lvm_gpt() -> PartitionTable {
    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.create_volume("/boot", FsType::Xfs, 512 * MIB)
        .expect("create /boot");
    pt.partitions.push(Partition {
        size: 3 * GIB,
        payload: Some(root_volume_group().into()),
        ..Default::default()
    });
    pt
}

/// A LUKS container with a null cipher and a Clevis binding that drops the
/// passphrase, wrapping a single-LV volume group
pub fn luks_lvm_gpt() -> PartitionTable {
    let mut luks = LuksContainer::new(root_volume_group());
    luks.cipher = "cipher_null".to_string();
    luks.passphrase = "password".to_string();
    luks.label = "crypt_root".to_string();
    luks.clevis = Some(ClevisBind {
        pin: "null".to_string(),
        policy: "{}".to_string(),
        remove_passphrase: true,
    });

    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.partitions.push(esp_partition());
    pt.partitions.push(Partition {
        size: GIB,
        part_type: FILESYSTEM_DATA_GUID.to_string(),
        payload: Some(luks.into()),
        ..Default::default()
    });
    pt
}

/// Root and `/home` as subvolumes of one btrfs volume
pub fn btrfs_gpt() -> PartitionTable {
    let mut btrfs = Btrfs::new("root");
    btrfs
        .create_volume("/", FsType::Btrfs, 0)
        .expect("create root subvolume");
    btrfs
        .create_volume("/home", FsType::Btrfs, 0)
        .expect("create home subvolume");

    let mut pt = PartitionTable::new(PartitionTableType::Gpt);
    pt.partitions.push(bios_boot_partition(MIB));
    pt.partitions.push(Partition {
        size: 4 * GIB,
        part_type: FILESYSTEM_DATA_GUID.to_string(),
        payload: Some(btrfs.into()),
        ..Default::default()
    });
    pt
}

/// A dos table with an ext4 `/boot` and an xfs root
pub fn dos_plain() -> PartitionTable {
    let mut pt = PartitionTable::new(PartitionTableType::Dos);
    pt.create_volume("/boot", FsType::Ext4, GIB)
        .expect("create /boot");
    pt.create_volume("/", FsType::Xfs, 2 * GIB)
        .expect("create /");
    pt
}

/// Every fixture with the partitioning modes it supports
pub fn templates_with_modes() -> Vec<(&'static str, PartitionTable, Vec<PartitioningMode>)> {
    let all = vec![
        PartitioningMode::Raw,
        PartitioningMode::Lvm,
        PartitioningMode::AutoLvm,
        PartitioningMode::Btrfs,
    ];
    let lvm = vec![PartitioningMode::Lvm, PartitioningMode::AutoLvm];
    vec![
        ("minimal-gpt", minimal_gpt(), all.clone()),
        ("efi-gpt", efi_gpt(), all),
        ("lvm-gpt", lvm_gpt(), lvm.clone()),
        ("luks-lvm-gpt", luks_lvm_gpt(), lvm.clone()),
        (
            "btrfs-gpt",
            btrfs_gpt(),
            vec![
                PartitioningMode::Raw,
                PartitioningMode::AutoLvm,
                PartitioningMode::Btrfs,
            ],
        ),
        ("dos-plain", dos_plain(), lvm),
    ]
}

/// Mountpoints the random request generator draws from
pub const MOUNTPOINT_POOL: &[&str] = &[
    "/", "/boot", "/home", "/var", "/var/log", "/opt", "/srv", "/data", "/usr",
];
