// SPDX-License-Identifier: GPL-3.0-only

use anyhow::{Result, anyhow};

use super::guids::*;
use super::{PARTITION_TYPES, PartitionTypeInfo};
use crate::table::{Arch, PartitionRole, PartitionTableType};

pub fn find_by_id(type_id: &str) -> Option<PartitionTypeInfo> {
    PARTITION_TYPES
        .iter()
        .find(|p| p.ty.eq_ignore_ascii_case(type_id))
        .cloned()
}

pub fn get_all_partition_type_infos(table_type: PartitionTableType) -> Vec<PartitionTypeInfo> {
    PARTITION_TYPES
        .iter()
        .filter(|p| p.table_type == table_type)
        .cloned()
        .collect()
}

/// Partition type identifier for a partition playing `role` in a table of
/// the given scheme.
///
/// Root and usr partitions on gpt use the discoverable, architecture
/// specific GUIDs and therefore need a known architecture.
pub fn type_id_for(
    table_type: PartitionTableType,
    role: PartitionRole,
    architecture: Arch,
) -> Result<&'static str> {
    match table_type {
        PartitionTableType::Dos => Ok(match role {
            PartitionRole::Bios => BIOS_BOOT_PARTITION_DOS_ID,
            PartitionRole::Data | PartitionRole::Boot | PartitionRole::Root | PartitionRole::Usr => {
                FILESYSTEM_LINUX_DOS_ID
            }
            PartitionRole::Esp => EFI_SYSTEM_PARTITION_DOS_ID,
            PartitionRole::Lvm => LVM_PARTITION_DOS_ID,
            PartitionRole::PpcPrep => PREP_PARTITION_DOS_ID,
            PartitionRole::Swap => SWAP_PARTITION_DOS_ID,
        }),
        PartitionTableType::Gpt => match role {
            PartitionRole::Bios => Ok(BIOS_BOOT_PARTITION_GUID),
            PartitionRole::Boot => Ok(XBOOTLDR_PARTITION_GUID),
            PartitionRole::Data => Ok(FILESYSTEM_DATA_GUID),
            PartitionRole::Esp => Ok(EFI_SYSTEM_PARTITION_GUID),
            PartitionRole::Lvm => Ok(LVM_PARTITION_GUID),
            PartitionRole::PpcPrep => Ok(PREP_PARTITION_GUID),
            PartitionRole::Swap => Ok(SWAP_PARTITION_GUID),
            PartitionRole::Root => match architecture {
                Arch::X86_64 => Ok(ROOT_PARTITION_X86_64_GUID),
                Arch::Aarch64 => Ok(ROOT_PARTITION_AARCH64_GUID),
                Arch::Ppc64le => Ok(ROOT_PARTITION_PPC64LE_GUID),
                Arch::S390x => Ok(ROOT_PARTITION_S390X_GUID),
                Arch::Unset => Err(anyhow!(
                    "architecture must be specified for selecting GUID for {:?} partition",
                    role.as_str()
                )),
            },
            PartitionRole::Usr => match architecture {
                Arch::X86_64 => Ok(USR_PARTITION_X86_64_GUID),
                Arch::Aarch64 => Ok(USR_PARTITION_AARCH64_GUID),
                Arch::Ppc64le => Ok(USR_PARTITION_PPC64LE_GUID),
                Arch::S390x => Ok(USR_PARTITION_S390X_GUID),
                Arch::Unset => Err(anyhow!(
                    "architecture must be specified for selecting GUID for {:?} partition",
                    role.as_str()
                )),
            },
        },
    }
}
