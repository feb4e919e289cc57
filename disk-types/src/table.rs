// SPDX-License-Identifier: GPL-3.0-only

//! Partition table schemes, filesystem types and architectures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Partition table scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionTableType {
    /// GPT (GUID Partition Table)
    #[default]
    Gpt,

    /// MBR/DOS (Master Boot Record)
    Dos,
}

impl PartitionTableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Dos => "dos",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gpt" => Some(Self::Gpt),
            "dos" | "mbr" => Some(Self::Dos),
            _ => None,
        }
    }

    /// Maximum number of partitions the scheme can hold
    pub fn max_partitions(&self) -> usize {
        match self {
            Self::Gpt => 128,
            Self::Dos => 4,
        }
    }
}

impl fmt::Display for PartitionTableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem type
///
/// There is one value for each filesystem the image builder can create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsType {
    #[default]
    Xfs,
    Ext4,
    Vfat,
    Btrfs,
}

impl FsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xfs => "xfs",
            Self::Ext4 => "ext4",
            Self::Vfat => "vfat",
            Self::Btrfs => "btrfs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "xfs" => Some(Self::Xfs),
            "ext4" => Some(Self::Ext4),
            "vfat" => Some(Self::Vfat),
            "btrfs" => Some(Self::Btrfs),
            _ => None,
        }
    }

    /// Package providing the mkfs tool for this filesystem
    pub fn build_package(&self) -> &'static str {
        match self {
            Self::Xfs => "xfsprogs",
            Self::Ext4 => "e2fsprogs",
            Self::Vfat => "dosfstools",
            Self::Btrfs => "btrfs-progs",
        }
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of the image, used to select discoverable GPT types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    Unset,
    #[serde(rename = "x86_64")]
    X86_64,
    Aarch64,
    Ppc64le,
    S390x,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }
}

/// Role a partition plays in the image, used to pick its type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionRole {
    Bios,
    Boot,
    Data,
    Esp,
    Lvm,
    PpcPrep,
    Swap,
    Root,
    Usr,
}

impl PartitionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bios => "bios",
            Self::Boot => "boot",
            Self::Data => "data",
            Self::Esp => "esp",
            Self::Lvm => "lvm",
            Self::PpcPrep => "ppc_prep",
            Self::Swap => "swap",
            Self::Root => "root",
            Self::Usr => "usr",
        }
    }
}
