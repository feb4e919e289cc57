// SPDX-License-Identifier: GPL-3.0-only

use disk_types::{FsType, PartitionTableType};
use thiserror::Error;

use crate::resolver::PartitioningMode;

/// Error types for layout operations
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Name collision: could not find a unique name for {0:?}")]
    NameCollision(String),

    #[error("Partition limit reached: {table_type} tables hold at most {max} partitions")]
    PartitionLimit {
        table_type: PartitionTableType,
        max: usize,
    },

    #[error("Invalid mountpoint {path:?}: {reason}")]
    InvalidMountpoint { path: String, reason: String },

    #[error("Mountpoint {0:?} is not allowed by policy")]
    PolicyDenied(String),

    #[error("The following errors occurred while validating mountpoints:\n{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    MountpointPolicy(Vec<LayoutError>),

    #[error("Unsupported filesystem {fs_type} for {context}")]
    UnsupportedFilesystem { fs_type: FsType, context: String },

    #[error("Unsupported parent for {mountpoint:?}: {parent}")]
    UnsupportedParent { mountpoint: String, parent: String },

    #[error("Partitioning mode {0} is not supported for this partition table")]
    UnsupportedMode(PartitioningMode),

    #[error("Mountpoint not found: {0}")]
    MountpointNotFound(String),

    #[error("Subvolume name is required")]
    MissingSubvolumeName,

    #[error("Size of {what} is out of range: {size} bytes")]
    SizeOutOfRange { what: String, size: u64 },

    #[error("Partition type error: {0}")]
    PartitionType(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid template {name}: {reason}")]
    TemplateInvalid { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
