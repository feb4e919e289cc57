// SPDX-License-Identifier: GPL-3.0-only

//! Loading partition table templates and layout requests
//!
//! Templates are [`PartitionTable`] trees stored as TOML (or JSON) under
//! `resources/templates`. Set `DISK_LAYOUT_TEMPLATES_DIR` to load them from
//! somewhere else.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use disk_types::PartitionTableType;
use tracing::debug;

use crate::entity::{EntityKind, LvmVolumeGroup, PartitionTable};
use crate::error::{LayoutError, Result};
use crate::pathpolicy::clean_path;
use crate::resolver::LayoutRequest;
use crate::traverse::{for_each_entity, for_each_mountable};

/// Environment variable overriding the template directory
pub const TEMPLATES_DIR_ENV: &str = "DISK_LAYOUT_TEMPLATES_DIR";

const TEMPLATES_SUBDIR: &str = "resources/templates";

pub fn workspace_root() -> PathBuf {
    if let Ok(current_dir) = std::env::current_dir()
        && current_dir.join(TEMPLATES_SUBDIR).exists()
    {
        return current_dir;
    }

    let manifest_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if manifest_root.join(TEMPLATES_SUBDIR).exists() {
        return manifest_root;
    }

    PathBuf::from(".")
}

pub fn templates_root() -> PathBuf {
    match std::env::var(TEMPLATES_DIR_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root().join(TEMPLATES_SUBDIR),
    }
}

pub fn template_path_for_name(name: &str) -> PathBuf {
    templates_root().join(format!("{}.toml", name))
}

/// Load the template `<name>.toml` from the template directory
pub fn load_by_name(name: &str) -> Result<PartitionTable> {
    let path = template_path_for_name(name);
    if !path.exists() {
        return Err(LayoutError::TemplateNotFound(name.to_string()));
    }
    load_from_path(&path)
}

/// Load a template from a TOML or, by `.json` extension, JSON file
pub fn load_from_path(path: &Path) -> Result<PartitionTable> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        return Err(LayoutError::TemplateNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;

    let table = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).map_err(|error| invalid(&name, error.to_string()))?
    } else {
        from_toml_str(&name, &raw)?
    };

    validate(&name, &table)?;
    debug!("Loaded template {} from {}", name, path.display());
    Ok(table)
}

/// Parse a template from TOML without validating it
pub fn from_toml_str(name: &str, raw: &str) -> Result<PartitionTable> {
    toml::from_str(raw).map_err(|error| invalid(name, error.to_string()))
}

/// Load a layout request from a TOML file
pub fn load_request(path: &Path) -> Result<LayoutRequest> {
    let raw = fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|error| LayoutError::TemplateInvalid {
        name: path.display().to_string(),
        reason: error.to_string(),
    })
}

fn invalid(name: &str, reason: impl Into<String>) -> LayoutError {
    LayoutError::TemplateInvalid {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Check that a template can be resolved.
///
/// The table needs exactly one `/`, must fit its scheme's partition limit,
/// and every mountpoint has to be absolute and canonical. Logical volume
/// names must be unique per volume group.
pub fn validate(name: &str, table: &PartitionTable) -> Result<()> {
    let max = table.table_type.max_partitions();
    if table.partitions.len() > max {
        return Err(invalid(
            name,
            format!(
                "{} tables hold at most {} partitions, found {}",
                table.table_type,
                max,
                table.partitions.len()
            ),
        ));
    }

    if table.table_type == PartitionTableType::Dos && !table.uuid.is_empty() {
        return Err(invalid(name, "dos tables have no UUID"));
    }

    let mut roots = 0;
    for_each_mountable(table, |mountable, _| {
        let mountpoint = mountable.mountpoint();
        if mountpoint.is_empty() {
            return Ok(());
        }
        if !mountpoint.starts_with('/') || clean_path(mountpoint) != mountpoint {
            return Err(invalid(
                name,
                format!("mountpoint {mountpoint:?} must be absolute and canonical"),
            ));
        }
        if mountpoint == "/" {
            roots += 1;
        }
        Ok(())
    })?;
    if roots != 1 {
        return Err(invalid(
            name,
            format!("expected exactly one root mountpoint, found {roots}"),
        ));
    }

    for_each_entity(table, |entity, _| {
        if entity.kind() != EntityKind::VolumeGroup {
            return Ok(());
        }
        let Some(vg) = entity.as_any().downcast_ref::<LvmVolumeGroup>() else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for lv in &vg.logical_volumes {
            if !seen.insert(lv.name.as_str()) {
                return Err(invalid(
                    name,
                    format!("duplicate logical volume {} in {}", lv.name, vg.name),
                ));
            }
        }
        Ok(())
    })
}
