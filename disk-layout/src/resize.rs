// SPDX-License-Identifier: GPL-3.0-only

//! Size propagation along a branch of the layout tree

use disk_types::{GIB, MIB};
use tracing::debug;

use crate::entity::Entity;
use crate::traverse::{EntityPath, descend, descend_mut};

/// Smallest size any requested mountpoint gets
pub const MIN_MOUNTPOINT_SIZE: u64 = GIB;

/// Smallest size `/boot` gets when requested explicitly
pub const MIN_BOOT_SIZE: u64 = 500 * MIB;

/// Raise a requested mountpoint size to the minimum for that mountpoint.
pub fn clamp_fs_size(mountpoint: &str, size: u64) -> u64 {
    let min = if mountpoint == "/boot" {
        MIN_BOOT_SIZE
    } else {
        MIN_MOUNTPOINT_SIZE
    };
    size.max(min)
}

/// Align `size` with every volume container on `path`, innermost first.
pub fn align_entity_branch(root: &dyn Entity, path: &EntityPath, size: u64) -> u64 {
    path.entities(root)
        .into_iter()
        .filter_map(|entity| entity.as_volume_container())
        .fold(size, |size, container| container.align_up(size))
}

/// Grow every entity from the target of `path` up to the root so that the
/// target can hold `size` bytes.
///
/// Walking towards the root, each container is grown to at least the sum of
/// its sizeable children plus its own metadata. The sum stops at the first
/// child that is not sizeable; a container without sizeable children counts
/// as needing the requested size. The walk ends early once an entity was
/// already big enough, since nothing above it has to change.
pub fn resize_entity_branch(root: &mut dyn Entity, path: &EntityPath, size: u64) {
    let mut size = size;
    let indices = path.indices();

    for depth in (0..=indices.len()).rev() {
        let needed = container_size(descend(&*root, &indices[..depth]), size);
        if needed > size {
            size = needed;
        }

        let entity = descend_mut(&mut *root, &indices[..depth]);
        let kind = entity.kind();
        if let Some(sizeable) = entity.as_sizeable_mut() {
            if !sizeable.ensure_size(size) {
                return;
            }
            debug!("Grew {} to {} bytes", kind, size);
        }
    }
}

fn container_size(entity: &dyn Entity, requested: u64) -> u64 {
    let Some(container) = entity.as_container() else {
        return 0;
    };

    let mut total: u64 = 0;
    for index in 0..container.child_count() {
        match container.child(index).as_sizeable() {
            Some(child) => total = total.saturating_add(child.size()),
            None => break,
        }
    }
    if total == 0 {
        total = requested;
    }
    if let Some(provider) = entity.as_metadata_provider() {
        total = total.saturating_add(provider.metadata_size());
    }
    total
}
