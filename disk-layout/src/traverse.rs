// SPDX-License-Identifier: GPL-3.0-only

//! Walking the layout tree
//!
//! Entities have no parent links. Walks hand the callback the ancestry of
//! each node, and lookups return an [`EntityPath`]: the child indices leading
//! from the root to the node. A path stays valid as long as no container on
//! it gains or loses children before the indexed position.

use crate::entity::{Entity, Mountable};
use crate::error::Result;
use crate::pathpolicy::parent_dir;

/// Location of an entity, as child indices from the root down
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPath {
    indices: Vec<usize>,
}

impl EntityPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Child indices from the root down to the target
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of entities on the path, root and target included
    pub fn len(&self) -> usize {
        self.indices.len() + 1
    }

    /// Whether the path points at the root itself
    pub fn is_root(&self) -> bool {
        self.indices.is_empty()
    }

    /// Path to the `n`-th ancestor; `0` is the target itself
    pub fn ancestor(&self, n: usize) -> EntityPath {
        let depth = self.indices.len().saturating_sub(n);
        EntityPath::new(self.indices[..depth].to_vec())
    }

    /// Path to child `index` of the target
    pub fn child(&self, index: usize) -> EntityPath {
        let mut indices = self.indices.clone();
        indices.push(index);
        EntityPath::new(indices)
    }

    /// The entity the path points at
    pub fn leaf<'a>(&self, root: &'a dyn Entity) -> &'a dyn Entity {
        descend(root, &self.indices)
    }

    pub fn leaf_mut<'a>(&self, root: &'a mut dyn Entity) -> &'a mut dyn Entity {
        descend_mut(root, &self.indices)
    }

    /// Entities on the path, leaf first and root last
    pub fn entities<'a>(&self, root: &'a dyn Entity) -> Vec<&'a dyn Entity> {
        let mut entities = Vec::with_capacity(self.len());
        let mut current = root;
        entities.push(current);
        for &index in &self.indices {
            current = child_of(current, index);
            entities.push(current);
        }
        entities.reverse();
        entities
    }
}

fn child_of(entity: &dyn Entity, index: usize) -> &dyn Entity {
    match entity.as_container() {
        Some(container) => container.child(index),
        None => panic!("{} is not a container", entity.kind()),
    }
}

/// Follow `indices` from `root`
pub fn descend<'a>(root: &'a dyn Entity, indices: &[usize]) -> &'a dyn Entity {
    indices
        .iter()
        .fold(root, |entity, &index| child_of(entity, index))
}

/// Follow `indices` from `root`, mutably
pub fn descend_mut<'a>(root: &'a mut dyn Entity, indices: &[usize]) -> &'a mut dyn Entity {
    let mut entity = root;
    for &index in indices {
        entity = match entity.as_container_mut() {
            Some(container) => container.child_mut(index),
            None => panic!("path index {index} leads through a non-container"),
        };
    }
    entity
}

/// Visit every entity depth first, pre-order.
///
/// The callback receives the entity and its ancestry, root first and the
/// entity itself last. An error stops the walk and is returned.
pub fn for_each_entity<F>(root: &dyn Entity, mut callback: F) -> Result<()>
where
    F: FnMut(&dyn Entity, &[&dyn Entity]) -> Result<()>,
{
    let mut path = Vec::new();
    walk(root, &mut path, &mut callback)
}

fn walk<'a, F>(entity: &'a dyn Entity, path: &mut Vec<&'a dyn Entity>, callback: &mut F) -> Result<()>
where
    F: FnMut(&dyn Entity, &[&dyn Entity]) -> Result<()>,
{
    path.push(entity);
    callback(entity, path)?;
    if let Some(container) = entity.as_container() {
        for index in 0..container.child_count() {
            walk(container.child(index), path, callback)?;
        }
    }
    path.pop();
    Ok(())
}

/// Visit every entity, depth first, pre-order, without ancestry.
pub fn visit_entities<F>(root: &dyn Entity, mut callback: F)
where
    F: FnMut(&dyn Entity),
{
    visit(root, &mut callback);
}

fn visit<F>(entity: &dyn Entity, callback: &mut F)
where
    F: FnMut(&dyn Entity),
{
    callback(entity);
    if let Some(container) = entity.as_container() {
        for index in 0..container.child_count() {
            visit(container.child(index), callback);
        }
    }
}

/// Visit every entity mutably, depth first, pre-order.
pub fn for_each_entity_mut<F>(root: &mut dyn Entity, mut callback: F)
where
    F: FnMut(&mut dyn Entity),
{
    walk_mut(root, &mut callback);
}

fn walk_mut<F>(entity: &mut dyn Entity, callback: &mut F)
where
    F: FnMut(&mut dyn Entity),
{
    callback(&mut *entity);
    if let Some(container) = entity.as_container_mut() {
        for index in 0..container.child_count() {
            walk_mut(container.child_mut(index), callback);
        }
    }
}

/// Visit every mountable entity.
///
/// The walk descends through containers that are not mountable themselves.
/// The callback receives the full ancestry, root first.
pub fn for_each_mountable<F>(root: &dyn Entity, mut callback: F) -> Result<()>
where
    F: FnMut(&dyn Mountable, &[&dyn Entity]) -> Result<()>,
{
    for_each_entity(root, |entity, path| match entity.as_mountable() {
        Some(mountable) => callback(mountable, path),
        None => Ok(()),
    })
}

/// Visit every mountable entity that produces an fstab line, i.e. that has
/// a mountpoint.
pub fn for_each_fstab_entity<F>(root: &dyn Entity, mut callback: F) -> Result<()>
where
    F: FnMut(&dyn Mountable, &[&dyn Entity]) -> Result<()>,
{
    for_each_mountable(root, |mountable, path| {
        if mountable.mountpoint().is_empty() {
            return Ok(());
        }
        callback(mountable, path)
    })
}

/// Find the mountable entity mounted at `mountpoint`
pub fn entity_path(root: &dyn Entity, mountpoint: &str) -> Option<EntityPath> {
    let mut indices = Vec::new();
    if find_path(root, mountpoint, &mut indices) {
        Some(EntityPath::new(indices))
    } else {
        None
    }
}

fn find_path(entity: &dyn Entity, mountpoint: &str, indices: &mut Vec<usize>) -> bool {
    if let Some(mountable) = entity.as_mountable() {
        return mountable.mountpoint() == mountpoint;
    }
    if let Some(container) = entity.as_container() {
        for index in 0..container.child_count() {
            indices.push(index);
            if find_path(container.child(index), mountpoint, indices) {
                return true;
            }
            indices.pop();
        }
    }
    false
}

/// Find the mountable entity whose mountpoint holds `dir`.
///
/// Tries `dir` itself, then each parent directory in turn, so `/usr/lib`
/// resolves to `/usr` if that is a mountpoint and to `/` otherwise. Returns
/// `None` only if the tree has no root mountpoint.
pub fn find_directory_entity_path(root: &dyn Entity, dir: &str) -> Option<EntityPath> {
    let mut dir = dir.to_string();
    loop {
        if let Some(path) = entity_path(root, &dir) {
            return Some(path);
        }
        let parent = parent_dir(&dir);
        if parent == dir {
            return None;
        }
        dir = parent;
    }
}

#[cfg(test)]
mod tests {
    use disk_types::{FsType, GIB, PartitionTableType};

    use super::*;
    use crate::entity::{
        EntityKind, Filesystem, LuksContainer, LvmVolumeGroup, Partition, PartitionTable,
        VolumeContainer,
    };
    use crate::error::LayoutError;

    fn nested_table() -> PartitionTable {
        let mut vg = LvmVolumeGroup::new("rootvg");
        vg.create_volume("/", FsType::Xfs, GIB).expect("root lv");
        vg.create_volume("/home", FsType::Xfs, GIB).expect("home lv");

        let mut pt = PartitionTable::new(PartitionTableType::Gpt);
        pt.create_volume("/boot", FsType::Xfs, GIB).expect("boot");
        pt.partitions.push(Partition {
            payload: Some(LuksContainer::new(vg).into()),
            ..Default::default()
        });
        pt
    }

    #[test]
    fn walk_is_pre_order() {
        let pt = nested_table();
        let mut kinds = Vec::new();
        for_each_entity(&pt, |entity, path| {
            assert!(std::ptr::addr_eq(path[path.len() - 1], entity));
            kinds.push(entity.kind());
            Ok(())
        })
        .expect("walk");

        assert_eq!(
            kinds,
            vec![
                EntityKind::PartitionTable,
                EntityKind::Partition,
                EntityKind::Filesystem,
                EntityKind::Partition,
                EntityKind::Luks,
                EntityKind::VolumeGroup,
                EntityKind::LogicalVolume,
                EntityKind::Filesystem,
                EntityKind::LogicalVolume,
                EntityKind::Filesystem,
            ]
        );
    }

    #[test]
    fn walk_stops_on_error() {
        let pt = nested_table();
        let mut visited = 0;
        let result = for_each_entity(&pt, |entity, _| {
            visited += 1;
            if entity.kind() == EntityKind::Luks {
                return Err(LayoutError::MountpointNotFound("stop".into()));
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(visited, 5);
    }

    #[test]
    fn mountables_carry_full_ancestry() {
        let pt = nested_table();
        let mut found = Vec::new();
        for_each_mountable(&pt, |mountable, path| {
            found.push((mountable.mountpoint().to_string(), path.len()));
            Ok(())
        })
        .expect("walk");
        assert_eq!(
            found,
            vec![
                ("/boot".to_string(), 3),
                ("/".to_string(), 6),
                ("/home".to_string(), 6),
            ]
        );
    }

    #[test]
    fn entity_path_is_leaf_first() {
        let pt = nested_table();
        let path = entity_path(&pt, "/home").expect("home path");
        assert_eq!(path.indices(), &[1, 0, 0, 1, 0]);
        let kinds: Vec<_> = path.entities(&pt).iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EntityKind::Filesystem,
                EntityKind::LogicalVolume,
                EntityKind::VolumeGroup,
                EntityKind::Luks,
                EntityKind::Partition,
                EntityKind::PartitionTable,
            ]
        );
        assert_eq!(path.ancestor(3).leaf(&pt).kind(), EntityKind::Luks);
        assert!(entity_path(&pt, "/srv").is_none());
    }

    #[test]
    fn directories_resolve_to_their_mountpoint() {
        let pt = nested_table();
        let usr = find_directory_entity_path(&pt, "/usr/lib").expect("usr");
        assert_eq!(usr, entity_path(&pt, "/").expect("root"));
        let home = find_directory_entity_path(&pt, "/home/user").expect("home");
        assert_eq!(home, entity_path(&pt, "/home").expect("home"));

        let mut empty = PartitionTable::new(PartitionTableType::Gpt);
        empty.partitions.push(Partition {
            payload: Some(Filesystem::new(FsType::Xfs, "/data").into()),
            ..Default::default()
        });
        assert!(find_directory_entity_path(&empty, "/usr").is_none());
    }

    #[test]
    fn mutable_walk_reaches_every_entity() {
        let mut pt = nested_table();
        let mut count = 0;
        for_each_entity_mut(&mut pt, |_| count += 1);
        assert_eq!(count, 10);
    }

    #[test]
    fn plain_visit_matches_the_checked_walk() {
        let pt = nested_table();
        let mut visited = Vec::new();
        visit_entities(&pt, |entity| visited.push(entity.kind()));

        let mut walked = Vec::new();
        for_each_entity(&pt, |entity, _| {
            walked.push(entity.kind());
            Ok(())
        })
        .expect("walk");
        assert_eq!(visited, walked);
    }
}
