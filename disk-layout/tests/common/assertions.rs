// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;

use disk_layout::disk_types::{DEFAULT_GRAIN_BYTES, align_up};
use disk_layout::{
    Btrfs, Entity, EntityKind, Filesystem, LuksContainer, LvmVolumeGroup, Partition,
    PartitionTable, for_each_entity,
};

/// Index of the partition holding `/`
pub fn root_index(table: &PartitionTable) -> usize {
    table
        .root_partition_index()
        .expect("resolved table has a root")
}

/// Every start is on the grain, and so is every size except the root's,
/// which gives up the footer.
pub fn assert_aligned(table: &PartitionTable, context: &str) {
    let root = root_index(table);
    for (index, partition) in table.partitions.iter().enumerate() {
        assert_eq!(
            partition.start % DEFAULT_GRAIN_BYTES,
            0,
            "{context}: partition {index} starts off grain"
        );
        if index != root {
            assert_eq!(
                partition.size % DEFAULT_GRAIN_BYTES,
                0,
                "{context}: partition {index} size off grain"
            );
        }
    }
    assert_eq!(table.size % DEFAULT_GRAIN_BYTES, 0, "{context}: table size");
}

pub fn assert_no_overlap(table: &PartitionTable, context: &str) {
    let parts = &table.partitions;
    for (i, a) in parts.iter().enumerate() {
        for b in &parts[i + 1..] {
            assert!(
                !a.range().overlaps(&b.range()),
                "{context}: {a:?} overlaps {b:?}"
            );
        }
    }
}

/// The root comes last and ends right at the footer
pub fn assert_root_fills_table(table: &PartitionTable, context: &str) {
    let root = &table.partitions[root_index(table)];
    let root_end = root.start + root.size;
    assert_eq!(
        root_end,
        table.size - table.footer_size(),
        "{context}: root does not end at the footer"
    );
    for partition in &table.partitions {
        assert!(partition.start <= root.start, "{context}: root is not last");
        if !std::ptr::eq(partition, root) {
            assert!(
                partition.start + partition.size <= root.start,
                "{context}: partition extends past the root start"
            );
        }
    }
}

pub fn assert_fits_image(table: &PartitionTable, image_size: u64, context: &str) {
    let used: u64 = table.partitions.iter().map(|p| p.size).sum();
    let needed = used + table.header_size() + table.footer_size();
    assert!(
        table.size >= align_up(image_size, DEFAULT_GRAIN_BYTES),
        "{context}: smaller than the requested image"
    );
    assert!(
        table.size >= needed,
        "{context}: {} bytes cannot hold {needed} bytes",
        table.size
    );
}

/// Layout invariants every resolved table satisfies
pub fn assert_valid_layout(table: &PartitionTable, image_size: u64, context: &str) {
    assert_aligned(table, context);
    assert_no_overlap(table, context);
    assert_root_fills_table(table, context);
    assert_fits_image(table, image_size, context);
}

/// Identifier of an entity that carries its own, if set.
///
/// Btrfs subvolumes share the volume's UUID and are not counted.
pub fn entity_uuid(entity: &dyn Entity) -> Option<String> {
    let any = entity.as_any();
    let uuid = match entity.kind() {
        EntityKind::PartitionTable => any.downcast_ref::<PartitionTable>()?.uuid.clone(),
        EntityKind::Partition => any.downcast_ref::<Partition>()?.uuid.clone(),
        EntityKind::Filesystem => any.downcast_ref::<Filesystem>()?.uuid.clone(),
        EntityKind::Luks => any.downcast_ref::<LuksContainer>()?.uuid.clone(),
        EntityKind::VolumeGroup => any.downcast_ref::<LvmVolumeGroup>()?.uuid.clone(),
        EntityKind::Btrfs => any.downcast_ref::<Btrfs>()?.uuid.clone(),
        EntityKind::LogicalVolume | EntityKind::BtrfsSubvolume => return None,
    };
    (!uuid.is_empty()).then_some(uuid)
}

pub fn collect_uuids(table: &PartitionTable) -> Vec<String> {
    let mut uuids = Vec::new();
    for_each_entity(table, |entity, _| {
        uuids.extend(entity_uuid(entity));
        Ok(())
    })
    .expect("walk");
    uuids
}

pub fn assert_unique_uuids(table: &PartitionTable, context: &str) {
    let uuids = collect_uuids(table);
    let unique: HashSet<&String> = uuids.iter().collect();
    assert_eq!(unique.len(), uuids.len(), "{context}: duplicate UUIDs {uuids:?}");
}
