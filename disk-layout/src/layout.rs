// SPDX-License-Identifier: GPL-3.0-only

//! Offset assignment for the partitions of a table

use disk_types::{DEFAULT_GRAIN_BYTES, align_up};
use tracing::{debug, info};

use crate::entity::PartitionTable;

impl PartitionTable {
    /// Assign final offsets and sizes to all partitions.
    ///
    /// Partitions keep their declaration order, except that the one holding
    /// `/` is placed last and grown to fill the image up to the footer. The
    /// table grows to at least `size` (rounded up to the grain) and to
    /// whatever the partitions need. Partitions end up sorted by start.
    ///
    /// Returns the start of the root partition.
    ///
    /// # Panics
    ///
    /// Panics if the table has no root mountpoint.
    pub fn relayout(&mut self, size: u64) -> u64 {
        let footer = self.footer_size();
        let mut start = self.align_up(self.header_size().saturating_add(self.start_offset));
        let mut size = self.align_up(size);

        let Some(root_index) = self.root_partition_index() else {
            panic!("no root filesystem found in partition table");
        };

        for (index, partition) in self.partitions.iter_mut().enumerate() {
            if index == root_index {
                continue;
            }
            partition.start = start;
            partition.fit_to(partition.size);
            partition.size = align_up(partition.size, DEFAULT_GRAIN_BYTES);
            start = start.saturating_add(partition.size);
        }

        let root = &mut self.partitions[root_index];
        root.start = start;
        root.fit_to(root.size);

        let end = align_up(
            root.start.saturating_add(footer).saturating_add(root.size),
            DEFAULT_GRAIN_BYTES,
        );
        if end > size {
            size = end;
        }
        if size > self.size {
            self.size = size;
        }

        // root fills everything up to the footer
        root.size = self.size.saturating_sub(root.start).saturating_sub(footer);
        debug!(
            "Root partition at {} spans {} bytes, footer {} bytes",
            root.start, root.size, footer
        );

        self.partitions.sort_by_key(|partition| partition.start);
        info!(
            "Laid out {} partitions in {} bytes",
            self.partitions.len(),
            self.size
        );
        start
    }
}

#[cfg(test)]
mod tests {
    use disk_types::partition_types::BIOS_BOOT_PARTITION_GUID;
    use disk_types::{FsType, GIB, MIB, PartitionTableType};

    use super::*;
    use crate::entity::{Filesystem, Partition, VolumeContainer};

    fn root_first_table() -> PartitionTable {
        let mut pt = PartitionTable::new(PartitionTableType::Gpt);
        pt.partitions.push(Partition {
            size: 2 * GIB,
            payload: Some(Filesystem::new(FsType::Xfs, "/").into()),
            ..Default::default()
        });
        pt.partitions.push(Partition {
            size: 1024,
            part_type: BIOS_BOOT_PARTITION_GUID.to_string(),
            bootable: true,
            ..Default::default()
        });
        pt.create_volume("/boot", FsType::Xfs, 500 * MIB + 1)
            .expect("boot");
        pt
    }

    #[test]
    fn root_goes_last_and_fills_the_image() {
        let mut pt = root_first_table();
        let root_start = pt.relayout(10 * GIB);

        assert_eq!(pt.size, 10 * GIB);
        assert!(pt.partitions[0].is_bios_boot());
        assert_eq!(pt.partitions[0].start, MIB);
        assert_eq!(pt.partitions[0].size, MIB);
        assert_eq!(pt.partitions[1].start, 2 * MIB);
        assert_eq!(pt.partitions[1].size, 501 * MIB);

        let root = &pt.partitions[2];
        assert_eq!(root.start, root_start);
        assert_eq!(root_start, 503 * MIB);
        assert_eq!(root.start + root.size + pt.footer_size(), pt.size);
    }

    #[test]
    fn image_grows_to_fit_partitions() {
        let mut pt = root_first_table();
        pt.relayout(0);

        let root = &pt.partitions[2];
        assert!(root.size >= 2 * GIB);
        assert_eq!(pt.size % MIB, 0);
        assert_eq!(root.start + root.size + pt.footer_size(), pt.size);
    }

    #[test]
    fn start_offset_and_padding_are_reserved() {
        let mut pt = root_first_table();
        pt.start_offset = 8 * MIB;
        pt.extra_padding = 4 * MIB;
        pt.relayout(0);

        assert_eq!(pt.partitions[0].start, 9 * MIB);
        let root = &pt.partitions[2];
        assert!(pt.size - (root.start + root.size) >= 4 * MIB);
    }

    #[test]
    fn dos_tables_have_no_footer() {
        let mut pt = root_first_table();
        pt.table_type = PartitionTableType::Dos;
        pt.relayout(4 * GIB);
        let root = &pt.partitions[2];
        assert_eq!(root.start + root.size, pt.size);
    }

    #[test]
    #[should_panic(expected = "no root filesystem")]
    fn relayout_without_root_panics() {
        let mut pt = PartitionTable::new(PartitionTableType::Gpt);
        pt.create_volume("/data", FsType::Xfs, GIB).expect("data");
        pt.relayout(0);
    }
}
