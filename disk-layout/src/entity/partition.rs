// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;

use disk_types::{ByteRange, PartitionTableType};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{Container, Entity, EntityKind, Payload, Sizeable};
use crate::identifiers::new_random_uuid;

/// A partition of a [`super::PartitionTable`]
///
/// A partition without payload is raw, e.g. a BIOS boot partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Partition {
    /// Start offset in bytes
    #[serde(with = "disk_types::size")]
    pub start: u64,

    /// Size in bytes
    #[serde(with = "disk_types::size")]
    pub size: u64,

    /// Partition type: a GUID on gpt, two hex digits on dos
    #[serde(rename = "type")]
    pub part_type: String,

    pub bootable: bool,

    /// Partition UUID, gpt only
    pub uuid: String,

    /// Partition name, gpt only
    pub label: String,

    pub payload: Option<Payload>,
}

impl Partition {
    /// Byte range covered by the partition
    pub fn range(&self) -> ByteRange {
        ByteRange::new(self.start, self.size)
    }

    /// Whether the partition is the BIOS boot partition
    pub fn is_bios_boot(&self) -> bool {
        self.part_type
            .eq_ignore_ascii_case(disk_types::partition_types::BIOS_BOOT_PARTITION_GUID)
    }

    /// Grow to hold at least `size` bytes and whatever the payload needs,
    /// metadata of nested containers included.
    pub(crate) fn fit_to(&mut self, size: u64) {
        let needed = match &self.payload {
            Some(payload) => match payload.as_entity().as_metadata_provider() {
                Some(provider) => provider.min_size(size),
                None => size,
            },
            None => size,
        };
        self.size = needed;
    }
}

impl Entity for Partition {
    fn kind(&self) -> EntityKind {
        EntityKind::Partition
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_sizeable(&self) -> Option<&dyn Sizeable> {
        Some(self)
    }

    fn as_sizeable_mut(&mut self) -> Option<&mut dyn Sizeable> {
        Some(self)
    }
}

impl Container for Partition {
    fn child_count(&self) -> usize {
        usize::from(self.payload.is_some())
    }

    fn child(&self, index: usize) -> &dyn Entity {
        match (&self.payload, index) {
            (Some(payload), 0) => payload.as_entity(),
            _ => panic!("partition has no child {index}"),
        }
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        match (&mut self.payload, index) {
            (Some(payload), 0) => payload.as_entity_mut(),
            _ => panic!("partition has no child {index}"),
        }
    }
}

impl Sizeable for Partition {
    fn size(&self) -> u64 {
        self.size
    }

    fn ensure_size(&mut self, size: u64) -> bool {
        if size > self.size {
            self.size = size;
            return true;
        }
        false
    }
}

impl Partition {
    /// Draw a partition UUID from `rng` if none is set. dos partitions have
    /// no UUID and draw nothing.
    pub fn gen_uuid(&mut self, table_type: PartitionTableType, rng: &mut dyn RngCore) {
        if self.uuid.is_empty() && table_type == PartitionTableType::Gpt {
            self.uuid = new_random_uuid(rng).to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use disk_types::{FsType, MIB};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::entity::{Filesystem, LUKS_METADATA_SIZE, LuksContainer};

    #[test]
    fn ensure_size_only_grows() {
        let mut part = Partition {
            size: 10 * MIB,
            ..Default::default()
        };
        assert!(!part.ensure_size(5 * MIB));
        assert_eq!(part.size, 10 * MIB);
        assert!(part.ensure_size(20 * MIB));
        assert_eq!(part.size, 20 * MIB);
    }

    #[test]
    fn fit_to_accounts_for_luks_header() {
        let mut part = Partition {
            size: MIB,
            payload: Some(LuksContainer::new(Filesystem::new(FsType::Xfs, "/")).into()),
            ..Default::default()
        };
        part.fit_to(part.size);
        assert_eq!(part.size, LUKS_METADATA_SIZE);
    }

    #[test]
    fn only_gpt_partitions_get_uuids() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut dos = Partition::default();
        dos.gen_uuid(PartitionTableType::Dos, &mut rng);
        assert!(dos.uuid.is_empty());

        let mut gpt = Partition::default();
        gpt.gen_uuid(PartitionTableType::Gpt, &mut rng);
        assert_eq!(gpt.uuid.len(), 36);

        let kept = gpt.uuid.clone();
        gpt.gen_uuid(PartitionTableType::Gpt, &mut rng);
        assert_eq!(gpt.uuid, kept);
    }

    #[test]
    fn raw_partition_has_no_children() {
        let part = Partition::default();
        assert_eq!(part.child_count(), 0);
    }
}
