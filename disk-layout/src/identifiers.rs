// SPDX-License-Identifier: GPL-3.0-only

//! Identifier generation
//!
//! All identifiers come from a single caller-seeded random source so that the
//! same template, request and seed always give the same table.

use std::collections::HashSet;

use rand::RngCore;
use tracing::debug;
use uuid::Uuid;

use crate::entity::{PartitionTable, UniqueEntity};
use crate::error::{LayoutError, Result};
use crate::traverse::for_each_entity_mut;

/// A version 4 UUID drawn from `rng`
pub fn new_random_uuid(rng: &mut dyn RngCore) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// A 32-bit vfat volume ID drawn from `rng`, formatted as `XXXX-XXXX`
pub fn new_volume_id(rng: &mut dyn RngCore) -> String {
    let id = rng.next_u32();
    format!("{:04X}-{:04X}", id >> 16, id & 0xffff)
}

/// `base` if it is not taken, else `base` with the first free two-digit
/// suffix from `00` to `99`.
pub fn gen_unique_string(base: &str, existing: &HashSet<&str>) -> Result<String> {
    if !existing.contains(base) {
        return Ok(base.to_string());
    }
    (0..100)
        .map(|n| format!("{base}{n:02}"))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .ok_or_else(|| LayoutError::NameCollision(base.to_string()))
}

impl PartitionTable {
    /// Assign identifiers to every entity that lacks one.
    ///
    /// Entities are visited depth first, pre-order, so each one always gets
    /// the same draws from a given seed. Partitions of dos tables carry no
    /// UUID.
    pub fn generate_uuids(&mut self, rng: &mut dyn RngCore) {
        let table_type = self.table_type;
        self.gen_uuid(&mut *rng);
        for partition in &mut self.partitions {
            partition.gen_uuid(table_type, &mut *rng);
            if let Some(payload) = &mut partition.payload {
                for_each_entity_mut(payload.as_entity_mut(), |entity| {
                    if let Some(unique) = entity.as_unique_mut() {
                        unique.gen_uuid(&mut *rng);
                    }
                });
            }
        }
        debug!("Generated identifiers for {} table", table_type);
    }
}
