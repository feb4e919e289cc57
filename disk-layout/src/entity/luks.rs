// SPDX-License-Identifier: GPL-3.0-only

use std::any::Any;

use disk_types::MIB;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{Container, Entity, EntityKind, MetadataProvider, Payload, UniqueEntity};
use crate::entity::payload_min_size;
use crate::identifiers::new_random_uuid;

/// Space taken by the LUKS2 header
pub const LUKS_METADATA_SIZE: u64 = 16 * MIB;

/// Argon2id key derivation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Argon2id {
    pub iterations: u32,

    /// Memory cost in KiB
    pub memory: u32,

    pub parallelism: u32,
}

impl Default for Argon2id {
    fn default() -> Self {
        Self {
            iterations: 4,
            memory: 1024 * 1024,
            parallelism: 4,
        }
    }
}

/// Clevis binding used to unlock the container without the passphrase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClevisBind {
    pub pin: String,
    pub policy: String,
    pub remove_passphrase: bool,
}

/// A LUKS2 encrypted container holding exactly one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuksContainer {
    #[serde(default)]
    pub passphrase: String,

    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub cipher: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub subsystem: String,

    #[serde(default)]
    pub sector_size: u64,

    #[serde(default)]
    pub pbkdf: Argon2id,

    #[serde(default)]
    pub clevis: Option<ClevisBind>,

    pub payload: Box<Payload>,
}

impl LuksContainer {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            passphrase: String::new(),
            uuid: String::new(),
            cipher: String::new(),
            label: String::new(),
            subsystem: String::new(),
            sector_size: 0,
            pbkdf: Argon2id::default(),
            clevis: None,
            payload: Box::new(payload.into()),
        }
    }
}

impl Entity for LuksContainer {
    fn kind(&self) -> EntityKind {
        EntityKind::Luks
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

    fn as_metadata_provider(&self) -> Option<&dyn MetadataProvider> {
        Some(self)
    }

    fn as_unique_mut(&mut self) -> Option<&mut dyn UniqueEntity> {
        Some(self)
    }
}

impl Container for LuksContainer {
    fn child_count(&self) -> usize {
        1
    }

    fn child(&self, index: usize) -> &dyn Entity {
        assert_eq!(index, 0, "LUKS container has exactly one child");
        self.payload.as_entity()
    }

    fn child_mut(&mut self, index: usize) -> &mut dyn Entity {
        assert_eq!(index, 0, "LUKS container has exactly one child");
        self.payload.as_entity_mut()
    }
}

impl MetadataProvider for LuksContainer {
    fn metadata_size(&self) -> u64 {
        LUKS_METADATA_SIZE
    }

    fn min_size(&self, size: u64) -> u64 {
        size.max(
            self.metadata_size()
                .saturating_add(payload_min_size(self.payload.as_entity())),
        )
    }
}

impl UniqueEntity for LuksContainer {
    fn gen_uuid(&mut self, rng: &mut dyn RngCore) {
        if self.uuid.is_empty() {
            self.uuid = new_random_uuid(rng).to_string();
        }
    }
}
