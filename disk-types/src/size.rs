// SPDX-License-Identifier: GPL-3.0-only

//! Serde helpers for byte sizes
//!
//! Sizes are always serialized as plain integers. On input they may also be
//! given as strings understood by [`pretty_to_bytes`], e.g. `"512 MiB"`.
//!
//! ```ignore
//! #[serde(with = "disk_types::size")]
//! pub size: u64,
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

use crate::common::pretty_to_bytes;

pub fn serialize<S>(size: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(*size)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(SizeVisitor)
}

struct SizeVisitor;

impl Visitor<'_> for SizeVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a size in bytes or a string like \"2 GiB\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
        Ok(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
        u64::try_from(value).map_err(|_| E::custom(format!("negative size: {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
        pretty_to_bytes(value).map_err(|e| E::custom(e.to_string()))
    }
}
