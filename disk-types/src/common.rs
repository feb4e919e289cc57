// SPDX-License-Identifier: GPL-3.0-only

//! Common size units and helpers shared across the layout engine

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;
pub const TIB: u64 = 1024 * GIB;

/// Default sector size in bytes
pub const DEFAULT_SECTOR_SIZE: u64 = 512;

/// Default grain (1 MiB). Partition starts and sizes are rounded up to it.
pub const DEFAULT_GRAIN_BYTES: u64 = MIB;

/// Largest size the layout engine handles (1 EiB)
pub const MAX_LAYOUT_SIZE: u64 = 1024 * 1024 * TIB;

/// Round `size` up to the next multiple of `grain`, or `None` if that does
/// not fit in a `u64`.
///
/// Already aligned values are returned unchanged. A zero grain disables
/// alignment.
pub fn checked_align_up(size: u64, grain: u64) -> Option<u64> {
    if grain == 0 || size % grain == 0 {
        return Some(size);
    }
    (size / grain).checked_add(1)?.checked_mul(grain)
}

/// Round `size` up to the next multiple of `grain`.
///
/// Saturates at the largest multiple of `grain` that fits in a `u64`.
pub fn align_up(size: u64, grain: u64) -> u64 {
    checked_align_up(size, grain).unwrap_or(u64::MAX - u64::MAX % grain)
}

/// A byte range representing a contiguous region of a disk image
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    /// Start byte (inclusive)
    pub start: u64,

    /// End byte (exclusive)
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    /// Check if this range is valid for a disk of the given size
    pub fn is_valid_for_disk(&self, disk_size: u64) -> bool {
        self.start < self.end && self.end <= disk_size
    }

    /// Whether the two ranges share at least one byte
    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Get the size of this range in bytes
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// Convert bytes to human-readable format (e.g., "1.50 GiB")
pub fn bytes_to_pretty(bytes: &u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = *bytes as f64;

    while val >= 1024. && steps < 6 {
        val /= 1024.;
        steps += 1;
    }

    let unit = match steps {
        0 => "B",
        1 => "KiB",
        2 => "MiB",
        3 => "GiB",
        4 => "TiB",
        5 => "PiB",
        _ => "EiB",
    };

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, unit, bytes_str)
    } else {
        format!("{:.2} {}", val, unit)
    }
}

/// Parse human-readable format to bytes (e.g., "1.5 GiB" -> bytes)
///
/// Binary units are accepted with or without the `i` ("GB" and "GiB" both
/// mean 1024^3). A bare number is taken as bytes.
pub fn pretty_to_bytes(pretty: &str) -> Result<u64> {
    let trimmed = pretty.trim();
    let split_at = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);

    if number.is_empty() {
        return Err(anyhow::anyhow!("Invalid size: {:?}", pretty));
    }

    let val: f64 = number.parse()?;

    let steps = match unit.trim() {
        "" | "B" => 0,
        "K" | "KB" | "KiB" => 1,
        "M" | "MB" | "MiB" => 2,
        "G" | "GB" | "GiB" => 3,
        "T" | "TB" | "TiB" => 4,
        "P" | "PB" | "PiB" => 5,
        other => return Err(anyhow::anyhow!("Invalid unit: {}", other)),
    };

    let bytes = val * 1024_f64.powi(steps);
    if bytes >= u64::MAX as f64 {
        return Err(anyhow::anyhow!("Size out of range: {:?}", pretty));
    }
    Ok(bytes as u64)
}
