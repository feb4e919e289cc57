// SPDX-License-Identifier: GPL-3.0-only

use super::PartitionTypeInfo;
use serde::Deserialize;

// Load TOML data at compile time from the workspace resources directory
const GPT_TOML: &str = include_str!("../../../resources/types/gpt_types.toml");
const DOS_TOML: &str = include_str!("../../../resources/types/dos_types.toml");

#[derive(Deserialize)]
struct PartitionTypeCatalog {
    types: Vec<PartitionTypeInfo>,
}

/// Every partition type the engine knows, gpt entries first
pub static PARTITION_TYPES: std::sync::LazyLock<Vec<PartitionTypeInfo>> =
    std::sync::LazyLock::new(|| {
        [GPT_TOML, DOS_TOML]
            .into_iter()
            .filter_map(|raw| toml::from_str::<PartitionTypeCatalog>(raw).ok())
            .flat_map(|catalog| catalog.types)
            .collect()
    });
