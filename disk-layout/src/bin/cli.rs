// SPDX-License-Identifier: GPL-3.0-only

//! CLI wrapper around the disk-layout library for inspecting templates

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use disk_layout::disk_types::{
    PartitionTableType, PartitionTypeInfo, bytes_to_pretty, get_all_partition_type_infos,
    pretty_to_bytes,
};
use disk_layout::{
    BOOTC_MOUNTPOINT_POLICIES, LayoutRequest, MOUNTPOINT_POLICIES, MountpointRequest,
    PartitionTable, PartitioningMode, check_mountpoints_policy, for_each_fstab_entity,
    new_partition_table, template,
};

/// Resolve partition table templates into disk image layouts
#[derive(Parser)]
#[command(name = "disk-layout-cli")]
#[command(about = "CLI tool for disk image layouts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template for a set of mountpoints
    Resolve {
        /// Template name or path to a template file
        template: String,
        /// Request file (TOML); flags below override its values
        #[arg(long)]
        request: Option<PathBuf>,
        /// Mountpoint to add, as PATH or PATH=SIZE (e.g. /home=2GiB)
        #[arg(long = "mountpoint", short = 'm')]
        mountpoints: Vec<String>,
        /// Minimum image size (e.g. 10GiB)
        #[arg(long)]
        image_size: Option<String>,
        /// Partitioning mode
        #[arg(long, value_parser = parse_mode)]
        mode: Option<PartitioningMode>,
        /// Seed for identifier generation
        #[arg(long)]
        seed: Option<u64>,
        /// Print the resolved table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check mountpoints against a policy
    Check {
        /// Mountpoints to check
        mountpoints: Vec<String>,
        /// Use the policy for bootable container images
        #[arg(long)]
        bootc: bool,
    },
    /// List the packages needed to build a template
    Packages {
        /// Template name or path to a template file
        template: String,
    },
    /// List known partition types
    Types {
        /// Partition table scheme (gpt or dos)
        #[arg(default_value = "gpt")]
        table: String,
    },
}

fn parse_mode(value: &str) -> std::result::Result<PartitioningMode, String> {
    match value {
        "raw" => Ok(PartitioningMode::Raw),
        "lvm" => Ok(PartitioningMode::Lvm),
        "auto" | "auto_lvm" | "auto-lvm" => Ok(PartitioningMode::AutoLvm),
        "btrfs" => Ok(PartitioningMode::Btrfs),
        other => Err(format!("unknown partitioning mode {other:?}")),
    }
}

fn load_template(name_or_path: &str) -> Result<PartitionTable> {
    let path = Path::new(name_or_path);
    let table = if path.exists() {
        template::load_from_path(path)
    } else {
        template::load_by_name(name_or_path)
    };
    table.with_context(|| format!("loading template {name_or_path}"))
}

fn parse_mountpoint(arg: &str) -> Result<MountpointRequest> {
    match arg.split_once('=') {
        Some((mountpoint, size)) => Ok(MountpointRequest::new(
            mountpoint,
            pretty_to_bytes(size).with_context(|| format!("invalid size for {mountpoint}"))?,
        )),
        None => Ok(MountpointRequest::new(arg, 0)),
    }
}

fn print_summary(table: &PartitionTable) -> Result<()> {
    println!(
        "{} table, {}",
        table.table_type,
        bytes_to_pretty(&table.size, true)
    );
    if !table.uuid.is_empty() {
        println!("  uuid {}", table.uuid);
    }

    for (index, partition) in table.partitions.iter().enumerate() {
        let type_name = PartitionTypeInfo::find_by_id(&partition.part_type)
            .map(|info| info.name)
            .unwrap_or_else(|| partition.part_type.clone());
        let payload = partition
            .payload
            .as_ref()
            .map(|payload| payload.kind().to_string())
            .unwrap_or_else(|| "raw".to_string());
        println!(
            "  {:>3}  start {:>12}  size {:>12}  {:<28} {}",
            index + 1,
            bytes_to_pretty(&partition.start, false),
            bytes_to_pretty(&partition.size, false),
            type_name,
            payload
        );
    }

    println!("fstab:");
    for_each_fstab_entity(table, |mountable, _| {
        let spec = mountable.fs_spec();
        let options = mountable.fstab_options();
        println!(
            "  UUID={} {} {} {} {} {}",
            spec.uuid,
            mountable.mountpoint(),
            mountable.fs_type(),
            options.mnt_ops,
            options.freq,
            options.pass_no
        );
        Ok(())
    })?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            template: template_name,
            request,
            mountpoints,
            image_size,
            mode,
            seed,
            json,
        } => {
            let base = load_template(&template_name)?;
            let mut request = match request {
                Some(path) => template::load_request(&path)
                    .with_context(|| format!("loading request {}", path.display()))?,
                None => LayoutRequest::default(),
            };
            for arg in &mountpoints {
                request.mountpoints.push(parse_mountpoint(arg)?);
            }
            if let Some(size) = image_size {
                request.image_size = pretty_to_bytes(&size)?;
            }
            if let Some(mode) = mode {
                request.mode = mode;
            }
            if let Some(seed) = seed {
                request.seed = seed;
            }

            let table = new_partition_table(&base, &request)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                print_summary(&table)?;
            }
        }
        Commands::Check { mountpoints, bootc } => {
            let policies = if bootc {
                &*BOOTC_MOUNTPOINT_POLICIES
            } else {
                &*MOUNTPOINT_POLICIES
            };
            check_mountpoints_policy(mountpoints.iter().map(String::as_str), policies)?;
            println!("{{\"success\": true}}");
        }
        Commands::Packages {
            template: template_name,
        } => {
            let table = load_template(&template_name)?;
            let json = serde_json::to_string(&table.get_build_packages())?;
            println!("{}", json);
        }
        Commands::Types { table } => {
            let table_type = PartitionTableType::parse(&table)
                .with_context(|| format!("unknown partition table type {table:?}"))?;
            for info in get_all_partition_type_infos(table_type) {
                let roles: Vec<&str> = info.roles.iter().map(|role| role.as_str()).collect();
                println!("{:<38} {:<28} {}", info.ty, info.name, roles.join(","));
            }
        }
    }

    Ok(())
}
