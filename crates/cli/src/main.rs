//! SoC memory partition CLI.
//!
//! This binary is a thin front end over `socmap-core`. It performs:
//! 1. **Inspection:** List the memory blocks of a SoC, assignable projects, and per-type usage.
//! 2. **Validation:** Check a saved partition list, reporting errors per field.
//! 3. **Editing:** Add or remove a partition and write the updated list.
//! 4. **Layout:** Emit the occupancy-bar geometry as JSON.
//!
//! Files are read and written here; every rule lives in the library.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use socmap_core::common::units::{format_bytes, format_total_and_available, min_alignment_label};
use socmap_core::common::{Addr, ByteUnit, StoreError};
use socmap_core::layout;
use socmap_core::partition::usage;
use socmap_core::partition::{Access, FieldErrors, partitions_from_json, partitions_to_json};
use socmap_core::soc::ProjectInfo;
use socmap_core::{Config, CoreMemoryAccess, Partition, PartitionCore, PartitionPatch, PartitionStore, SocDescriptor, Topology, Validator};

#[derive(Parser, Debug)]
#[command(
    name = "socmap",
    author,
    version,
    about = "Allocate and validate memory partitions on a multi-core SoC",
    long_about = "Inspect SoC memory blocks, validate partition lists, and add or remove partitions.\n\nExamples:\n  socmap blocks --soc max32690.json\n  socmap validate --soc max32690.json --partitions partitions.json\n  socmap add --soc max32690.json --partitions partitions.json --name boot --type Flash --core CM4:R/X --size 64 --unit KB --block flash0"
)]
struct Cli {
    /// SoC description (JSON with `Cores` and `MemoryTypes`).
    #[arg(long, global = true)]
    soc: Option<PathBuf>,

    /// Engine configuration (JSON); defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List memory blocks, optionally with the free space left by a partition list.
    Blocks {
        /// Only blocks of this memory type.
        #[arg(long = "type")]
        mem_type: Option<String>,

        /// Partition list (JSON) used to report free space.
        #[arg(long)]
        partitions: Option<PathBuf>,
    },

    /// List the projects that can be assigned to a partition of a memory type.
    Cores {
        /// Project list (JSON with `ProjectId`, `CoreId`).
        #[arg(long)]
        projects: PathBuf,

        /// Memory type.
        #[arg(long = "type")]
        mem_type: String,
    },

    /// Validate every partition of a list against its siblings.
    Validate {
        /// Partition list (JSON).
        #[arg(long)]
        partitions: PathBuf,

        /// Print the per-partition results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report total and available memory per memory type.
    Usage {
        /// Partition list (JSON).
        #[arg(long)]
        partitions: Option<PathBuf>,
    },

    /// Add a partition and write the updated list.
    Add {
        /// Partition list (JSON); a missing file is treated as empty.
        #[arg(long)]
        partitions: PathBuf,

        /// Partition name.
        #[arg(long)]
        name: String,

        /// Memory type.
        #[arg(long = "type")]
        mem_type: String,

        /// Assigned core as `CORE[:ACCESS[:PROJECT]]`, repeatable. Access defaults to `R`.
        #[arg(long = "core", value_parser = parse_core, required = true)]
        cores: Vec<PartitionCore>,

        /// Core that owns the partition; a lone core always owns it.
        #[arg(long)]
        owner: Option<String>,

        /// Start address (hex).
        #[arg(long, value_parser = Addr::parse_hex, conflicts_with = "block")]
        address: Option<Addr>,

        /// Place the partition at the first free address of this block.
        #[arg(long)]
        block: Option<String>,

        /// Size, in `--unit`.
        #[arg(long)]
        size: u64,

        /// Unit of `--size` (`bytes`, `KB`, `MB`); defaults to the configured unit.
        #[arg(long, value_parser = parse_unit)]
        unit: Option<ByteUnit>,

        /// Write the result here instead of back to `--partitions`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Remove the partition starting at an address and write the updated list.
    Remove {
        /// Partition list (JSON).
        #[arg(long)]
        partitions: PathBuf,

        /// Start address (hex) of the partition to remove.
        #[arg(long, value_parser = Addr::parse_hex)]
        address: Addr,

        /// Write the result here instead of back to `--partitions`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Emit block widths, partition segments and free gaps as JSON.
    Layout {
        /// Partition list (JSON).
        #[arg(long)]
        partitions: Option<PathBuf>,

        /// Only blocks of this memory type.
        #[arg(long = "type")]
        mem_type: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.general.log_filter);

    let soc_path = cli.soc.as_deref().context("--soc is required")?;
    let topology = Arc::new(load_topology(soc_path, &config)?);

    match cli.command {
        Commands::Blocks {
            mem_type,
            partitions,
        } => {
            let partitions = load_partitions(partitions.as_deref())?;
            cmd_blocks(&topology, &partitions, mem_type.as_deref(), &config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cores { projects, mem_type } => cmd_cores(&topology, &projects, &mem_type),
        Commands::Validate { partitions, json } => {
            let partitions = load_partitions(Some(&partitions))?;
            cmd_validate(&topology, &partitions, json)
        }
        Commands::Usage { partitions } => {
            let partitions = load_partitions(partitions.as_deref())?;
            cmd_usage(&topology, &partitions, &config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Add {
            partitions,
            name,
            mem_type,
            cores,
            owner,
            address,
            block,
            size,
            unit,
            output,
        } => {
            let unit = unit.unwrap_or(config.display.default_unit);
            let request = AddRequest {
                name,
                mem_type,
                cores,
                owner,
                address,
                block,
                size_bytes: size
                    .checked_mul(unit.factor())
                    .context("--size overflows a 64-bit byte count")?,
                unit,
            };
            let out = output.as_deref().unwrap_or(&partitions);
            cmd_add(topology, &partitions, request, out)
        }
        Commands::Remove {
            partitions,
            address,
            output,
        } => {
            let out = output.as_deref().unwrap_or(&partitions);
            cmd_remove(topology, &partitions, address, out)
        }
        Commands::Layout {
            partitions,
            mem_type,
        } => {
            let partitions = load_partitions(partitions.as_deref())?;
            cmd_layout(&topology, &partitions, mem_type.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    Config::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn load_topology(path: &Path, config: &Config) -> Result<Topology> {
    let text = fs::read_to_string(path).with_context(|| format!("reading SoC description {}", path.display()))?;
    let soc = SocDescriptor::from_json(&text)?;
    let topology = Topology::from_soc(&soc, &config.topology)
        .with_context(|| format!("building memory topology from {}", path.display()))?;
    debug!(blocks = topology.blocks().len(), "loaded SoC");
    Ok(topology)
}

fn load_partitions(path: Option<&Path>) -> Result<Vec<Partition>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading partitions {}", path.display()))?;
    partitions_from_json(&text).with_context(|| format!("parsing partitions {}", path.display()))
}

fn save_partitions(path: &Path, partitions: &[Partition]) -> Result<()> {
    let text = partitions_to_json(partitions)?;
    fs::write(path, text + "\n").with_context(|| format!("writing partitions {}", path.display()))?;
    info!(path = %path.display(), count = partitions.len(), "partitions saved");
    Ok(())
}

/// Parses `CORE[:ACCESS[:PROJECT]]`.
fn parse_core(spec: &str) -> Result<PartitionCore, String> {
    let mut parts = spec.splitn(3, ':');
    let core_id = parts
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "core id is empty".to_string())?;
    let access = parts.next().map_or(Ok(Access::Read), str::parse)?;
    let project_id = parts.next().unwrap_or(core_id);
    Ok(PartitionCore {
        project_id: project_id.to_string(),
        core_id: core_id.to_string(),
        label: core_id.to_string(),
        access,
        owner: false,
    })
}

fn parse_unit(label: &str) -> Result<ByteUnit, String> {
    ByteUnit::from_label(label).ok_or_else(|| format!("unknown unit `{label}` (expected bytes, KB or MB)"))
}

fn cmd_blocks(topology: &Topology, partitions: &[Partition], mem_type: Option<&str>, config: &Config) {
    let core_ids: Vec<&str> = topology.cores().map(|c| c.id.as_str()).collect();
    let whole = config.display.whole_numbers;

    for block in topology.blocks() {
        if mem_type.is_some_and(|t| t != block.mem_type) {
            continue;
        }
        let available = usage::available_memory(block, partitions);
        let alignment = block
            .alignment()
            .map_or_else(|| "-".to_string(), min_alignment_label);
        println!(
            "{:<16} {:<8} {}-{} {:>10}  {:<6} align {:<10} free {}",
            block.name,
            block.mem_type,
            block.address_start,
            block.address_end,
            format_bytes(block.size(), whole),
            block.access,
            alignment,
            format_total_and_available(block.size(), available, whole),
        );
        for alias in topology.aliases_for(&block.name, &core_ids) {
            println!(
                "    alias {:<10} {:<10} {}",
                alias.core_id, alias.alias_type, alias.alias_base_address
            );
        }
    }
}

fn cmd_cores(topology: &Topology, projects_path: &Path, mem_type: &str) -> Result<ExitCode> {
    let text = fs::read_to_string(projects_path)
        .with_context(|| format!("reading projects {}", projects_path.display()))?;
    let projects: Vec<ProjectInfo> = serde_json::from_str(&text)
        .with_context(|| format!("parsing projects {}", projects_path.display()))?;

    let assignable = topology.assignable_cores(&projects, mem_type);
    if assignable.is_empty() {
        eprintln!("no project can reach memory of type `{mem_type}`");
        return Ok(ExitCode::FAILURE);
    }
    for project in assignable {
        let label = topology
            .core_label(&project.core_id)
            .unwrap_or_else(|| project.core_id.clone());
        let world = match project.secure {
            Some(true) => " (secure)",
            Some(false) => " (non-secure)",
            None => "",
        };
        println!("{:<20} {label}{world}", project.project_id);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(topology: &Topology, partitions: &[Partition], as_json: bool) -> Result<ExitCode> {
    let validator = Validator::new(topology);
    let mut all_valid = true;
    let mut report = Vec::with_capacity(partitions.len());

    for (i, partition) in partitions.iter().enumerate() {
        let siblings: Vec<Partition> = partitions
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, p)| p.clone())
            .collect();
        let result = validator.validate(partition, &siblings, topology.blocks_for_type(&partition.mem_type));
        all_valid &= result.valid;

        if as_json {
            report.push(json!({ "displayName": partition.display_name, "result": result }));
        } else if result.valid {
            println!("{}: ok", partition.display_name);
        } else {
            println!("{}:", partition.display_name);
            print_field_errors(&result.errors);
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_usage(topology: &Topology, partitions: &[Partition], config: &Config) {
    let whole = config.display.whole_numbers;
    for mem_type in topology.memory_type_names() {
        let total = usage::total_block_memory(topology.blocks_for_type(mem_type));
        let used = usage::total_for_type(partitions, mem_type);
        let volatility = match topology.is_volatile(mem_type) {
            Some(true) => "volatile",
            Some(false) => "non-volatile",
            None => "unclassified",
        };
        println!(
            "{mem_type:<10} {:<14} {}",
            volatility,
            format_total_and_available(total, total.saturating_sub(used), whole)
        );
    }

    let volatile = usage::volatile_partitions(partitions, topology.memory_types());
    let non_volatile = usage::non_volatile_partitions(partitions, topology.memory_types());
    println!(
        "partitions: {} volatile ({}), {} non-volatile ({})",
        volatile.len(),
        format_bytes(usage::total_partition_size(volatile.iter().copied()), whole),
        non_volatile.len(),
        format_bytes(usage::total_partition_size(non_volatile.iter().copied()), whole),
    );
}

struct AddRequest {
    name: String,
    mem_type: String,
    cores: Vec<PartitionCore>,
    owner: Option<String>,
    address: Option<Addr>,
    block: Option<String>,
    size_bytes: u64,
    unit: ByteUnit,
}

fn cmd_add(topology: Arc<Topology>, partitions_path: &Path, request: AddRequest, out: &Path) -> Result<ExitCode> {
    let existing = if partitions_path.exists() {
        load_partitions(Some(partitions_path))?
    } else {
        Vec::new()
    };

    let mut cores = request.cores;
    for core in &mut cores {
        if let Some(label) = topology.core_label(&core.core_id) {
            core.label = label;
        }
        core.owner = request.owner.as_deref() == Some(core.core_id.as_str());
    }

    let mut store = PartitionStore::with_partitions(topology, existing);
    store.open_for_create();
    store.change_active_type(&request.mem_type)?;
    store.assign_active_cores(cores)?;
    store.update_active(
        PartitionPatch::new()
            .display_name(request.name)
            .size(request.size_bytes)
            .display_unit(Some(request.unit)),
    )?;
    match (request.address, request.block) {
        (Some(address), _) => store.update_active(PartitionPatch::new().start_address(Some(address)))?,
        (None, Some(block)) => store.select_active_block(&block)?,
        (None, None) => bail!("either --address or --block is required"),
    }

    match store.commit_create() {
        Ok(()) => {
            save_partitions(out, store.partitions())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(StoreError::Invalid(errors)) => {
            eprintln!("partition rejected:");
            print_field_errors(&errors);
            Ok(ExitCode::FAILURE)
        }
        Err(other) => Err(other.into()),
    }
}

fn cmd_remove(topology: Arc<Topology>, partitions_path: &Path, address: Addr, out: &Path) -> Result<ExitCode> {
    let existing = load_partitions(Some(partitions_path))?;
    let mut store = PartitionStore::with_partitions(topology, existing);
    if store.remove(address).is_none() {
        eprintln!("no partition starts at {address}");
        return Ok(ExitCode::FAILURE);
    }
    save_partitions(out, store.partitions())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_layout(topology: &Topology, partitions: &[Partition], mem_type: Option<&str>) -> Result<()> {
    let mut types = Vec::new();
    for name in topology.memory_type_names() {
        if mem_type.is_some_and(|t| t != name) {
            continue;
        }
        let blocks = topology.blocks_for_type(name);

        let block_entries: Vec<_> = blocks
            .iter()
            .map(|block| {
                let in_block = usage::partitions_in_block(partitions, block);
                json!({
                    "name": block.name,
                    "width": layout::block_width(block, blocks),
                    "partitions": in_block.iter().map(|p| {
                        let seg = layout::single_block_segment(p, block);
                        json!({
                            "displayName": p.display_name,
                            "offset": seg.offset,
                            "width": seg.width,
                            "borderRadius": seg.radius.css(),
                        })
                    }).collect::<Vec<_>>(),
                    "freeGaps": layout::free_gaps(block, partitions).iter().map(|g| json!({
                        "address": g.address,
                        "endAddress": g.end_address,
                        "offset": g.offset,
                        "width": g.width,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        let spans: Vec<_> = layout::partitions_of_type(blocks, partitions)
            .into_iter()
            .filter_map(|p| {
                let seg = layout::multi_block_segment(p, blocks)?;
                Some(json!({
                    "displayName": p.display_name,
                    "offset": seg.offset,
                    "width": seg.width,
                    "atStart": layout::starts_at_origin(p, blocks),
                    "atEnd": layout::reaches_end(p, blocks),
                }))
            })
            .collect();

        types.push(json!({ "type": name, "blocks": block_entries, "partitions": spans }));
    }
    println!("{}", serde_json::to_string_pretty(&types)?);
    Ok(())
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, error) in errors.iter() {
        println!("  {field}: {error}");
    }
}
