use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use slotbook_pack::PackReader;
use slotbook_registry::{ElementRegistry, RegistryConfig};
use slotbook_types::{ElementId, SlotPosition};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Init(args) => cmd_init(args, config),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
        Command::Tree(args) => cmd_tree(args, config, &cli.format),
        Command::Verify(args) => cmd_verify(args, config, &cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RegistryConfig> {
    let Some(path) = path else {
        return Ok(RegistryConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = RegistryConfig::from_toml_str(&text)?;
    debug!(path = %path.display(), history_limit = config.history_limit, "config loaded");
    Ok(config)
}

fn open_registry(path: &Path, config: RegistryConfig) -> anyhow::Result<ElementRegistry> {
    let mut registry = ElementRegistry::with_config(config);
    registry
        .load_from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(registry)
}

fn cmd_init(args: InitArgs, config: RegistryConfig) -> anyhow::Result<()> {
    if args.path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.path.display());
    }
    let registry = ElementRegistry::with_config(config);
    registry
        .save_to_file(&args.path)
        .with_context(|| format!("writing {}", args.path.display()))?;
    println!(
        "{} Initialized container {}",
        "✓".green().bold(),
        args.path.display().to_string().bold()
    );
    println!("  Root: {}", registry.root_id().to_string().cyan());
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let reader = PackReader::open(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let header = reader.header();
    let directory = reader.directory();

    if let OutputFormat::Json = format {
        let doc = serde_json::json!({ "header": header, "directory": directory });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{} {}", "Container".bold(), args.path.display());
    println!("  Magic: {}  Version: {}", header.magic.cyan(), header.version);
    println!("  Header blocks: {}", header.header_blocks);
    println!("  Items: {}", directory.len());
    for entry in directory.entries() {
        println!(
            "  {:>6}  {:<14} {:>8} bytes  blocks {}",
            entry.id.to_string().yellow(),
            entry.kind,
            entry.size,
            block_ranges(&entry.blocks).dimmed()
        );
    }
    Ok(())
}

/// Collapse consecutive block numbers into `a-b` runs.
fn block_ranges(blocks: &[u64]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut iter = blocks.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            runs.push(start.to_string());
        } else {
            runs.push(format!("{start}-{end}"));
        }
    }
    runs.join(",")
}

#[derive(Debug, Serialize)]
struct TreeNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    slot: Option<SlotPosition>,
    id: ElementId,
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    repeated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

fn build_tree(
    registry: &ElementRegistry,
    id: ElementId,
    slot: Option<SlotPosition>,
    depth: usize,
    max_depth: Option<usize>,
    seen: &mut BTreeSet<ElementId>,
) -> TreeNode {
    let Ok(element) = registry.element(id) else {
        return TreeNode {
            slot,
            id,
            name: String::new(),
            kind: "missing".into(),
            repeated: false,
            children: Vec::new(),
        };
    };
    let mut node = TreeNode {
        slot,
        id,
        name: element.name.clone(),
        kind: element.kind().to_string(),
        repeated: !seen.insert(id),
        children: Vec::new(),
    };
    if node.repeated || max_depth.is_some_and(|max| depth >= max) {
        return node;
    }
    for (position, child) in element.occupied_slots() {
        node.children.push(build_tree(
            registry,
            child,
            Some(position),
            depth + 1,
            max_depth,
            seen,
        ));
    }
    node
}

fn print_tree(node: &TreeNode, indent: usize, current: ElementId) {
    let pad = "  ".repeat(indent);
    let slot = node
        .slot
        .map(|s| format!("[{s}] "))
        .unwrap_or_default();
    let marker = if node.id == current { " *".green().bold().to_string() } else { String::new() };
    if node.kind == "missing" {
        println!("{pad}{slot}{} {}", node.id.to_string().red(), "(missing)".red());
        return;
    }
    let suffix = if node.repeated { " (see above)".dimmed().to_string() } else { String::new() };
    println!(
        "{pad}{slot}{} {} {}{suffix}{marker}",
        node.id.to_string().yellow(),
        node.kind.cyan(),
        node.name.bold()
    );
    for child in &node.children {
        print_tree(child, indent + 1, current);
    }
}

fn cmd_tree(args: TreeArgs, config: RegistryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let registry = open_registry(&args.path, config)?;
    let mut seen = BTreeSet::new();
    let tree = build_tree(
        &registry,
        registry.root_id(),
        None,
        0,
        args.max_depth,
        &mut seen,
    );
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
        OutputFormat::Text => print_tree(&tree, 0, registry.current_id()),
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, config: RegistryConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let registry = open_registry(&args.path, config)?;
    let report = registry.integrity_report();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text if report.is_clean() => {
            println!("{} Reference integrity verified", "✓".green().bold());
            println!("  Elements: {}", registry.len());
            println!("  Reachable: {}", registry.reachable_from_root().len());
        }
        OutputFormat::Text => {
            for id in &report.unreachable {
                println!("  {} element {} is unreachable from the root", "✗".red(), id);
            }
            for slot in &report.dangling {
                println!(
                    "  {} slot {} of {} points at missing element {}",
                    "✗".red(),
                    slot.position,
                    slot.owner,
                    slot.target
                );
            }
        }
    }
    if !report.is_clean() {
        bail!(
            "integrity check failed: {} unreachable, {} dangling",
            report.unreachable.len(),
            report.dangling.len()
        );
    }
    Ok(())
}
