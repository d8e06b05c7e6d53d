//! Level-5 CLI - Tool for inspecting, extracting and packing XPCK archives.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use level5::pipeline::{
    load_package, open_archive, write_archive, EntryKind, LoadOptions, Package,
    RESOURCE_TABLE_NAME,
};
use level5::util::hash_name;
use level5::xpck::{Archive, ArchiveEntry};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_DATE: &str = env!("LEVEL5_BUILD_DATE");
const BUILD_TIME: &str = env!("LEVEL5_BUILD_TIME");

fn init_logging(level: &str) {
    // RUST_LOG wins over the command-line verbosity
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        // Info command - archive summary
        "info" | "i" => match positional(&filtered_args, 1) {
            Some(path) => cmd_info(path, has_flag(&filtered_args, &["--json", "-j"])),
            None => usage("level5 info <file.xc> [--json]"),
        },

        // List command - entries with kinds and sizes
        "list" | "l" => match positional(&filtered_args, 1) {
            Some(path) => cmd_list(path),
            None => usage("level5 list <file.xc>"),
        },

        // Extract command - raw entries, optionally textures as PNG
        "extract" | "x" => match (positional(&filtered_args, 1), positional(&filtered_args, 2)) {
            (Some(path), Some(dir)) => cmd_extract(path, dir, has_flag(&filtered_args, &["--png"])),
            _ => usage("level5 extract <file.xc> <dir> [--png]"),
        },

        // Pack command - directory of blobs into an archive
        "pack" | "p" => match (positional(&filtered_args, 1), positional(&filtered_args, 2)) {
            (Some(dir), Some(out)) => cmd_pack(dir, out),
            _ => usage("level5 pack <dir> <out.xc>"),
        },

        // Hash command - content hashes of names
        "hash" => {
            if filtered_args.len() < 2 {
                usage("level5 hash <name>...")
            } else {
                for name in &filtered_args[1..] {
                    println!("{} {}", hash_name(name), name);
                }
                Ok(())
            }
        }

        "version" | "--version" | "-V" => {
            println!("level5 {} (built {} {})", VERSION, BUILD_DATE, BUILD_TIME);
            Ok(())
        }

        // Help
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other, false)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Positional argument `n`, skipping flags.
fn positional<'a>(args: &[&'a str], n: usize) -> Option<&'a str> {
    args.iter().filter(|a| !a.starts_with('-')).nth(n).copied()
}

fn has_flag(args: &[&str], names: &[&str]) -> bool {
    args.iter().any(|a| names.contains(a))
}

fn usage(text: &str) -> anyhow::Result<()> {
    bail!("missing arguments\nUsage: {}", text)
}

fn print_help() {
    println!("level5 - Level-5 archive toolkit ({} {})", VERSION, BUILD_DATE);
    println!();
    println!("USAGE:");
    println!("    level5 [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file> [--json]      Show bones, textures, animations and warnings");
    println!("    l, list    <file>               List entries with kind and size");
    println!("    x, extract <file> <dir> [--png] Write every entry to a directory");
    println!("    p, pack    <dir> <out>          Pack a directory of blobs into an archive");
    println!("    hash       <name>...            Print content hashes");
    println!("    version                         Show version and build date");
    println!("    h, help                         Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides the verbosity flags");
    println!("    - Passing a file directly is equivalent to 'info'");
    println!("    - --png requires the 'png' feature");
}

fn cmd_info(path: &str, json_mode: bool) -> anyhow::Result<()> {
    let archive = open_archive(path).with_context(|| format!("failed to open {}", path))?;
    let package = load_package(&archive, &LoadOptions::default())
        .with_context(|| format!("failed to load {}", path))?;
    debug!("package loaded with {} warnings", package.warnings.len());

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&package_json(path, &archive, &package))?);
        return Ok(());
    }

    println!("Archive: {}", path);
    println!("Entries: {}", archive.len());
    println!("Table:   {:?}", package.resources.kind());
    println!();

    println!("Bones: {}", package.bone_names.len());
    for i in package.skeleton.topological_order() {
        let indent = "  ".repeat(package.skeleton.depth(i) + 1);
        println!("{}{}", indent, package.bone_names[i]);
    }

    println!("Textures: {}", package.textures.len());
    for t in &package.textures {
        let image = &t.texture.image;
        println!("  {:<24} {:>4}x{:<4} {}", t.name, image.width(), image.height(), t.texture.format);
    }

    println!("Materials: {}", package.materials.len());
    for m in &package.materials {
        println!("  {:<24} [{}]", m.name, m.textures.join(", "));
    }

    println!("Animations: {}", package.animations.len());
    for a in &package.animations {
        let clip = a.motion.clip();
        println!(
            "  {:<24} {:?}, {} frames, {} bones, {} tracks",
            clip.name,
            a.motion.generation(),
            clip.frame_count,
            clip.bones.len(),
            clip.tracks.len()
        );
    }

    if !package.splits.is_empty() {
        println!("Splits: {}", package.splits.len());
        for s in &package.splits {
            println!(
                "  {:<24} {}..{} ({} frames) of {}",
                s.info.name,
                s.info.frame_start,
                s.info.frame_end,
                s.info.duration(),
                s.parent_name.as_deref().unwrap_or("?")
            );
        }
    }
    if !package.cameras.is_empty() {
        println!("Cameras: {}", package.cameras.len());
    }
    if !package.meshes.is_empty() {
        println!("Meshes (raw): {}", package.meshes.len());
    }

    if !package.warnings.is_empty() {
        println!();
        println!("Warnings: {}", package.warnings.len());
        for w in &package.warnings {
            println!("  {}", w);
        }
    }
    Ok(())
}

fn package_json(path: &str, archive: &Archive, package: &Package) -> serde_json::Value {
    let bones: Vec<serde_json::Value> = package
        .bone_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let t = package.skeleton.bones()[i].transform();
            serde_json::json!({
                "name": name,
                "parent": package.parent_name(i),
                "translation": t.translation.to_array(),
                "rotation": t.rotation.to_array(),
                "scale": t.scale.to_array()
            })
        })
        .collect();

    let textures: Vec<serde_json::Value> = package
        .textures
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "entry": t.entry,
                "format": t.texture.format.name(),
                "width": t.texture.image.width(),
                "height": t.texture.image.height(),
                "alpha": t.texture.has_alpha
            })
        })
        .collect();

    let materials: Vec<serde_json::Value> = package
        .materials
        .iter()
        .map(|m| serde_json::json!({ "name": m.name, "textures": m.textures }))
        .collect();

    let animations: Vec<serde_json::Value> = package
        .animations
        .iter()
        .map(|a| {
            let clip = a.motion.clip();
            serde_json::json!({
                "name": clip.name,
                "generation": format!("{:?}", a.motion.generation()),
                "frames": clip.frame_count,
                "bones": a.bone_names
            })
        })
        .collect();

    let splits: Vec<serde_json::Value> = package
        .splits
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.info.name,
                "parent": s.parent_name,
                "frame_start": s.info.frame_start,
                "frame_end": s.info.frame_end
            })
        })
        .collect();

    let warnings: Vec<String> = package.warnings.iter().map(|w| w.to_string()).collect();

    serde_json::json!({
        "archive": path,
        "entries": archive.names().collect::<Vec<_>>(),
        "bones": bones,
        "textures": textures,
        "materials": materials,
        "animations": animations,
        "splits": splits,
        "warnings": warnings
    })
}

fn cmd_list(path: &str) -> anyhow::Result<()> {
    let archive = open_archive(path).with_context(|| format!("failed to open {}", path))?;
    println!("{:<24} {:<16} {:>10}", "NAME", "KIND", "SIZE");
    for entry in &archive {
        let kind = EntryKind::from_name(&entry.name);
        println!("{:<24} {:<16} {:>10}", entry.name, format!("{:?}", kind), entry.data.len());
    }
    println!();
    println!("{} entries", archive.len());
    Ok(())
}

fn cmd_extract(path: &str, dir: &str, png: bool) -> anyhow::Result<()> {
    let archive = open_archive(path).with_context(|| format!("failed to open {}", path))?;
    let out_dir = Path::new(dir);
    // Check every name before writing anything
    let targets = archive
        .iter()
        .map(|entry| output_path(out_dir, &entry.name))
        .collect::<anyhow::Result<Vec<_>>>()?;
    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {}", dir))?;

    for (entry, target) in archive.iter().zip(targets) {
        fs::write(&target, &entry.data).with_context(|| format!("failed to write {}", target.display()))?;
        debug!("extracted {} ({} bytes)", entry.name, entry.data.len());
    }
    info!("extracted {} entries to {}", archive.len(), dir);

    if png {
        export_png(&archive, out_dir)?;
    }
    Ok(())
}

/// Join a name from the archive onto the output directory.
///
/// The name must be a single plain file name: no separators, no `..`, no root.
fn output_path(out_dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.contains(&['/', '\\'][..]) {
        bail!("refusing to extract {:?}: not a plain file name", name);
    }
    Ok(out_dir.join(name))
}

#[cfg(feature = "png")]
fn export_png(archive: &Archive, out_dir: &Path) -> anyhow::Result<()> {
    let package = load_package(archive, &LoadOptions::default())?;
    for t in &package.textures {
        let Some(image) = t.texture.image.to_rgba_image() else {
            warn!("skipping {}: empty image", t.name);
            continue;
        };
        let target = output_path(out_dir, &format!("{}.png", t.name))?;
        image
            .save(&target)
            .with_context(|| format!("failed to write {}", target.display()))?;
        info!("wrote {}", target.display());
    }
    Ok(())
}

#[cfg(not(feature = "png"))]
fn export_png(_archive: &Archive, _out_dir: &Path) -> anyhow::Result<()> {
    bail!("PNG export not available. Rebuild with: cargo build --features png")
}

fn cmd_pack(dir: &str, out: &str) -> anyhow::Result<()> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    // Sorted by name with the resource table last
    names.sort_by_key(|n| (n.eq_ignore_ascii_case(RESOURCE_TABLE_NAME), n.clone()));

    let mut archive = Archive::new();
    for name in names {
        let data = fs::read(Path::new(dir).join(&name))?;
        if let EntryKind::Unrecognized = EntryKind::from_name(&name) {
            warn!("{} has no known extension; packing as-is", name);
        }
        archive.push_entry(ArchiveEntry::new(name, data))?;
    }
    if archive.is_empty() {
        bail!("{} contains no files", dir);
    }

    // Every entry must decode before it is packed
    let package = load_package(&archive, &LoadOptions::default())
        .with_context(|| format!("{} does not load as a package", dir))?;
    if !package.warnings.is_empty() {
        info!("{} unresolved references", package.warnings.len());
    }

    write_archive(out, &archive).with_context(|| format!("failed to write {}", out))?;
    println!("Packed {} entries into {}", archive.len(), out);
    Ok(())
}
