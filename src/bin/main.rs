//! RO-Crate engine CLI
//!
//! Command-line front end for inspecting, validating and packaging crates.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use rocrate_engine::{
    package, read_from_path, read_from_zip, CrateError, EntityGraph, PackageOptions, Strictness,
};

#[derive(Parser)]
#[command(name = "rocrate-engine")]
#[command(about = "Read, query and package RO-Crate metadata graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a crate and list its entities and context
    Inspect(InspectArgs),
    /// Read a crate strictly and report the first structural problem
    Validate(ValidateArgs),
    /// Package a crate directory into a zip archive
    Package(PackageArgs),
}

#[derive(Args)]
struct InspectArgs {
    /// Path to a metadata file or a .zip archive
    source: PathBuf,

    /// Keep going on structural problems and report them at the end
    #[arg(long)]
    lenient: bool,
}

#[derive(Args)]
struct ValidateArgs {
    /// Path to a metadata file or a .zip archive
    source: PathBuf,
}

#[derive(Args)]
struct PackageArgs {
    /// Crate directory containing the metadata descriptor
    directory: PathBuf,

    /// Replace an existing archive at the output path
    #[arg(long)]
    overwrite: bool,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,

    /// Collapse subdirectories into the archive root
    #[arg(long)]
    flatten: bool,

    /// Enumerate members without writing the archive
    #[arg(long)]
    dry_run: bool,
}

/// Dispatch on the source suffix: archives go through the zip reader.
fn read_source(source: &PathBuf, strictness: Strictness) -> Result<EntityGraph, CrateError> {
    if source.extension().is_some_and(|ext| ext == "zip") {
        read_from_zip(source, strictness)
    } else {
        read_from_path(source, strictness)
    }
}

fn run_inspect(args: InspectArgs) -> Result<(), CrateError> {
    let strictness = if args.lenient {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    let graph = read_source(&args.source, strictness)?;

    println!("{} entities", graph.len());
    for entity in graph.to_list() {
        let types = entity.entity_type.join(", ");
        println!("  {}  [{}]", entity.id, types);
    }

    let context = graph.get_all_context();
    println!("{} context entries", context.len());
    for entry in &context {
        println!("  {entry}");
    }

    for finding in graph.findings() {
        eprintln!("Finding: {finding}");
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CrateError> {
    let graph = read_source(&args.source, Strictness::Strict)?;
    graph.validate()?;
    eprintln!("{} is structurally valid", args.source.display());
    Ok(())
}

fn run_package(args: PackageArgs) -> Result<(), CrateError> {
    let options = PackageOptions {
        overwrite: args.overwrite,
        include_hidden: args.include_hidden,
        flatten: args.flatten,
        dry_run: args.dry_run,
    };
    let receipt = package(&args.directory, &options)?;

    if receipt.written {
        eprintln!(
            "Wrote {} ({} members)",
            receipt.archive_path.display(),
            receipt.members.len()
        );
    } else {
        eprintln!(
            "Dry run: would write {} with {} members",
            receipt.archive_path.display(),
            receipt.members.len()
        );
        for member in &receipt.members {
            println!("{member}");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Package(args) => run_package(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
