//! Rename exported DSpace bundles after the handle in their metadata.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dspace_migrate::logging::{LogConfig, init_logging};
use dspace_migrate::rename::{RenameOutcome, RenameReport};
use dspace_migrate::{BundleRenamer, ConflictPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rename-bundles",
    version,
    about = "Rename bundles exported from DSpace after their handle identifier"
)]
struct Cli {
    /// Location of bundles exported from DSpace.
    #[arg(short = 'b', long = "bundle_location", value_name = "FOLDER")]
    bundle_location: PathBuf,

    /// Enable debug logging.
    #[arg(short = 'g', long = "debug")]
    debug: bool,

    /// What to do when a bundle's target directory already exists.
    #[arg(long = "on_conflict", value_enum, default_value = "fail")]
    on_conflict: ConflictArg,

    /// Report the renames without performing them.
    #[arg(long = "dry_run")]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConflictArg {
    Fail,
    Overwrite,
    Skip,
}

impl From<ConflictArg> for ConflictPolicy {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Fail => ConflictPolicy::Fail,
            ConflictArg::Overwrite => ConflictPolicy::Overwrite,
            ConflictArg::Skip => ConflictPolicy::Skip,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(&LogConfig::from_debug(cli.debug)) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(&cli) {
        Ok(report) => {
            print_summary(&report, cli.dry_run);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<RenameReport> {
    BundleRenamer::new(cli.bundle_location.as_path())
        .with_conflict_policy(cli.on_conflict.into())
        .with_dry_run(cli.dry_run)
        .rename_all()
        .with_context(|| format!("failed to rename bundles in {}", cli.bundle_location.display()))
}

fn print_summary(report: &RenameReport, dry_run: bool) {
    let verb = if dry_run { "Would rename" } else { "Renamed" };
    for outcome in &report.outcomes {
        match outcome {
            RenameOutcome::Renamed { from, to } | RenameOutcome::Overwrote { from, to } => {
                println!("{verb} {} -> {}", from.display(), to.display());
            }
            RenameOutcome::Conflict { from, to } => {
                println!("Skipped {}: {} exists", from.display(), to.display());
            }
            RenameOutcome::MissingUri(path) => {
                println!("Skipped {}: no identifier URI", path.display());
            }
            RenameOutcome::AlreadyNamed(_) => {}
        }
    }
    println!(
        "{verb} {} bundles, left {} in place",
        report.renamed(),
        report.skipped()
    );
}
