//! Migrate a DSpace collection export into a Digital Commons batch document.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dspace_migrate::config::DEFAULT_INSTITUTION;
use dspace_migrate::fields::TYPE_GUARD_COLUMN;
use dspace_migrate::logging::{LogConfig, init_logging};
use dspace_migrate::{
    AttachmentPolicy, Migration, MigrationConfig, MigrationReport, RowPolicy, TypeFallback,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "dspace-migrate",
    version,
    about = "Migrate DSpace metadata exports into Digital Commons batch import XML"
)]
struct Cli {
    /// CSV metadata export of the collection.
    #[arg(short = 'm', long = "metadata_file", value_name = "FILE")]
    metadata_file: PathBuf,

    /// Directory holding the exported bundles.
    #[arg(short = 'e', long = "export_location", value_name = "FOLDER")]
    export_location: PathBuf,

    /// DSpace collection id, without the handle prefix.
    #[arg(short = 'c', long = "collection_id", value_name = "ID")]
    collection_id: String,

    /// Base URL the attachments will be served from.
    #[arg(short = 'u', long = "url_base", value_name = "URL")]
    url_base: String,

    /// Department name for the output file and department field.
    #[arg(short = 'd', long = "department_name", value_name = "NAME")]
    department_name: Option<String>,

    /// Enable debug logging.
    #[arg(short = 'g', long = "debug")]
    debug: bool,

    /// Directory the batch document is written to.
    #[arg(short = 'o', long = "output_dir", value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Skip rows that cannot be migrated instead of stopping.
    #[arg(long = "skip_invalid_rows")]
    skip_invalid_rows: bool,

    /// Migrate items whose bundle metadata is missing without an attachment.
    #[arg(long = "skip_missing_attachments")]
    skip_missing_attachments: bool,

    /// When to read the localized type column.
    #[arg(long = "type_fallback", value_enum, default_value = "positional")]
    type_fallback: TypeFallbackArg,

    /// Author credited on rows without authors.
    #[arg(long = "institution", value_name = "NAME", default_value = DEFAULT_INSTITUTION)]
    institution: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeFallbackArg {
    Positional,
    Localized,
    Disabled,
}

impl From<TypeFallbackArg> for TypeFallback {
    fn from(arg: TypeFallbackArg) -> Self {
        match arg {
            TypeFallbackArg::Positional => TypeFallback::PositionalGuard(TYPE_GUARD_COLUMN),
            TypeFallbackArg::Localized => TypeFallback::Localized,
            TypeFallbackArg::Disabled => TypeFallback::Disabled,
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
            print_summary(&report);
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<MigrationReport> {
    let mut config = MigrationConfig::new(
        cli.collection_id.as_str(),
        cli.export_location.as_path(),
        cli.url_base.as_str(),
    )
    .with_institution(cli.institution.as_str())
    .with_type_fallback(cli.type_fallback.into());

    if let Some(department) = &cli.department_name {
        config = config.with_department(department.as_str());
    }
    if cli.skip_invalid_rows {
        config = config.with_row_policy(RowPolicy::Skip);
    }
    if cli.skip_missing_attachments {
        config = config.with_attachment_policy(AttachmentPolicy::Skip);
    }

    info!(collection = %config.collection_id, "starting migration");
    Migration::new(config)
        .run(&cli.metadata_file, &cli.output_dir)
        .with_context(|| format!("failed to migrate {}", cli.metadata_file.display()))
}

fn print_summary(report: &MigrationReport) {
    println!(
        "Wrote {} records to {}",
        report.records_written,
        report.output.display()
    );
    for (line, reason) in &report.skipped_rows {
        println!("  skipped line {line}: {reason}");
    }
}
