//! End-to-end migration of one collection.

use either::{Either, Left, Right};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::attachment::ExportLocation;
use crate::config::{MigrationConfig, RowPolicy};
use crate::csv::{MetadataReader, RawRow};
use crate::normalize::Normalizer;
use crate::render::write_documents;
use crate::{Record, Result};

/// Outcome of a completed migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Path of the written batch document
    pub output: PathBuf,
    pub records_written: usize,
    /// Rows left out under [`RowPolicy::Skip`], with their line numbers
    pub skipped_rows: Vec<(usize, String)>,
}

/// Migration of one DSpace collection.
#[derive(Debug, Clone)]
pub struct Migration {
    config: MigrationConfig,
    reader: MetadataReader,
}

impl Migration {
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            reader: MetadataReader::new(),
        }
    }

    /// Use a custom metadata reader.
    #[must_use]
    pub fn with_reader(mut self, reader: MetadataReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Load and normalize every row of a metadata export, in input order.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if the export cannot be read, or if a row fails to
    /// normalize under [`RowPolicy::Abort`].
    pub fn load_records<P: AsRef<Path>>(&self, metadata_file: P) -> Result<Vec<Record>> {
        self.load(metadata_file).map(|(records, _)| records)
    }

    /// Migrate a metadata export into a batch document inside `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if loading fails or the document cannot be written.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, metadata_file: P, output_dir: Q) -> Result<MigrationReport> {
        let (records, skipped_rows) = self.load(metadata_file)?;

        let output = output_dir.as_ref().join(self.config.output_file_name());
        write_documents(&output, &records)?;

        Ok(MigrationReport {
            output,
            records_written: records.len(),
            skipped_rows,
        })
    }

    fn load<P: AsRef<Path>>(&self, metadata_file: P) -> Result<(Vec<Record>, Vec<(usize, String)>)> {
        let metadata_file = metadata_file.as_ref();
        info!(
            metadata_file = %metadata_file.display(),
            collection = %self.config.collection_id,
            export_location = %self.config.export_location.display(),
            "loading metadata export"
        );

        let rows = self.reader.read_path(metadata_file)?;
        let export = ExportLocation::new(&self.config.export_location);
        let normalizer = Normalizer::new(&self.config, &export);

        let (skipped, records): (Vec<_>, Vec<_>) = match self.config.row_policy {
            RowPolicy::Abort => (
                Vec::new(),
                rows.iter()
                    .map(|row| normalizer.normalize(row))
                    .collect::<Result<Vec<_>>>()?,
            ),
            RowPolicy::Skip => rows
                .iter()
                .map(|row| normalize_or_skip(&normalizer, row))
                .partition_map(|outcome| outcome),
        };

        info!(records = records.len(), skipped = skipped.len(), "normalized metadata export");
        Ok((records, skipped))
    }
}

fn normalize_or_skip(
    normalizer: &Normalizer<&ExportLocation>,
    row: &RawRow,
) -> Either<(usize, String), Record> {
    match normalizer.normalize(row) {
        Ok(record) => Right(record),
        Err(e) => {
            warn!(line = row.line_number(), error = %e, "skipping row");
            Left((row.line_number(), e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MigrateError;
    use crate::config::AttachmentPolicy;
    use std::fs;
    use tempfile::TempDir;

    const METADATA: &str = "\
id,collection,dc.contributor.author[],dc.date.issued[],dc.identifier.uri,dc.title[en_US]
1,1234,\"Smith, John\",2014/05,http://hdl.handle.net/1234/678,First
2,1234,,,http://hdl.handle.net/1234/679,Second
";

    fn export_item(root: &Path, item: &str, filename: &str) {
        let dir = root.join("exports/1234").join(item);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("dublin_core.xml"),
            format!(
                "<dublin_core schema=\"dc\"><dcvalue element=\"description\" qualifier=\"provenance\">a\nb\n{filename}:1:x</dcvalue></dublin_core>"
            ),
        )
        .unwrap();
    }

    fn setup(metadata: &str) -> (TempDir, MigrationConfig) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("metadata.csv"), metadata).unwrap();
        let config = MigrationConfig::new("1234", dir.path().join("exports"), "https://example.edu");
        (dir, config)
    }

    #[test]
    fn test_load_records_in_order() {
        let (dir, config) = setup(METADATA);
        export_item(dir.path(), "678", "first.pdf");
        export_item(dir.path(), "679", "second.pdf");

        let records = Migration::new(config)
            .load_records(dir.path().join("metadata.csv"))
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "678");
        assert_eq!(records[0].publication_date, "2014-05-01");
        assert_eq!(
            records[0].fulltext_url.as_deref(),
            Some("https://example.edu/1234/678/first.pdf")
        );
        assert_eq!(records[1].id, "679");
        assert_eq!(records[1].authors[0].first_name, "Portland State University");
    }

    #[test]
    fn test_missing_bundle_aborts_by_default() {
        let (dir, config) = setup(METADATA);
        export_item(dir.path(), "678", "first.pdf");

        let result = Migration::new(config).load_records(dir.path().join("metadata.csv"));
        assert!(matches!(result, Err(MigrateError::AttachmentMetadata { .. })));
    }

    #[test]
    fn test_missing_bundle_skipped_on_request() {
        let (dir, config) = setup(METADATA);
        export_item(dir.path(), "678", "first.pdf");
        let config = config.with_attachment_policy(AttachmentPolicy::Skip);

        let records = Migration::new(config)
            .load_records(dir.path().join("metadata.csv"))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].fulltext_url, None);
    }

    #[test]
    fn test_row_policy() {
        let metadata = format!("{METADATA}3,1234,,,,No identifier\n");
        let (dir, config) = setup(&metadata);
        export_item(dir.path(), "678", "first.pdf");
        export_item(dir.path(), "679", "second.pdf");
        let path = dir.path().join("metadata.csv");

        let result = Migration::new(config.clone()).load_records(&path);
        assert!(matches!(result, Err(MigrateError::MissingIdentifier { line: 4 })));

        let report = Migration::new(config.with_row_policy(RowPolicy::Skip))
            .run(&path, dir.path())
            .unwrap();
        assert_eq!(report.records_written, 2);
        assert_eq!(report.skipped_rows.len(), 1);
        assert_eq!(report.skipped_rows[0].0, 4);
    }

    #[test]
    fn test_run_writes_named_output() {
        let (dir, config) = setup(METADATA);
        export_item(dir.path(), "678", "first.pdf");
        export_item(dir.path(), "679", "second.pdf");

        let report = Migration::new(config.with_department("geology"))
            .run(dir.path().join("metadata.csv"), dir.path())
            .unwrap();

        assert_eq!(report.output, dir.path().join("geology-1234-metadata.xml"));
        assert_eq!(report.records_written, 2);
        let xml = fs::read_to_string(&report.output).unwrap();
        assert!(xml.contains("<title>First</title>"));
        assert!(xml.contains("<title>Second</title>"));
        assert!(xml.contains("<value>geology</value>"));
    }
}
