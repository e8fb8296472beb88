//! DSpace metadata export loader.
//!
//! Reads the CSV produced by a DSpace metadata export into [`RawRow`]s, one per item,
//! in input order.
//!
//! # Example
//!
//! ```
//! use dspace_migrate::csv::MetadataReader;
//!
//! let input = "id,dc.title[en_US]\n12,Example Paper";
//!
//! let rows = MetadataReader::new().read_str(input).unwrap();
//! assert_eq!(rows[0].get("dc.title[en_US]"), Some("Example Paper"));
//! ```

mod structure;

pub use structure::RawRow;

use csv::{Reader, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, trace};

use crate::fields::Field;
use crate::{MigrateError, Result};

/// Value of the first column on a repeated header line.
const HEADER_MARKER: &str = "id";

/// Configuration for reading metadata exports.
///
/// # Examples
///
/// ```
/// use dspace_migrate::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_delimiter(b';').set_flexible(false);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use for parsing the CSV
    delimiter: u8,
    /// Whether records may have a different number of fields than the header.
    /// On by default, since exports with ragged rows are common.
    flexible: bool,
    /// Whether to trim whitespace around values
    trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a new CSV configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            flexible: true,
            trim: false,
        }
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether records of uneven length are accepted
    pub fn set_flexible(&mut self, flexible: bool) -> &mut Self {
        self.flexible = flexible;
        self
    }

    /// Sets whether values are trimmed before use
    pub fn set_trim(&mut self, trim: bool) -> &mut Self {
        self.trim = trim;
        self
    }
}

/// Reader for DSpace metadata exports.
#[derive(Debug, Clone, Default)]
pub struct MetadataReader {
    config: CsvConfig,
}

impl MetadataReader {
    /// Creates a new reader with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
        }
    }

    /// Creates a new reader with custom configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Read every row of the export at `path`.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if the file cannot be opened or is not valid CSV.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRow>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading metadata export");
        let file = File::open(path)?;
        self.read_from(self.builder().from_reader(file))
    }

    /// Read every row of an export held in memory.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if the input is not valid CSV.
    pub fn read_str(&self, input: &str) -> Result<Vec<RawRow>> {
        self.read_from(self.builder().from_reader(input.as_bytes()))
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.config.delimiter)
            .flexible(self.config.flexible)
            .has_headers(true);
        builder
    }

    fn read_from<R: Read>(&self, mut reader: Reader<R>) -> Result<Vec<RawRow>> {
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| MigrateError::InvalidFormat(e.to_string()))?
            .iter()
            .map(String::from)
            .collect();

        for header in headers.iter().filter(|h| Field::from_column(h).is_none()) {
            trace!(column = %header, "column not used by any field");
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line() as usize);

            if record.get(0) == Some(HEADER_MARKER) {
                debug!(line, "skipping repeated header line");
                continue;
            }

            let row = RawRow::from_record(&headers, &record, self.config.trim, line);
            if row.has_content() {
                rows.push(row);
            }
        }

        debug!(rows = rows.len(), "metadata export loaded");
        Ok(rows)
    }
}
