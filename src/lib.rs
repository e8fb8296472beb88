//! Migration of DSpace metadata exports into Digital Commons batch import documents.
//!
//! `dspace_migrate` reads the CSV metadata export of a DSpace collection, looks up each
//! item's attachment in the matching export bundle, normalizes the handful of fields that
//! need it, and renders the whole collection into one Digital Commons batch document.
//!
//! # Key Features
//!
//! - **Record normalization**:
//!   - Author names split into last, first and middle parts
//!   - Publication dates coerced to `YYYY-MM-DD`
//!   - Abstracts entity-encoded for direct inclusion in XML
//!   - Handle identifiers extracted from `dc.identifier.uri`
//!
//! - **Attachment discovery**: the attachment filename is read from the provenance
//!   field of the item's `dublin_core.xml` inside the export bundle.
//!
//! - **Bundle renaming**: exported bundle directories can be renamed after their
//!   handle identifier, with an explicit policy for name collisions.
//!
//! # Basic Usage
//!
//! ```no_run
//! use dspace_migrate::{Migration, MigrationConfig};
//!
//! let config = MigrationConfig::new("1234", "/exports", "https://example.edu/assets")
//!     .with_department("physics");
//!
//! let report = Migration::new(config).run("metadata.csv", ".").unwrap();
//! println!("wrote {} records to {}", report.records_written, report.output.display());
//! ```
//!
//! # Normalizing a Single Row
//!
//! ```
//! use dspace_migrate::csv::MetadataReader;
//! use dspace_migrate::normalize::Normalizer;
//! use dspace_migrate::{AttachmentLookup, MigrationConfig, Result};
//!
//! struct NoAttachments;
//!
//! impl AttachmentLookup for NoAttachments {
//!     fn attachment_filename(&self, _: &str, _: &str) -> Result<Option<String>> {
//!         Ok(None)
//!     }
//! }
//!
//! let input = "id,dc.identifier.uri,dc.title[en_US],dc.date.issued\n\
//!              1,http://hdl.handle.net/1234/678,A Title,2020/03";
//! let rows = MetadataReader::new().read_str(input).unwrap();
//!
//! let config = MigrationConfig::new("1234", "/exports", "https://example.edu/assets");
//! let normalizer = Normalizer::new(&config, NoAttachments);
//! let record = normalizer.normalize(&rows[0]).unwrap();
//!
//! assert_eq!(record.id, "678");
//! assert_eq!(record.publication_date, "2020-03-01");
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`MigrateError`]. Whether a
//! failing row or a missing attachment aborts the run is decided by the policies in
//! [`config`].

use quick_xml::events::attributes::AttrError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

extern crate csv as csv_crate;

pub mod attachment;
pub mod config;
pub mod csv;
pub mod dublin_core;
pub mod fields;
pub mod logging;
pub mod migrate;
pub mod normalize;
mod regex;
pub mod rename;
pub mod render;
mod utils;

// Reexports
pub use attachment::ExportLocation;
pub use config::{AttachmentPolicy, MigrationConfig, RowPolicy, TypeFallback};
pub use migrate::{Migration, MigrationReport};
pub use normalize::Normalizer;
pub use rename::{BundleRenamer, ConflictPolicy};

/// A specialized Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Errors raised while loading, normalizing, rendering or renaming.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing identifier URI at line {line}")]
    MissingIdentifier { line: usize },

    #[error("Malformed input: {message} at line {line}")]
    MalformedInput { message: String, line: usize },

    #[error("Unreadable item metadata {}: {message}", path.display())]
    AttachmentMetadata { path: PathBuf, message: String },

    #[error("Malformed provenance: {0}")]
    MalformedProvenance(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Cannot rename {} to {}: target already exists", from.display(), to.display())]
    RenameConflict { from: PathBuf, to: PathBuf },

    #[error("Invalid search pattern: {0}")]
    Pattern(String),
}

impl From<csv_crate::Error> for MigrateError {
    fn from(err: csv_crate::Error) -> Self {
        MigrateError::InvalidFormat(err.to_string())
    }
}

impl From<quick_xml::Error> for MigrateError {
    fn from(err: quick_xml::Error) -> Self {
        MigrateError::InvalidFormat(err.to_string())
    }
}

impl From<AttrError> for MigrateError {
    fn from(err: AttrError) -> Self {
        MigrateError::InvalidFormat(err.to_string())
    }
}

impl From<url::ParseError> for MigrateError {
    fn from(err: url::ParseError) -> Self {
        MigrateError::InvalidUrl(err.to_string())
    }
}

impl From<glob::PatternError> for MigrateError {
    fn from(err: glob::PatternError) -> Self {
        MigrateError::Pattern(err.to_string())
    }
}

impl From<glob::GlobError> for MigrateError {
    fn from(err: glob::GlobError) -> Self {
        let kind = err.error().kind();
        MigrateError::Io(std::io::Error::new(kind, err.to_string()))
    }
}

/// An author of a migrated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Given name, possibly empty
    pub first_name: String,
    /// Family name, possibly empty
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub institution: Option<String>,
}

impl Author {
    /// Creates an author from a first and last name.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            middle_name: None,
            email: None,
            institution: None,
        }
    }

    #[must_use]
    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    /// The stand-in author used when a row names nobody.
    #[must_use]
    pub fn institutional(name: &str) -> Self {
        Self::new(name, "")
    }
}

/// A fully normalized document, one per metadata row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Handle suffix taken from the identifier URI
    pub id: String,
    /// Collection the record was migrated from
    pub collection: String,
    pub title: String,
    /// Publication date as `YYYY-MM-DD`
    pub publication_date: String,
    /// Authors in source order, never empty
    pub authors: Vec<Author>,
    /// Abstract text with HTML special characters entity-encoded
    pub abstract_text: Option<String>,
    pub description: Option<String>,
    pub citation: Option<String>,
    /// Library of Congress subject headings
    pub subject_areas: Vec<String>,
    pub keywords: Vec<String>,
    pub document_type: Option<String>,
    /// Public URL of the attachment, percent-encoded
    pub fulltext_url: Option<String>,
    pub advisors: Vec<String>,
    pub comments: Option<String>,
    pub issue: Option<String>,
    pub department: Option<String>,
    pub degree_name: Option<String>,
    pub degree_type: Option<String>,
    pub format: Option<String>,
}

/// Source of attachment filenames for migrated items.
pub trait AttachmentLookup {
    /// Find the attachment filename stored for an item of a collection.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the item's metadata exists but names no attachment.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError` if the item's metadata cannot be read at all.
    fn attachment_filename(&self, collection_id: &str, item_id: &str) -> Result<Option<String>>;
}

impl<T: AttachmentLookup + ?Sized> AttachmentLookup for &T {
    fn attachment_filename(&self, collection_id: &str, item_id: &str) -> Result<Option<String>> {
        (**self).attachment_filename(collection_id, item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_error_display() {
        let error = MigrateError::InvalidFormat("Invalid line".to_string());
        assert_eq!(error.to_string(), "Parse error: Invalid line");

        let error = MigrateError::AttachmentMetadata {
            path: PathBuf::from("/exports/1/2/dublin_core.xml"),
            message: "not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unreadable item metadata /exports/1/2/dublin_core.xml: not found"
        );
    }

    #[test]
    fn test_author_equality() {
        let author1 = Author::new("John", "Smith").with_middle_name("Robert");
        let author2 = Author {
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            middle_name: Some("Robert".to_string()),
            email: None,
            institution: None,
        };
        assert_eq!(author1, author2);
    }

    #[test]
    fn test_institutional_author() {
        let author = Author::institutional("Portland State University");
        assert_eq!(author.first_name, "Portland State University");
        assert_eq!(author.last_name, "");
        assert_eq!(author.middle_name, None);
    }
}
