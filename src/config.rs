//! Migration settings and failure policies.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fields::TYPE_GUARD_COLUMN;

/// Institution credited when a row names no author.
pub const DEFAULT_INSTITUTION: &str = "Portland State University";

/// What to do with a row that cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowPolicy {
    /// Stop the run on the first failing row.
    #[default]
    Abort,
    /// Log the failure and continue with the next row.
    Skip,
}

/// What to do when an item's metadata file is missing or unreadable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentPolicy {
    /// Fail the record, which the row policy then handles.
    #[default]
    Fail,
    /// Log a warning and migrate the record without an attachment.
    Skip,
}

/// How the localized `dc.type[en_US]` column is consulted when `dc.type[]` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFallback {
    /// Read it only when the given positional column is present.
    PositionalGuard(usize),
    /// Read it whenever `dc.type[]` is empty.
    Localized,
    /// Never read it.
    Disabled,
}

impl Default for TypeFallback {
    fn default() -> Self {
        TypeFallback::PositionalGuard(TYPE_GUARD_COLUMN)
    }
}

/// Settings for migrating one collection.
///
/// # Examples
///
/// ```
/// use dspace_migrate::{AttachmentPolicy, MigrationConfig, RowPolicy};
///
/// let config = MigrationConfig::new("1234", "/exports", "https://example.edu/assets")
///     .with_department("geology")
///     .with_row_policy(RowPolicy::Skip)
///     .with_attachment_policy(AttachmentPolicy::Skip);
///
/// assert_eq!(config.output_file_name(), "geology-1234-metadata.xml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// DSpace collection id, without the institutional handle prefix
    pub collection_id: String,
    /// Directory holding the exported bundles, one subdirectory per collection
    pub export_location: PathBuf,
    /// Base URL the attachments will be served from
    pub url_base: String,
    /// Department name, used in the output name and as a department fallback
    pub department_name: Option<String>,
    /// Name of the stand-in author for rows without authors
    pub institution: String,
    pub row_policy: RowPolicy,
    pub attachment_policy: AttachmentPolicy,
    pub type_fallback: TypeFallback,
}

impl MigrationConfig {
    /// Creates a configuration with default policies.
    #[must_use]
    pub fn new(
        collection_id: impl Into<String>,
        export_location: impl Into<PathBuf>,
        url_base: impl Into<String>,
    ) -> Self {
        Self {
            collection_id: collection_id.into(),
            export_location: export_location.into(),
            url_base: url_base.into(),
            department_name: None,
            institution: DEFAULT_INSTITUTION.to_string(),
            row_policy: RowPolicy::default(),
            attachment_policy: AttachmentPolicy::default(),
            type_fallback: TypeFallback::default(),
        }
    }

    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department_name = Some(department.into());
        self
    }

    #[must_use]
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    #[must_use]
    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    #[must_use]
    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.attachment_policy = policy;
        self
    }

    #[must_use]
    pub fn with_type_fallback(mut self, fallback: TypeFallback) -> Self {
        self.type_fallback = fallback;
        self
    }

    /// Name of the document written for this collection.
    pub fn output_file_name(&self) -> String {
        crate::render::output_file_name(&self.collection_id, self.department_name.as_deref())
    }
}
