//! Normalization of metadata rows into records.
//!
//! # Field Resolution
//!
//! - **First-present**: each field reads the first non-empty column listed for it
//!   in [`Field::columns`].
//! - **Required**: the identifier URI and the title; a row without either fails.
//! - **Defaulted**: the publication date and the author list always produce a value.
//! - **Looked up**: the attachment URL comes from the item's export bundle.

use tracing::{debug, warn};
use url::Url;

use crate::config::{AttachmentPolicy, MigrationConfig, TypeFallback};
use crate::csv::RawRow;
use crate::fields::{Field, TYPE_LOCALIZED_COLUMN};
use crate::utils::{
    chomp, encode_entities, last_path_segment, normalize_date, parse_authors, split_values,
};
use crate::{AttachmentLookup, MigrateError, Record, Result};

/// Turns metadata rows of one collection into [`Record`]s.
#[derive(Debug, Clone)]
pub struct Normalizer<L> {
    collection_id: String,
    url_base: String,
    institution: String,
    department: Option<String>,
    type_fallback: TypeFallback,
    attachment_policy: AttachmentPolicy,
    lookup: L,
}

impl<L: AttachmentLookup> Normalizer<L> {
    /// Creates a normalizer for the collection described by `config`.
    #[must_use]
    pub fn new(config: &MigrationConfig, lookup: L) -> Self {
        Self {
            collection_id: config.collection_id.clone(),
            url_base: config.url_base.clone(),
            institution: config.institution.clone(),
            department: config.department_name.clone(),
            type_fallback: config.type_fallback,
            attachment_policy: config.attachment_policy,
            lookup,
        }
    }

    /// Normalize one row.
    ///
    /// # Errors
    ///
    /// - `MigrateError::MissingIdentifier` if the row has no usable identifier URI
    /// - `MigrateError::MalformedInput` if the row has no title
    /// - `MigrateError::AttachmentMetadata` if the item's metadata is unreadable and
    ///   the attachment policy is [`AttachmentPolicy::Fail`]
    /// - `MigrateError::InvalidUrl` if the URL base cannot be parsed
    pub fn normalize(&self, row: &RawRow) -> Result<Record> {
        let id = row
            .field(Field::IdentifierUri)
            .and_then(last_path_segment)
            .ok_or(MigrateError::MissingIdentifier {
                line: row.line_number(),
            })?
            .to_string();

        let title = row
            .field(Field::Title)
            .map(chomp)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MigrateError::MalformedInput {
                message: "missing title".to_string(),
                line: row.line_number(),
            })?
            .to_string();

        debug!(line = row.line_number(), id = %id, "normalizing row");

        let fulltext_url = self.fulltext_url(&id)?;

        Ok(Record {
            collection: self.collection_id.clone(),
            title,
            publication_date: normalize_date(row.field(Field::DateIssued)),
            authors: parse_authors(row.field(Field::Author), &self.institution),
            abstract_text: row.field(Field::Abstract).map(encode_entities),
            description: owned(row.field(Field::Description)),
            citation: owned(row.field(Field::Citation)),
            subject_areas: row.field(Field::SubjectLcsh).map(split_values).unwrap_or_default(),
            keywords: row.field(Field::Keywords).map(split_values).unwrap_or_default(),
            document_type: self.document_type(row),
            fulltext_url,
            advisors: row.field(Field::Advisor).map(split_values).unwrap_or_default(),
            comments: owned(row.field(Field::Comments)),
            issue: owned(row.field(Field::Issue)),
            department: owned(row.field(Field::Department)).or_else(|| self.department.clone()),
            degree_name: owned(row.field(Field::DegreeName)),
            degree_type: owned(row.field(Field::DegreeType)),
            format: owned(row.field(Field::Format)),
            id,
        })
    }

    /// The document type, with the localized column read only as the fallback allows.
    fn document_type(&self, row: &RawRow) -> Option<String> {
        let localized = || row.get(TYPE_LOCALIZED_COLUMN);
        let value = row.field(Field::Type).or_else(|| match self.type_fallback {
            // The guard checks a positional column, not the localized one it reads.
            TypeFallback::PositionalGuard(index) => row.column(index).and_then(|_| localized()),
            TypeFallback::Localized => localized(),
            TypeFallback::Disabled => None,
        });
        value.map(|v| chomp(v).to_string())
    }

    /// Public URL of the item's attachment, if one can be found.
    fn fulltext_url(&self, id: &str) -> Result<Option<String>> {
        let filename = match self.lookup.attachment_filename(&self.collection_id, id) {
            Ok(filename) => filename,
            Err(e) if self.attachment_policy == AttachmentPolicy::Skip => {
                warn!(id, error = %e, "migrating without attachment");
                None
            }
            Err(e) => return Err(e),
        };

        filename
            .map(|filename| attachment_url(&self.url_base, &self.collection_id, id, &filename))
            .transpose()
    }
}

/// Builds `base/collection/item/filename`, percent-encoding each appended segment.
///
/// # Errors
///
/// Returns `MigrateError::InvalidUrl` if `base` is not an absolute URL that can
/// take path segments.
pub fn attachment_url(base: &str, collection_id: &str, item_id: &str, filename: &str) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|()| MigrateError::InvalidUrl(format!("{base} cannot take a path")))?
        .pop_if_empty()
        .push(collection_id)
        .push(item_id)
        .push(filename);
    Ok(url.into())
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(String::from)
}
