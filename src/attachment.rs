//! Attachment discovery in DSpace export bundles.
//!
//! DSpace records the name of every ingested bitstream in the item's provenance
//! statement. The statement's third line reads `filename:size:checksum`, and that
//! filename is the item's attachment.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::dublin_core::{METADATA_FILE_NAME, first_qualified, read_dcvalues};
use crate::utils::{is_path_segment, provenance_filename};
use crate::{AttachmentLookup, MigrateError, Result};

/// Qualifier of the `dcvalue` holding the provenance statement.
const PROVENANCE_QUALIFIER: &str = "provenance";

/// An on-disk export location laid out as `<root>/<collection>/<item>/dublin_core.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLocation {
    root: PathBuf,
}

impl ExportLocation {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the metadata file of an item.
    pub fn metadata_path(&self, collection_id: &str, item_id: &str) -> PathBuf {
        self.root
            .join(collection_id)
            .join(item_id)
            .join(METADATA_FILE_NAME)
    }
}

impl AttachmentLookup for ExportLocation {
    /// Resolves the attachment filename of an item.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::AttachmentMetadata` naming the path if the item's
    /// metadata file is missing or cannot be parsed, or if either id would leave
    /// the export location. A provenance statement that
    /// names no file is not an error and yields `Ok(None)`.
    fn attachment_filename(&self, collection_id: &str, item_id: &str) -> Result<Option<String>> {
        let path = self.metadata_path(collection_id, item_id);
        if !is_path_segment(collection_id) || !is_path_segment(item_id) {
            return Err(MigrateError::AttachmentMetadata {
                path,
                message: "collection and item ids must be plain directory names".to_string(),
            });
        }
        debug!(path = %path.display(), "resolving attachment");

        let values = read_dcvalues(&path).map_err(|e| MigrateError::AttachmentMetadata {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let Some(provenance) = first_qualified(&values, PROVENANCE_QUALIFIER) else {
            warn!(path = %path.display(), "no provenance statement, migrating without attachment");
            return Ok(None);
        };

        match provenance_filename(&provenance.value) {
            Ok(filename) => Ok(Some(filename)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "migrating without attachment");
                Ok(None)
            }
        }
    }
}
