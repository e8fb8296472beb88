//! Renaming of exported DSpace bundles after their handle identifier.
//!
//! DSpace exports bundles into sequentially numbered directories. The migration
//! looks items up by handle, so each directory holding a `dublin_core.xml` is
//! renamed to the last segment of the item's identifier URI:
//!
//! ```text
//! exports/1234/0/dublin_core.xml   ->   exports/1234/678/dublin_core.xml
//! ```

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::dublin_core::{METADATA_FILE_NAME, first_qualified, read_dcvalues};
use crate::utils::last_path_segment;
use crate::{MigrateError, Result};

const URI_QUALIFIER: &str = "uri";

/// What to do when the target directory of a rename already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Stop with `MigrateError::RenameConflict`.
    #[default]
    Fail,
    /// Remove the existing target, then rename.
    Overwrite,
    /// Leave both directories in place.
    Skip,
}

/// Result of processing one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    /// The existing target was removed before renaming
    Overwrote { from: PathBuf, to: PathBuf },
    /// The directory already carries its handle name
    AlreadyNamed(PathBuf),
    /// The target existed and [`ConflictPolicy::Skip`] was in effect
    Conflict { from: PathBuf, to: PathBuf },
    /// The metadata file holds no identifier URI usable as a directory name
    MissingUri(PathBuf),
}

/// Outcomes of a renaming run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub outcomes: Vec<RenameOutcome>,
}

impl RenameReport {
    /// Number of directories that were (or, in a dry run, would be) moved.
    pub fn renamed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| {
                matches!(
                    outcome,
                    RenameOutcome::Renamed { .. } | RenameOutcome::Overwrote { .. }
                )
            })
            .count()
    }

    /// Number of bundles left where they were.
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.renamed()
    }
}

/// Renames every bundle below a root directory.
///
/// # Examples
///
/// ```no_run
/// use dspace_migrate::{BundleRenamer, ConflictPolicy};
///
/// let report = BundleRenamer::new("/exports/1234")
///     .with_conflict_policy(ConflictPolicy::Skip)
///     .rename_all()
///     .unwrap();
/// println!("renamed {} bundles", report.renamed());
/// ```
#[derive(Debug, Clone)]
pub struct BundleRenamer {
    root: PathBuf,
    policy: ConflictPolicy,
    dry_run: bool,
}

impl BundleRenamer {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: ConflictPolicy::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report what would happen without touching the filesystem.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Find every metadata file below the root, in path order.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Pattern` if the root cannot form a search pattern and
    /// `MigrateError::Io` if a directory cannot be read.
    pub fn find_metadata_files(&self) -> Result<Vec<PathBuf>> {
        let root = Pattern::escape(&self.root.to_string_lossy());
        let pattern = format!("{root}/**/{METADATA_FILE_NAME}");
        debug!(%pattern, "searching for bundles");

        let mut files = Vec::new();
        for entry in glob::glob(&pattern)? {
            files.push(entry?);
        }
        Ok(files)
    }

    /// Rename every bundle below the root.
    ///
    /// All metadata files are discovered before the first rename.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::RenameConflict` on an existing target under
    /// [`ConflictPolicy::Fail`], or any error raised while reading metadata or
    /// moving directories. Bundles renamed before the error stay renamed.
    pub fn rename_all(&self) -> Result<RenameReport> {
        let files = self.find_metadata_files()?;
        info!(
            root = %self.root.display(),
            bundles = files.len(),
            dry_run = self.dry_run,
            "renaming bundles"
        );

        let mut report = RenameReport::default();
        for file in files {
            report.outcomes.push(self.rename_bundle(&file)?);
        }

        info!(renamed = report.renamed(), skipped = report.skipped(), "finished renaming bundles");
        Ok(report)
    }

    /// Rename the bundle directory holding `metadata_file`.
    ///
    /// # Errors
    ///
    /// See [`BundleRenamer::rename_all`].
    pub fn rename_bundle(&self, metadata_file: &Path) -> Result<RenameOutcome> {
        let (Some(bundle), Some(parent)) = (
            metadata_file.parent(),
            metadata_file.parent().and_then(Path::parent),
        ) else {
            return Err(MigrateError::InvalidFormat(format!(
                "{} is not inside a bundle directory",
                metadata_file.display()
            )));
        };

        let values = read_dcvalues(metadata_file)?;
        let id = first_qualified(&values, URI_QUALIFIER).and_then(|uri| last_path_segment(&uri.value));
        let Some(id) = id else {
            warn!(path = %metadata_file.display(), "no usable identifier URI, leaving bundle in place");
            return Ok(RenameOutcome::MissingUri(bundle.to_path_buf()));
        };

        let from = bundle.to_path_buf();
        let to = parent.join(id);
        debug!(from = %from.display(), to = %to.display(), "resolved bundle name");

        if from == to {
            return Ok(RenameOutcome::AlreadyNamed(from));
        }

        if !to.exists() {
            self.move_dir(&from, &to)?;
            return Ok(RenameOutcome::Renamed { from, to });
        }

        match self.policy {
            ConflictPolicy::Fail => Err(MigrateError::RenameConflict { from, to }),
            ConflictPolicy::Skip => {
                warn!(from = %from.display(), to = %to.display(), "target exists, skipping bundle");
                Ok(RenameOutcome::Conflict { from, to })
            }
            ConflictPolicy::Overwrite => {
                warn!(to = %to.display(), "target exists, replacing it");
                if !self.dry_run {
                    fs::remove_dir_all(&to)?;
                }
                self.move_dir(&from, &to)?;
                Ok(RenameOutcome::Overwrote { from, to })
            }
        }
    }

    fn move_dir(&self, from: &Path, to: &Path) -> Result<()> {
        if self.dry_run {
            info!(from = %from.display(), to = %to.display(), "would rename bundle");
            return Ok(());
        }
        fs::rename(from, to)?;
        info!(from = %from.display(), to = %to.display(), "renamed bundle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn bundle(root: &Path, name: &str, uri: Option<&str>) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        let uri = uri
            .map(|u| format!(r#"<dcvalue element="identifier" qualifier="uri">{u}</dcvalue>"#))
            .unwrap_or_default();
        fs::write(
            dir.join(METADATA_FILE_NAME),
            format!(
                r#"<dublin_core schema="dc"><dcvalue element="title" qualifier="none">T</dcvalue>{uri}</dublin_core>"#
            ),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_find_metadata_files() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        bundle(dir.path(), "1234/1", Some("http://hdl.handle.net/1234/679"));
        fs::write(dir.path().join("1234/notes.txt"), "x").unwrap();

        let files = BundleRenamer::new(dir.path()).find_metadata_files().unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("1234/0/dublin_core.xml"),
                dir.path().join("1234/1/dublin_core.xml"),
            ]
        );
    }

    #[test]
    fn test_root_with_pattern_characters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("exports [2014]");
        bundle(&root, "0", Some("http://hdl.handle.net/1234/678"));

        let report = BundleRenamer::new(&root).rename_all().unwrap();
        assert_eq!(report.renamed(), 1);
        assert!(root.join("678/dublin_core.xml").exists());
    }

    #[test]
    fn test_rename_all() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        bundle(dir.path(), "1234/1", Some("http://hdl.handle.net/1234/679/"));

        let report = BundleRenamer::new(dir.path()).rename_all().unwrap();

        assert_eq!(report.renamed(), 2);
        assert_eq!(
            report.outcomes[0],
            RenameOutcome::Renamed {
                from: dir.path().join("1234/0"),
                to: dir.path().join("1234/678"),
            }
        );
        assert!(dir.path().join("1234/678/dublin_core.xml").exists());
        assert!(dir.path().join("1234/679/dublin_core.xml").exists());
        assert!(!dir.path().join("1234/0").exists());
    }

    #[test]
    fn test_rename_is_idempotent() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        let renamer = BundleRenamer::new(dir.path());

        renamer.rename_all().unwrap();
        let report = renamer.rename_all().unwrap();

        assert_eq!(
            report.outcomes,
            vec![RenameOutcome::AlreadyNamed(dir.path().join("1234/678"))]
        );
    }

    #[test]
    fn test_missing_uri_is_skipped() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", None);

        let report = BundleRenamer::new(dir.path()).rename_all().unwrap();
        assert_eq!(
            report.outcomes,
            vec![RenameOutcome::MissingUri(dir.path().join("1234/0"))]
        );
        assert!(dir.path().join("1234/0").exists());
    }

    #[test]
    fn test_conflict_fails_by_default() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        fs::create_dir_all(dir.path().join("1234/678")).unwrap();

        let result = BundleRenamer::new(dir.path()).rename_all();
        assert!(matches!(result, Err(MigrateError::RenameConflict { .. })));
        assert!(dir.path().join("1234/0/dublin_core.xml").exists());
    }

    #[test]
    fn test_conflict_skip() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        fs::create_dir_all(dir.path().join("1234/678")).unwrap();

        let report = BundleRenamer::new(dir.path())
            .with_conflict_policy(ConflictPolicy::Skip)
            .rename_all()
            .unwrap();

        assert_eq!(report.renamed(), 0);
        assert_eq!(report.skipped(), 1);
        assert!(dir.path().join("1234/0/dublin_core.xml").exists());
    }

    #[test]
    fn test_conflict_overwrite() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        let stale = dir.path().join("1234/678");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("stale.txt"), "old").unwrap();

        let report = BundleRenamer::new(dir.path())
            .with_conflict_policy(ConflictPolicy::Overwrite)
            .rename_all()
            .unwrap();

        assert!(matches!(report.outcomes[0], RenameOutcome::Overwrote { .. }));
        assert!(stale.join("dublin_core.xml").exists());
        assert!(!stale.join("stale.txt").exists());
        assert!(!dir.path().join("1234/0").exists());
    }

    #[test]
    fn test_dry_run_leaves_tree_untouched() {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));

        let report = BundleRenamer::new(dir.path())
            .with_dry_run(true)
            .rename_all()
            .unwrap();

        assert_eq!(report.renamed(), 1);
        assert!(dir.path().join("1234/0/dublin_core.xml").exists());
        assert!(!dir.path().join("1234/678").exists());
    }

    #[rstest]
    fn test_dot_segments_never_touch_the_tree(
        #[values("http://hdl.handle.net/1234/..", "http://hdl.handle.net/1234/.")] uri: &str,
        #[values(ConflictPolicy::Fail, ConflictPolicy::Overwrite, ConflictPolicy::Skip)]
        policy: ConflictPolicy,
    ) {
        let dir = TempDir::new().unwrap();
        bundle(dir.path(), "1234/0", Some("http://hdl.handle.net/1234/678"));
        bundle(dir.path(), "1234/1", Some(uri));

        let report = BundleRenamer::new(dir.path())
            .with_conflict_policy(policy)
            .rename_all()
            .unwrap();

        assert_eq!(report.renamed(), 1);
        assert_eq!(
            report.outcomes[1],
            RenameOutcome::MissingUri(dir.path().join("1234/1"))
        );
        assert!(dir.path().join("1234/678/dublin_core.xml").exists());
        assert!(dir.path().join("1234/1/dublin_core.xml").exists());
    }

    #[test]
    fn test_unreadable_metadata_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bundle_dir = dir.path().join("1234/0");
        fs::create_dir_all(&bundle_dir).unwrap();
        fs::write(bundle_dir.join(METADATA_FILE_NAME), "not xml at all").unwrap();

        assert!(BundleRenamer::new(dir.path()).rename_all().is_err());
    }
}
