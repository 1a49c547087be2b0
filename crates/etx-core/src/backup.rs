//! Backup artifacts: pre-modification copies of files, scoped per
//! transaction.
//!
//! Artifacts live under `<state_dir>/backups/<transaction_id>/` and are
//! keyed by the modification's ordering index plus a sanitized copy of the
//! path. The index alone guarantees uniqueness — the sanitized path is only
//! there so a human poking around the backup directory can tell which file
//! is which.

use std::path::{Path, PathBuf};

use crate::types::ModifiedFile;

/// What `restore` actually did for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Live file overwritten with the backup's bytes.
    Overwritten,
    /// No backup (file was new) — live file deleted.
    Deleted,
    /// No backup and no live file — nothing to do.
    AlreadyAbsent,
}

/// Per-transaction backup area.
pub struct BackupStore {
    project_root: PathBuf,
    backup_dir: PathBuf,
}

impl BackupStore {
    pub fn new(state_dir: &Path, transaction_id: &str, project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            backup_dir: state_dir.join("backups").join(transaction_id),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy the current bytes of `rel_path` into the backup area.
    ///
    /// Returns `Ok(None)` when the file does not exist — there is nothing
    /// to preserve, the file is new. The backup area is created on first
    /// use. The original file is never touched.
    pub fn backup(&self, rel_path: &str, index: usize) -> std::io::Result<Option<PathBuf>> {
        let live = self.project_root.join(rel_path);
        if !live.exists() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.backup_dir)?;
        let artifact = self.backup_dir.join(artifact_name(rel_path, index));
        std::fs::copy(&live, &artifact)?;
        tracing::debug!(
            path = rel_path,
            artifact = %artifact.display(),
            "backed up file"
        );
        Ok(Some(artifact))
    }

    /// Put a tracked file back to its pre-modification state. Idempotent.
    ///
    /// With a backup artifact the live file is overwritten; without one the
    /// live file is deleted (it did not exist before). A recorded backup
    /// whose artifact has gone missing falls back to create-semantics with
    /// a warning — this can lose data if the backup write itself failed
    /// earlier, an acknowledged risk rather than a silent one.
    pub fn restore(&self, file: &ModifiedFile) -> std::io::Result<RestoreOutcome> {
        let live = self.project_root.join(&file.path);

        match &file.backup_path {
            Some(artifact) if Path::new(artifact).exists() => {
                if let Some(parent) = live.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(artifact, &live)?;
                tracing::debug!(path = %file.path, "restored from backup");
                Ok(RestoreOutcome::Overwritten)
            }
            Some(artifact) => {
                tracing::warn!(
                    path = %file.path,
                    artifact = %artifact,
                    "backup artifact missing, treating as newly-created file"
                );
                self.delete_live(&live)
            }
            None => self.delete_live(&live),
        }
    }

    fn delete_live(&self, live: &Path) -> std::io::Result<RestoreOutcome> {
        if live.exists() {
            std::fs::remove_file(live)?;
            Ok(RestoreOutcome::Deleted)
        } else {
            Ok(RestoreOutcome::AlreadyAbsent)
        }
    }

    /// Remove the whole backup area for this transaction. Idempotent.
    pub fn cleanup(&self) {
        if self.backup_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.backup_dir) {
                tracing::warn!(
                    dir = %self.backup_dir.display(),
                    error = %e,
                    "failed to remove backup directory"
                );
            }
        }
    }
}

/// Index-addressed artifact name. The index is the modification's position
/// in the transaction's file list; path separators are collapsed to `_`.
pub fn artifact_name(rel_path: &str, index: usize) -> String {
    let sanitized: String = rel_path
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{index:04}-{sanitized}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
