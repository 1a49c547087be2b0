//! Persisted transaction state.
//!
//! A single JSON document (`<project>/.edit-tx/transaction.json`) is the
//! sole source of truth shared by all hook invocations. Callers never touch
//! the file directly — they go through [`TransactionStore`], which writes by
//! whole-document replacement (temp file + rename) so a crash between open
//! and close never leaves a half-written state behind.
//!
//! A document that fails to parse is treated as "no transaction": hook
//! processes must be able to recover from a corrupt state file by starting
//! fresh rather than wedging every subsequent modification.

use std::path::{Path, PathBuf};

use crate::error::{Result, TxError};
use crate::types::Transaction;

pub struct TransactionStore {
    path: PathBuf,
}

impl TransactionStore {
    /// Store rooted at a state directory (`.edit-tx/`).
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join("transaction.json"),
        }
    }

    /// The backing document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted transaction, if any.
    ///
    /// Missing file and unparseable JSON both yield `Ok(None)` — the latter
    /// with a warning, since it means the previous writer died mid-flight or
    /// the file was hand-edited.
    pub fn load(&self) -> Result<Option<Transaction>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Transaction>(&data) {
            Ok(tx) => Ok(Some(tx)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "transaction state unreadable, treating as no transaction"
                );
                Ok(None)
            }
        }
    }

    /// Persist the transaction by whole-document replacement.
    pub fn save(&self, tx: &Transaction) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(tx).map_err(|e| TxError::State(e.to_string()))?;

        // Write-then-rename keeps readers from ever observing a torn write.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Remove the persisted document. Idempotent.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
