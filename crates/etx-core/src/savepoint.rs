//! Savepoints: named checkpoints inside a transaction.
//!
//! A savepoint records how many modifications were accepted at creation
//! time (`file_index`). Rolling back to one restores every modification
//! recorded after it — newest-first, so repeated edits to the same path
//! layer back to the pre-savepoint content — and truncates the bookkeeping
//! to match.

use crate::backup::BackupStore;
use crate::error::{Result, TxError};
use crate::types::{Savepoint, Transaction};

/// Append a new savepoint at the current file count.
///
/// Auto-named `savepoint_N` when no name is given. The ring is bounded at
/// `max_savepoints`: the oldest entry is evicted first. Eviction is
/// bookkeeping only — backups taken for modifications that are no longer
/// reachable by any retained savepoint stay on disk for the full rollback.
pub fn create_savepoint(
    tx: &mut Transaction,
    name: Option<&str>,
    max_savepoints: usize,
) -> Savepoint {
    let name = match name {
        Some(n) => n.to_string(),
        None => format!("savepoint_{}", tx.savepoints.len()),
    };
    let sp = Savepoint::new(name, tx.modified_files.len());
    tx.savepoints.push(sp.clone());

    while tx.savepoints.len() > max_savepoints {
        let evicted = tx.savepoints.remove(0);
        tracing::debug!(
            savepoint = %evicted.name,
            file_index = evicted.file_index,
            "evicted oldest savepoint"
        );
    }

    tracing::info!(
        transaction_id = %tx.transaction_id,
        savepoint = %sp.name,
        file_index = sp.file_index,
        "created savepoint"
    );
    sp
}

/// Roll the transaction back to a savepoint, identified by id or name.
///
/// Every `ModifiedFile` at index ≥ the savepoint's `file_index` is restored
/// in reverse order (most recent first — a path modified twice must undo
/// the later write before the earlier one). On success the file list is
/// truncated to `file_index` and savepoints created after the target are
/// dropped; the target itself is retained as the new tail. Returns the
/// number of files restored.
///
/// A restore failure propagates before any bookkeeping is touched, so the
/// state never claims a rollback that did not happen.
pub fn rollback_to_savepoint(
    tx: &mut Transaction,
    backups: &BackupStore,
    key: &str,
) -> Result<usize> {
    let pos = tx
        .savepoints
        .iter()
        .position(|sp| sp.id == key || sp.name == key)
        .ok_or_else(|| TxError::SavepointNotFound(key.to_string()))?;
    let file_index = tx.savepoints[pos].file_index;

    let mut restored = 0;
    let tail = tx.modified_files.get(file_index..).unwrap_or(&[]);
    for file in tail.iter().rev() {
        backups.restore(file)?;
        restored += 1;
    }

    tx.modified_files.truncate(file_index);
    tx.savepoints.truncate(pos + 1);

    tracing::info!(
        transaction_id = %tx.transaction_id,
        savepoint = key,
        restored,
        "rolled back to savepoint"
    );
    Ok(restored)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
