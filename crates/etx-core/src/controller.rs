//! Transaction controller — the state machine driving
//! start → (modify)* → (savepoint)* → commit | rollback.
//!
//! Every public operation is one read-modify-write cycle against the
//! persisted state document, serialized by the advisory [`StateLock`]:
//! acquire the lock, load, mutate, save, release. Hook invocations are
//! short-lived processes, so no state is held in memory between calls.
//!
//! The core correctness rule lives in [`TransactionController::track_modification`]:
//! the backup is captured **before** the external mutation is allowed to
//! proceed — otherwise rollback would restore already-mutated content.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::backup::BackupStore;
use crate::config::Config;
use crate::error::{Result, TxError};
use crate::git_stash;
use crate::lockfile::StateLock;
use crate::savepoint;
use crate::state_store::TransactionStore;
use crate::types::{
    ModifiedFile, Savepoint, Transaction, TransactionOptions, TransactionStatus,
};

pub struct TransactionController {
    project_root: PathBuf,
    state_dir: PathBuf,
    store: TransactionStore,
    config: Config,
}

impl TransactionController {
    /// Controller for a project root with an explicit config (tests,
    /// embedding).
    pub fn new(project_root: impl Into<PathBuf>, config: Config) -> Self {
        let project_root = project_root.into();
        let state_dir = Config::state_dir(&project_root);
        let store = TransactionStore::new(&state_dir);
        Self {
            project_root,
            state_dir,
            store,
            config,
        }
    }

    /// Controller for a project root, loading its config from
    /// `.edit-tx/config.toml` (defaults when absent).
    pub fn open(project_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        let config = Config::load(&project_root)?;
        Ok(Self::new(project_root, config))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a fresh transaction. Refuses while another is active.
    pub fn begin(
        &self,
        description: &str,
        options: TransactionOptions,
    ) -> Result<Transaction> {
        let _lock = self.lock()?;
        if let Some(existing) = self.store.load()? {
            if existing.is_active() {
                return Err(TxError::AlreadyActive(existing.transaction_id));
            }
        }
        self.start_locked(description, options)
    }

    /// Return the active transaction, starting one when none is active.
    ///
    /// This is the explicit `none → active` transition: the first tracked
    /// modification of a task lands here rather than requiring the host to
    /// call `begin` up front.
    pub fn ensure_active(&self, description: &str) -> Result<Transaction> {
        let _lock = self.lock()?;
        self.ensure_active_locked(description)
    }

    fn ensure_active_locked(&self, description: &str) -> Result<Transaction> {
        match self.store.load()? {
            Some(tx) if tx.is_active() => Ok(tx),
            _ => {
                tracing::info!(description, "no active transaction, auto-starting");
                self.start_locked(description, self.config.transaction_options())
            }
        }
    }

    fn start_locked(
        &self,
        description: &str,
        options: TransactionOptions,
    ) -> Result<Transaction> {
        let tx = Transaction::new(description, options);
        if self.config.git.stash_enabled {
            git_stash::create_stash(&self.project_root, &tx.transaction_id);
        }
        self.store.save(&tx)?;
        tracing::info!(
            transaction_id = %tx.transaction_id,
            description,
            "started transaction"
        );
        Ok(tx)
    }

    // -----------------------------------------------------------------------
    // Modification tracking
    // -----------------------------------------------------------------------

    /// Record an imminent modification of `rel_path` by `tool`, capturing a
    /// backup first. Auto-starts a transaction when none is active.
    ///
    /// A failed backup of an existing file degrades to create-semantics
    /// (`backup_path: None`) rather than aborting the step — a later
    /// rollback will then delete the file instead of restoring it, an
    /// acknowledged data-loss risk that is logged loudly here.
    pub fn track_modification(&self, rel_path: &str, tool: &str) -> Result<Transaction> {
        let _lock = self.lock()?;
        let mut tx =
            self.ensure_active_locked(&format!("Auto-started for {tool} {rel_path}"))?;

        let backups = self.backups(&tx.transaction_id);
        let index = tx.modified_files.len();
        let backup_path = match backups.backup(rel_path, index) {
            Ok(artifact) => artifact.map(|p| p.display().to_string()),
            Err(e) => {
                tracing::warn!(
                    path = rel_path,
                    error = %e,
                    "backup failed, falling back to create-semantics for this file"
                );
                None
            }
        };
        let is_new = backup_path.is_none();

        tx.modified_files.push(ModifiedFile {
            path: rel_path.to_string(),
            tool: tool.to_string(),
            timestamp: Utc::now(),
            backup_path,
            is_new,
        });
        self.store.save(&tx)?;

        tracing::debug!(
            transaction_id = %tx.transaction_id,
            path = rel_path,
            tool,
            index,
            is_new,
            "tracked modification"
        );
        Ok(tx)
    }

    /// Append an audit record for a completed operation.
    pub fn record_verification(
        &self,
        tool: &str,
        file: &str,
        success: bool,
    ) -> Result<Transaction> {
        let _lock = self.lock()?;
        let mut tx = self.require_active_locked()?;
        tx.record_verification(tool, file, success);
        self.store.save(&tx)?;
        Ok(tx)
    }

    // -----------------------------------------------------------------------
    // Savepoints
    // -----------------------------------------------------------------------

    /// Create a savepoint at the current modification count.
    pub fn create_savepoint(&self, name: Option<&str>) -> Result<Savepoint> {
        let _lock = self.lock()?;
        let mut tx = self.require_active_locked()?;
        let sp = savepoint::create_savepoint(
            &mut tx,
            name,
            self.config.transaction.max_savepoints,
        );
        self.store.save(&tx)?;
        Ok(sp)
    }

    /// Roll back to a savepoint (by id or name), restoring every file
    /// tracked after it. Returns the number of files restored. The
    /// transaction stays active.
    pub fn rollback_to_savepoint(&self, key: &str) -> Result<usize> {
        let _lock = self.lock()?;
        let mut tx = self.require_active_locked()?;
        let backups = self.backups(&tx.transaction_id);
        let restored = savepoint::rollback_to_savepoint(&mut tx, &backups, key)?;
        self.store.save(&tx)?;
        Ok(restored)
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// Commit: accept all tracked modifications, drop the backup area, and
    /// transition to `committed`. Staging into git is best-effort and never
    /// blocks the commit.
    pub fn commit(&self) -> Result<Transaction> {
        let _lock = self.lock()?;
        let mut tx = self.require_active_locked()?;

        if self.config.git.stage_on_commit {
            let paths: Vec<String> =
                tx.modified_files.iter().map(|f| f.path.clone()).collect();
            git_stash::stage_paths(&self.project_root, &paths);
        }

        self.backups(&tx.transaction_id).cleanup();
        tx.status = TransactionStatus::Committed;
        tx.committed_at = Some(Utc::now());
        self.store.save(&tx)?;

        tracing::info!(
            transaction_id = %tx.transaction_id,
            files = tx.modified_files.len(),
            "committed transaction"
        );
        Ok(tx)
    }

    /// Roll back every tracked modification in reverse order, drop the
    /// backup area, and transition to `rolled_back`. Returns the number of
    /// files restored.
    pub fn rollback(&self) -> Result<usize> {
        let _lock = self.lock()?;
        let mut tx = self.require_active_locked()?;
        let backups = self.backups(&tx.transaction_id);

        let mut restored = 0;
        for file in tx.modified_files.iter().rev() {
            backups.restore(file)?;
            restored += 1;
        }

        backups.cleanup();
        tx.status = TransactionStatus::RolledBack;
        tx.rolled_back_at = Some(Utc::now());
        self.store.save(&tx)?;

        tracing::info!(
            transaction_id = %tx.transaction_id,
            restored,
            "rolled back transaction"
        );
        Ok(restored)
    }

    // -----------------------------------------------------------------------
    // Auxiliary snapshot
    // -----------------------------------------------------------------------

    /// Re-apply the working-tree stash taken when the current transaction
    /// started. Best-effort; `false` when no stash exists or git fails.
    pub fn restore_working_tree(&self) -> Result<bool> {
        let tx = self.require_active()?;
        Ok(git_stash::restore_stash(
            &self.project_root,
            &tx.transaction_id,
        ))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// The persisted transaction, active or terminal. Read-only, lock-free.
    pub fn status(&self) -> Result<Option<Transaction>> {
        self.store.load()
    }

    /// The active transaction, or `NoActiveTransaction`.
    pub fn require_active(&self) -> Result<Transaction> {
        self.require_active_locked()
    }

    fn require_active_locked(&self) -> Result<Transaction> {
        match self.store.load()? {
            Some(tx) if tx.is_active() => Ok(tx),
            _ => Err(TxError::NoActiveTransaction),
        }
    }

    fn lock(&self) -> Result<StateLock> {
        StateLock::acquire(&self.state_dir)
    }

    fn backups(&self, transaction_id: &str) -> BackupStore {
        BackupStore::new(&self.state_dir, transaction_id, &self.project_root)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut cfg = Config::default();
        // Keep unit tests hermetic: no git shell-outs
        cfg.git.stash_enabled = false;
        cfg.git.stage_on_commit = false;
        cfg
    }

    fn controller() -> (TransactionController, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ctrl = TransactionController::new(dir.path(), test_config());
        (ctrl, dir)
    }

    #[test]
    fn begin_persists_active_transaction() {
        let (ctrl, _dir) = controller();
        let tx = ctrl
            .begin("split parser module", TransactionOptions::default())
            .unwrap();
        assert!(tx.is_active());

        let loaded = ctrl.status().unwrap().unwrap();
        assert_eq!(loaded.transaction_id, tx.transaction_id);
        assert_eq!(loaded.savepoints[0].name, "initial");
    }

    #[test]
    fn begin_refuses_while_active() {
        let (ctrl, _dir) = controller();
        ctrl.begin("first", TransactionOptions::default()).unwrap();
        let err = ctrl
            .begin("second", TransactionOptions::default())
            .unwrap_err();
        assert!(matches!(err, TxError::AlreadyActive(_)));
    }

    #[test]
    fn ensure_active_is_the_none_to_active_transition() {
        let (ctrl, _dir) = controller();
        // none -> active
        let tx = ctrl.ensure_active("auto").unwrap();
        assert!(tx.is_active());
        // active -> same transaction, no restart
        let again = ctrl.ensure_active("other").unwrap();
        assert_eq!(again.transaction_id, tx.transaction_id);
        assert_eq!(again.description, "auto");
    }

    #[test]
    fn ensure_active_after_terminal_starts_fresh() {
        let (ctrl, _dir) = controller();
        let first = ctrl.ensure_active("one").unwrap();
        ctrl.commit().unwrap();

        let second = ctrl.ensure_active("two").unwrap();
        assert_ne!(second.transaction_id, first.transaction_id);
        assert!(second.is_active());
    }

    #[test]
    fn track_modification_auto_starts() {
        let (ctrl, dir) = controller();
        std::fs::write(dir.path().join("a.txt"), "X").unwrap();

        let tx = ctrl.track_modification("a.txt", "modify").unwrap();
        assert!(tx.is_active());
        assert_eq!(tx.modified_files.len(), 1);
        assert!(!tx.modified_files[0].is_new);
        assert!(tx.modified_files[0].backup_path.is_some());
    }

    #[test]
    fn tracking_a_missing_file_records_create_semantics() {
        let (ctrl, _dir) = controller();
        let tx = ctrl.track_modification("brand-new.txt", "create").unwrap();
        assert!(tx.modified_files[0].is_new);
        assert!(tx.modified_files[0].backup_path.is_none());
    }

    #[test]
    fn commit_after_rollback_is_no_active_transaction() {
        let (ctrl, _dir) = controller();
        ctrl.begin("t", TransactionOptions::default()).unwrap();
        ctrl.rollback().unwrap();

        assert!(matches!(ctrl.commit(), Err(TxError::NoActiveTransaction)));
    }

    #[test]
    fn rollback_after_commit_is_no_active_transaction() {
        let (ctrl, _dir) = controller();
        ctrl.begin("t", TransactionOptions::default()).unwrap();
        ctrl.commit().unwrap();

        assert!(matches!(ctrl.rollback(), Err(TxError::NoActiveTransaction)));
    }

    #[test]
    fn operations_without_any_transaction_fail_cleanly() {
        let (ctrl, _dir) = controller();
        assert!(matches!(ctrl.commit(), Err(TxError::NoActiveTransaction)));
        assert!(matches!(ctrl.rollback(), Err(TxError::NoActiveTransaction)));
        assert!(matches!(
            ctrl.create_savepoint(None),
            Err(TxError::NoActiveTransaction)
        ));
        assert!(matches!(
            ctrl.rollback_to_savepoint("initial"),
            Err(TxError::NoActiveTransaction)
        ));
    }

    #[test]
    fn restore_working_tree_requires_active() {
        let (ctrl, _dir) = controller();
        assert!(matches!(
            ctrl.restore_working_tree(),
            Err(TxError::NoActiveTransaction)
        ));
    }

    #[test]
    fn restore_working_tree_outside_git_is_non_fatal() {
        let (ctrl, _dir) = controller();
        ctrl.begin("t", TransactionOptions::default()).unwrap();
        assert!(!ctrl.restore_working_tree().unwrap());
    }

    #[test]
    fn record_verification_appends_to_audit_log() {
        let (ctrl, _dir) = controller();
        ctrl.begin("t", TransactionOptions::default()).unwrap();
        ctrl.record_verification("modify", "a.rs", true).unwrap();
        let tx = ctrl.record_verification("modify", "b.rs", false).unwrap();

        assert_eq!(tx.verification_results.len(), 2);
        assert_eq!(tx.verification_summary(), (1, 1));
    }
}
