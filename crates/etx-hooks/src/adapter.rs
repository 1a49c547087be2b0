//! The pre- and post-modification adapters.

use etx_core::config::Config;
use etx_core::controller::TransactionController;
use etx_core::error::Result;

use crate::advisory::failure_advisory;
use crate::event::{relative_path, HookResponse, PostModifyEvent, PreModifyEvent};

/// Binds a project's transaction controller to host events. Constructed
/// fresh per hook invocation (hook processes are short-lived).
pub struct HookAdapter {
    controller: TransactionController,
}

impl HookAdapter {
    /// Adapter for a project root, loading its config from disk.
    pub fn open(project_root: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self {
            controller: TransactionController::open(project_root)?,
        })
    }

    /// Adapter with an explicit config (tests, embedding).
    pub fn with_config(project_root: impl Into<std::path::PathBuf>, config: Config) -> Self {
        Self {
            controller: TransactionController::new(project_root, config),
        }
    }

    pub fn controller(&self) -> &TransactionController {
        &self.controller
    }

    /// "About to modify": make sure a transaction exists and a backup is
    /// taken before the tool touches the file. Never blocks — on any
    /// internal failure the host still gets `Continue`, just without the
    /// safety net (logged loudly).
    pub fn on_pre_modify(&self, event: &PreModifyEvent) -> HookResponse {
        if !self
            .controller
            .config()
            .hooks
            .is_transactional(&event.tool_name)
        {
            return HookResponse::proceed();
        }

        let rel = relative_path(&event.project_root, &event.file_path);
        match self.controller.track_modification(&rel, &event.tool_name) {
            Ok(tx) => {
                tracing::debug!(
                    transaction_id = %tx.transaction_id,
                    path = %rel,
                    "pre-modify tracked"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %rel,
                    error = %e,
                    "pre-modify tracking failed, continuing without backup"
                );
            }
        }
        HookResponse::proceed()
    }

    /// "Modification finished": append the outcome to the audit log. A
    /// failure with `auto_rollback` set attaches the recovery menu — the
    /// decision stays with the operator, the transaction stays active.
    pub fn on_post_modify(&self, event: &PostModifyEvent) -> HookResponse {
        if !self
            .controller
            .config()
            .hooks
            .is_transactional(&event.tool_name)
        {
            return HookResponse::proceed();
        }

        let rel = relative_path(&event.project_root, &event.file_path);
        let tx = match self
            .controller
            .record_verification(&event.tool_name, &rel, event.succeeded)
        {
            Ok(tx) => tx,
            Err(e) => {
                tracing::warn!(
                    path = %rel,
                    error = %e,
                    "post-modify verification not recorded"
                );
                return HookResponse::proceed();
            }
        };

        if !event.succeeded && tx.options.auto_rollback {
            let advisory = failure_advisory(&tx, &rel, event.error.as_deref());
            tracing::info!(
                transaction_id = %tx.transaction_id,
                path = %rel,
                "modification failed, advisory returned"
            );
            return HookResponse::with_advisory(advisory);
        }

        HookResponse::proceed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
