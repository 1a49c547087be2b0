//! Operator-facing recovery guidance.
//!
//! When a tracked modification fails, the engine does not decide what to
//! do — it presents the human (or supervising agent) an explicit menu:
//! roll everything back, roll back to a savepoint, push on, or checkpoint
//! the good work first. The advisory carries both the rendered text and
//! structured metadata so hosts can build their own UI on top.

use serde::{Deserialize, Serialize};

use etx_core::types::{Transaction, TransactionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advisory {
    /// Rendered guidance text, ready to show as-is.
    pub message: String,
    pub transaction_id: String,
    pub status: TransactionStatus,
    /// The file whose modification failed.
    pub file: String,
    pub suggested_actions: Vec<SuggestedAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Rollback,
    RollbackToSavepoint,
    Continue,
    SavepointAndContinue,
}

impl SuggestedAction {
    fn describe(&self) -> &'static str {
        match self {
            SuggestedAction::Rollback => "rollback — undo every tracked modification",
            SuggestedAction::RollbackToSavepoint => {
                "rollback-to-savepoint — undo back to a named checkpoint"
            }
            SuggestedAction::Continue => "continue — keep going despite the failure",
            SuggestedAction::SavepointAndContinue => {
                "savepoint-and-continue — checkpoint accepted work, then keep going"
            }
        }
    }
}

/// Build the advisory for a failed modification of `file`.
pub fn failure_advisory(tx: &Transaction, file: &str, error: Option<&str>) -> Advisory {
    let actions = suggested_actions(tx);

    let mut message = match error {
        Some(err) => format!("Modification of {file} failed: {err}.\n"),
        None => format!("Modification of {file} failed.\n"),
    };
    message.push_str(&format!(
        "Transaction {} has {} tracked modification(s) and {} savepoint(s).\n",
        tx.transaction_id,
        tx.modified_files.len(),
        tx.savepoints.len(),
    ));
    message.push_str("Recovery options:\n");
    for action in &actions {
        message.push_str(&format!("  - {}\n", action.describe()));
    }

    Advisory {
        message,
        transaction_id: tx.transaction_id.clone(),
        status: tx.status,
        file: file.to_string(),
        suggested_actions: actions,
    }
}

/// Rollback-to-savepoint only makes sense when a checkpoint exists beyond
/// the implicit "initial" one; savepoint-and-continue only when there is
/// accepted work to protect.
fn suggested_actions(tx: &Transaction) -> Vec<SuggestedAction> {
    let mut actions = vec![SuggestedAction::Rollback];
    if tx.savepoints.len() > 1 {
        actions.push(SuggestedAction::RollbackToSavepoint);
    }
    actions.push(SuggestedAction::Continue);
    if !tx.modified_files.is_empty() {
        actions.push(SuggestedAction::SavepointAndContinue);
    }
    actions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use etx_core::types::{ModifiedFile, TransactionOptions};

    fn tx_with_files(n: usize) -> Transaction {
        let mut tx = Transaction::new("t", TransactionOptions::default());
        for i in 0..n {
            tx.modified_files.push(ModifiedFile {
                path: format!("f{i}.txt"),
                tool: "modify".into(),
                timestamp: Utc::now(),
                backup_path: None,
                is_new: true,
            });
        }
        tx
    }

    #[test]
    fn advisory_carries_structured_metadata() {
        let tx = tx_with_files(2);
        let advisory = failure_advisory(&tx, "f1.txt", Some("patch did not apply"));

        assert_eq!(advisory.transaction_id, tx.transaction_id);
        assert_eq!(advisory.status, TransactionStatus::Active);
        assert_eq!(advisory.file, "f1.txt");
        assert!(advisory.message.contains("patch did not apply"));
        assert!(advisory.message.contains("2 tracked modification(s)"));
    }

    #[test]
    fn fresh_transaction_offers_no_savepoint_actions() {
        let tx = tx_with_files(0);
        let advisory = failure_advisory(&tx, "a.txt", None);

        assert_eq!(
            advisory.suggested_actions,
            vec![SuggestedAction::Rollback, SuggestedAction::Continue]
        );
    }

    #[test]
    fn savepoints_and_tracked_work_unlock_the_full_menu() {
        let mut tx = tx_with_files(3);
        tx.savepoints
            .push(etx_core::types::Savepoint::new("s1", 2));
        let advisory = failure_advisory(&tx, "f2.txt", None);

        assert_eq!(
            advisory.suggested_actions,
            vec![
                SuggestedAction::Rollback,
                SuggestedAction::RollbackToSavepoint,
                SuggestedAction::Continue,
                SuggestedAction::SavepointAndContinue,
            ]
        );
        assert!(advisory.message.contains("rollback-to-savepoint"));
    }

    #[test]
    fn action_wire_format_is_snake_case() {
        let json = serde_json::to_string(&SuggestedAction::SavepointAndContinue).unwrap();
        assert_eq!(json, "\"savepoint_and_continue\"");
    }
}
