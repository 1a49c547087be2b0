use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    Committed,
    RolledBack,
}

impl TransactionStatus {
    /// Returns `true` when a transition from `self` to `target` is valid.
    /// `Committed` and `RolledBack` are terminal — nothing leaves them.
    pub fn can_transition_to(&self, target: &TransactionStatus) -> bool {
        matches!(
            (self, target),
            (TransactionStatus::Active, TransactionStatus::Committed)
                | (TransactionStatus::Active, TransactionStatus::RolledBack)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Active)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Committed => "committed",
            TransactionStatus::RolledBack => "rolled_back",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// TransactionOptions
// ---------------------------------------------------------------------------

/// Per-transaction behavior knobs, captured at start time from config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Commit automatically once the host signals end-of-task success.
    #[serde(default)]
    pub auto_commit: bool,
    /// Surface a rollback advisory when a tracked modification fails.
    #[serde(default = "default_true")]
    pub auto_rollback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            auto_commit: false,
            auto_rollback: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ModifiedFile
// ---------------------------------------------------------------------------

/// One tracked modification. Its position in `Transaction::modified_files`
/// is its ordering index; restores replay these entries newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedFile {
    /// Project-relative path of the file the external tool touched.
    pub path: String,
    /// External operation kind that touched it (e.g. `edit`, `create`).
    pub tool: String,
    pub timestamp: DateTime<Utc>,
    /// Backup artifact location. `None` means the file did not exist before
    /// this modification — restore deletes it instead of overwriting.
    pub backup_path: Option<String>,
    pub is_new: bool,
}

// ---------------------------------------------------------------------------
// Savepoint
// ---------------------------------------------------------------------------

/// A named checkpoint: everything before `file_index` is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Savepoint {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    /// Number of `ModifiedFile` entries recorded when this savepoint was
    /// created. Non-decreasing across the savepoint list.
    pub file_index: usize,
}

impl Savepoint {
    pub fn new(name: impl Into<String>, file_index: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            timestamp: Utc::now(),
            file_index,
        }
    }
}

// ---------------------------------------------------------------------------
// VerificationResult
// ---------------------------------------------------------------------------

/// Append-only audit record of a completed external operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub tool: String,
    pub file: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// One atomic unit of tracked file modifications. At most one transaction
/// is active per project; commit and rollback are permanent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled_back_at: Option<DateTime<Utc>>,
    pub description: String,
    pub modified_files: Vec<ModifiedFile>,
    pub savepoints: Vec<Savepoint>,
    pub verification_results: Vec<VerificationResult>,
    pub options: TransactionOptions,
}

impl Transaction {
    /// Create a fresh active transaction with the "initial" savepoint at
    /// index 0.
    pub fn new(description: impl Into<String>, options: TransactionOptions) -> Self {
        Self {
            transaction_id: Self::generate_id(),
            status: TransactionStatus::Active,
            started_at: Utc::now(),
            committed_at: None,
            rolled_back_at: None,
            description: description.into(),
            modified_files: Vec::new(),
            savepoints: vec![Savepoint::new("initial", 0)],
            verification_results: Vec::new(),
            options,
        }
    }

    /// Time-based id with a random suffix to minimize collision across
    /// hook processes started in the same millisecond.
    pub fn generate_id() -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        format!("tx_{millis}_{}", &suffix[..8])
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Append an audit record. The log is never mutated or truncated.
    pub fn record_verification(
        &mut self,
        tool: impl Into<String>,
        file: impl Into<String>,
        success: bool,
    ) {
        self.verification_results.push(VerificationResult {
            tool: tool.into(),
            file: file.into(),
            success,
            timestamp: Utc::now(),
        });
    }

    /// `(passed, failed)` tally over the verification log.
    pub fn verification_summary(&self) -> (usize, usize) {
        let passed = self
            .verification_results
            .iter()
            .filter(|v| v.success)
            .count();
        (passed, self.verification_results.len() - passed)
    }

    /// Look up a savepoint by id or display name.
    pub fn find_savepoint(&self, key: &str) -> Option<&Savepoint> {
        self.savepoints
            .iter()
            .find(|sp| sp.id == key || sp.name == key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        let active = TransactionStatus::Active;
        assert!(active.can_transition_to(&TransactionStatus::Committed));
        assert!(active.can_transition_to(&TransactionStatus::RolledBack));
        assert!(!TransactionStatus::Committed.can_transition_to(&TransactionStatus::Active));
        assert!(!TransactionStatus::RolledBack.can_transition_to(&TransactionStatus::Committed));
        assert!(!active.is_terminal());
        assert!(TransactionStatus::Committed.is_terminal());
    }

    #[test]
    fn new_transaction_has_initial_savepoint() {
        let tx = Transaction::new("refactor auth module", TransactionOptions::default());
        assert!(tx.is_active());
        assert_eq!(tx.savepoints.len(), 1);
        assert_eq!(tx.savepoints[0].name, "initial");
        assert_eq!(tx.savepoints[0].file_index, 0);
        assert!(tx.modified_files.is_empty());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = Transaction::generate_id();
        let b = Transaction::generate_id();
        assert!(a.starts_with("tx_"));
        assert_ne!(a, b);
    }

    #[test]
    fn verification_summary_tallies() {
        let mut tx = Transaction::new("t", TransactionOptions::default());
        tx.record_verification("modify", "a.rs", true);
        tx.record_verification("modify", "b.rs", false);
        tx.record_verification("create", "c.rs", true);
        assert_eq!(tx.verification_summary(), (2, 1));
    }

    #[test]
    fn find_savepoint_by_id_or_name() {
        let mut tx = Transaction::new("t", TransactionOptions::default());
        let sp = Savepoint::new("after-step-1", 3);
        let id = sp.id.clone();
        tx.savepoints.push(sp);

        assert!(tx.find_savepoint("after-step-1").is_some());
        assert!(tx.find_savepoint(&id).is_some());
        assert!(tx.find_savepoint("nope").is_none());
    }

    #[test]
    fn transaction_json_roundtrip() {
        let mut tx = Transaction::new("rename module", TransactionOptions::default());
        tx.modified_files.push(ModifiedFile {
            path: "src/lib.rs".into(),
            tool: "modify".into(),
            timestamp: Utc::now(),
            backup_path: Some("/tmp/backups/0000-src_lib.rs".into()),
            is_new: false,
        });

        let json = serde_json::to_string_pretty(&tx).unwrap();
        assert!(json.contains("\"status\": \"active\""));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_id, tx.transaction_id);
        assert_eq!(back.modified_files.len(), 1);
        assert!(!back.modified_files[0].is_new);
    }

    #[test]
    fn status_wire_format_is_snake_case() {
        let json = serde_json::to_string(&TransactionStatus::RolledBack).unwrap();
        assert_eq!(json, "\"rolled_back\"");
    }
}
