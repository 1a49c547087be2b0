use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// Commit/rollback/savepoint requested while no transaction is active.
    /// Produces no side effects.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// `begin` refused because another transaction is still active.
    #[error("transaction already active: {0}")]
    AlreadyActive(String),

    #[error("savepoint not found: {0}")]
    SavepointNotFound(String),

    /// The advisory state lock could not be acquired within the retry budget.
    #[error("state lock busy: {0}")]
    LockBusy(String),

    /// State-document serialization or persistence failure.
    #[error("state store error: {0}")]
    State(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TxError>;
