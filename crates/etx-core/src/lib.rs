//! Core transaction engine for edit-tx.
//!
//! Tracks a sequence of agent-driven file modifications as one atomic unit
//! of work: every file is backed up before the external tool touches it,
//! savepoints mark partially-accepted progress, and the whole unit ends in
//! exactly one of `commit` or `rollback`. State lives in a single JSON
//! document under the project's `.edit-tx/` directory, guarded by an
//! advisory lockfile so overlapping hook processes serialize their
//! read-modify-write cycles.

pub mod backup;
pub mod config;
pub mod controller;
pub mod error;
pub mod git_stash;
pub mod lockfile;
pub mod savepoint;
pub mod state_store;
pub mod types;

pub use config::Config;
pub use controller::TransactionController;
pub use error::{Result, TxError};
pub use types::{
    ModifiedFile, Savepoint, Transaction, TransactionOptions, TransactionStatus,
    VerificationResult,
};
