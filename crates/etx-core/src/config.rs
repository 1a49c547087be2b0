use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::TransactionOptions;

/// Directory under the project root holding all edit-tx state: the config
/// file, the transaction document, the lockfile, and backup artifacts.
pub const STATE_DIR_NAME: &str = ".edit-tx";

/// Top-level configuration loaded from `<project>/.edit-tx/config.toml`.
///
/// Loaded once per hook invocation; a missing file yields defaults, a
/// malformed file is a hard error so a typo never silently disables
/// backups.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub transaction: TransactionConfig,
    #[serde(default)]
    pub hooks: HooksConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// The state directory for a project root.
    pub fn state_dir(project_root: &Path) -> PathBuf {
        project_root.join(STATE_DIR_NAME)
    }

    /// Config file path for a project root.
    pub fn config_path(project_root: &Path) -> PathBuf {
        Self::state_dir(project_root).join("config.toml")
    }

    /// Load config for a project, falling back to defaults when the file
    /// does not exist.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = Self::config_path(project_root);
        if path.exists() {
            let text =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let cfg: Config =
                toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
            cfg.validate()?;
            Ok(cfg)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transaction.max_savepoints == 0 {
            return Err(ConfigError::Invalid(
                "transaction.max_savepoints must be at least 1".into(),
            ));
        }
        if self.hooks.transactional_tools.is_empty() {
            return Err(ConfigError::Invalid(
                "hooks.transactional_tools must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Per-transaction options derived from config defaults.
    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            auto_commit: self.transaction.auto_commit,
            auto_rollback: self.transaction.auto_rollback,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Bounded savepoint ring size; oldest evicted first past this count.
    pub max_savepoints: usize,
    pub auto_commit: bool,
    pub auto_rollback: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_savepoints: 10,
            auto_commit: false,
            auto_rollback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Tool names whose modifications are tracked. Anything else passes
    /// through the hooks untouched.
    pub transactional_tools: Vec<String>,
}

impl HooksConfig {
    pub fn is_transactional(&self, tool_name: &str) -> bool {
        self.transactional_tools.iter().any(|t| t == tool_name)
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            transactional_tools: vec!["create".into(), "modify".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Take a best-effort working-tree stash when a transaction starts.
    pub stash_enabled: bool,
    /// Stage modified paths on commit (best-effort, never blocks commit).
    pub stage_on_commit: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            stash_enabled: true,
            stage_on_commit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
