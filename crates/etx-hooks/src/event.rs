//! Wire types for the host event contract.
//!
//! The host sends one JSON event per hook invocation on stdin and reads
//! one JSON response from stdout. Field names are `snake_case` to match
//! the persisted transaction schema.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::advisory::Advisory;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// "About to modify a file" — sent before the external tool mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreModifyEvent {
    /// External operation kind (e.g. `create`, `modify`).
    pub tool_name: String,
    /// Path of the file about to change; absolute or project-relative.
    pub file_path: String,
    pub project_root: PathBuf,
}

/// "Modification finished" — sent after the external tool ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostModifyEvent {
    pub tool_name: String,
    pub file_path: String,
    pub project_root: PathBuf,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The hook's answer to the host. The pre-modification call always
/// continues; the post-modification call may attach operator-facing
/// recovery guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookResponse {
    pub decision: HookDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<Advisory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookDecision {
    /// Let the host proceed. Hooks guarantee backups; they never gate.
    Continue,
}

impl HookResponse {
    pub fn proceed() -> Self {
        Self {
            decision: HookDecision::Continue,
            advisory: None,
        }
    }

    pub fn with_advisory(advisory: Advisory) -> Self {
        Self {
            decision: HookDecision::Continue,
            advisory: Some(advisory),
        }
    }
}

/// Normalize an event path to project-relative form for bookkeeping.
/// Absolute paths under the project root are stripped; anything else is
/// taken as already relative.
pub fn relative_path(project_root: &Path, file_path: &str) -> String {
    let path = Path::new(file_path);
    if path.is_absolute() {
        match path.strip_prefix(project_root) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => file_path.to_string(),
        }
    } else {
        file_path.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_event_deserializes_from_host_json() {
        let json = r#"{
            "tool_name": "modify",
            "file_path": "src/lib.rs",
            "project_root": "/work/proj"
        }"#;
        let event: PreModifyEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.tool_name, "modify");
        assert_eq!(event.file_path, "src/lib.rs");
    }

    #[test]
    fn post_event_error_field_is_optional() {
        let json = r#"{
            "tool_name": "modify",
            "file_path": "src/lib.rs",
            "project_root": "/work/proj",
            "succeeded": true
        }"#;
        let event: PostModifyEvent = serde_json::from_str(json).unwrap();
        assert!(event.succeeded);
        assert!(event.error.is_none());
    }

    #[test]
    fn response_without_advisory_omits_the_field() {
        let json = serde_json::to_string(&HookResponse::proceed()).unwrap();
        assert_eq!(json, r#"{"decision":"continue"}"#);
    }

    #[test]
    fn relative_path_strips_the_project_root() {
        let root = Path::new("/work/proj");
        assert_eq!(relative_path(root, "/work/proj/src/lib.rs"), "src/lib.rs");
        assert_eq!(relative_path(root, "src/lib.rs"), "src/lib.rs");
        // Absolute but outside the root — kept as-is
        assert_eq!(relative_path(root, "/elsewhere/x.rs"), "/elsewhere/x.rs");
    }
}
