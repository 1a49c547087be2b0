//! Hook entry points: one JSON event on stdin, one JSON response on
//! stdout, exit code 0.
//!
//! The pre-modification call must never block the host's tool, so every
//! internal failure — unreadable event, unloadable config, engine error —
//! degrades to a plain `continue` response with a warning on stderr.

use std::io::Read;

use serde::de::DeserializeOwned;

use etx_hooks::event::{HookResponse, PostModifyEvent, PreModifyEvent};
use etx_hooks::HookAdapter;

pub fn run_pre() -> anyhow::Result<()> {
    let input = read_stdin()?;
    emit(&pre_response(&input))
}

pub fn run_post() -> anyhow::Result<()> {
    let input = read_stdin()?;
    emit(&post_response(&input))
}

fn pre_response(input: &str) -> HookResponse {
    let event: PreModifyEvent = match parse_event(input) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable pre-modify event, continuing");
            return HookResponse::proceed();
        }
    };

    match HookAdapter::open(&event.project_root) {
        Ok(adapter) => adapter.on_pre_modify(&event),
        Err(e) => {
            tracing::warn!(error = %e, "hook adapter unavailable, continuing");
            HookResponse::proceed()
        }
    }
}

fn post_response(input: &str) -> HookResponse {
    let event: PostModifyEvent = match parse_event(input) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable post-modify event, continuing");
            return HookResponse::proceed();
        }
    };

    match HookAdapter::open(&event.project_root) {
        Ok(adapter) => adapter.on_post_modify(&event),
        Err(e) => {
            tracing::warn!(error = %e, "hook adapter unavailable, continuing");
            HookResponse::proceed()
        }
    }
}

fn parse_event<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

fn emit(response: &HookResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use etx_hooks::event::HookDecision;
    use serde_json::json;

    #[test]
    fn garbage_input_still_continues() {
        let response = pre_response("not json at all");
        assert_eq!(response.decision, HookDecision::Continue);
        assert!(response.advisory.is_none());

        let response = post_response("{}");
        assert_eq!(response.decision, HookDecision::Continue);
    }

    #[test]
    fn pre_event_tracks_through_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        // Disable git so the test stays hermetic
        let state_dir = dir.path().join(".edit-tx");
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(
            state_dir.join("config.toml"),
            "[git]\nstash_enabled = false\nstage_on_commit = false\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.txt"), "X").unwrap();

        let input = json!({
            "tool_name": "modify",
            "file_path": "a.txt",
            "project_root": dir.path(),
        })
        .to_string();

        let response = pre_response(&input);
        assert_eq!(response.decision, HookDecision::Continue);

        let state = std::fs::read_to_string(state_dir.join("transaction.json")).unwrap();
        assert!(state.contains("\"a.txt\""));
    }

    #[test]
    fn post_failure_event_yields_an_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join(".edit-tx");
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(
            state_dir.join("config.toml"),
            "[git]\nstash_enabled = false\nstage_on_commit = false\n",
        )
        .unwrap();

        let pre = json!({
            "tool_name": "create",
            "file_path": "b.txt",
            "project_root": dir.path(),
        })
        .to_string();
        pre_response(&pre);

        let post = json!({
            "tool_name": "create",
            "file_path": "b.txt",
            "project_root": dir.path(),
            "succeeded": false,
            "error": "write truncated",
        })
        .to_string();

        let response = post_response(&post);
        let advisory = response.advisory.expect("advisory on failure");
        assert!(advisory.message.contains("write truncated"));
    }
}
