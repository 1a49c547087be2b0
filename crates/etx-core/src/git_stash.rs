//! Auxiliary working-tree snapshots via git stash.
//!
//! A secondary, best-effort safety net alongside the backup store: when a
//! transaction starts, the working tree can be captured as a stash entry
//! tagged with the transaction id, and later re-applied if everything else
//! went wrong. Every failure here is non-fatal — the backup/restore
//! mechanism is the primary contract and works without git entirely.
//!
//! Stash writes shell out to `git`; enumeration uses libgit2 when the
//! default `libgit2` feature is enabled (no process spawn), with a
//! shell-out fallback otherwise.

use std::path::Path;
use std::process::Command;

fn stash_marker(transaction_id: &str) -> String {
    format!("etx:{transaction_id}")
}

/// Snapshot the working tree into a stash entry tagged with the
/// transaction id. Returns `false` when there is nothing to stash, the
/// directory is not a git repository, or git is unavailable.
///
/// Uses `git stash create` + `git stash store` so the working tree is left
/// untouched — unlike `git stash push`, which would revert the very edits
/// the transaction is about to track.
pub fn create_stash(workdir: &Path, transaction_id: &str) -> bool {
    let marker = stash_marker(transaction_id);

    let output = match Command::new("git")
        .args(["stash", "create", &marker])
        .current_dir(workdir)
        .output()
    {
        Ok(o) => o,
        Err(e) => {
            tracing::warn!(error = %e, "git unavailable, skipping auxiliary stash");
            return false;
        }
    };

    if !output.status.success() {
        tracing::warn!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git stash create failed, skipping auxiliary stash"
        );
        return false;
    }

    let oid = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if oid.is_empty() {
        tracing::debug!("working tree clean, nothing to stash");
        return false;
    }

    let stored = Command::new("git")
        .args(["stash", "store", "-m", &marker, &oid])
        .current_dir(workdir)
        .output();

    match stored {
        Ok(o) if o.status.success() => {
            tracing::info!(transaction_id, oid = %oid, "created auxiliary stash");
            true
        }
        Ok(o) => {
            tracing::warn!(
                stderr = %String::from_utf8_lossy(&o.stderr).trim(),
                "git stash store failed"
            );
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "git stash store failed");
            false
        }
    }
}

/// Re-apply the stash entry created for this transaction. Returns `false`
/// if no matching entry exists or git fails; the entry is kept on success
/// so a second restore remains possible.
pub fn restore_stash(workdir: &Path, transaction_id: &str) -> bool {
    let marker = stash_marker(transaction_id);
    let Some(index) = find_stash_index(workdir, &marker) else {
        tracing::warn!(transaction_id, "no auxiliary stash entry found");
        return false;
    };

    let spec = format!("stash@{{{index}}}");
    match Command::new("git")
        .args(["stash", "apply", &spec])
        .current_dir(workdir)
        .output()
    {
        Ok(o) if o.status.success() => {
            tracing::info!(transaction_id, %spec, "restored auxiliary stash");
            true
        }
        Ok(o) => {
            tracing::warn!(
                stderr = %String::from_utf8_lossy(&o.stderr).trim(),
                "git stash apply failed"
            );
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "git stash apply failed");
            false
        }
    }
}

/// Best-effort staging of modified paths on commit. Failures are logged
/// and swallowed — staging is a convenience, not part of the transaction
/// contract.
pub fn stage_paths(workdir: &Path, paths: &[String]) -> bool {
    if paths.is_empty() {
        return true;
    }

    let mut cmd = Command::new("git");
    cmd.args(["add", "--"]).current_dir(workdir);
    for path in paths {
        cmd.arg(path);
    }

    match cmd.output() {
        Ok(o) if o.status.success() => true,
        Ok(o) => {
            tracing::warn!(
                stderr = %String::from_utf8_lossy(&o.stderr).trim(),
                "git add failed, commit proceeds unstaged"
            );
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "git add failed, commit proceeds unstaged");
            false
        }
    }
}

/// Locate the stash entry whose message carries our marker.
///
/// Native enumeration via libgit2 when available, falling back to parsing
/// `git stash list` output.
fn find_stash_index(workdir: &Path, marker: &str) -> Option<usize> {
    #[cfg(feature = "libgit2")]
    {
        if let Some(index) = find_stash_index_git2(workdir, marker) {
            return Some(index);
        }
        // Fall through to shell-out as fallback
    }

    find_stash_index_shell(workdir, marker)
}

#[cfg(feature = "libgit2")]
fn find_stash_index_git2(workdir: &Path, marker: &str) -> Option<usize> {
    let mut repo = git2::Repository::discover(workdir).ok()?;
    let mut found = None;
    repo.stash_foreach(|index, message, _oid| {
        if message.contains(marker) {
            found = Some(index);
            false // stop iteration
        } else {
            true
        }
    })
    .ok()?;
    found
}

fn find_stash_index_shell(workdir: &Path, marker: &str) -> Option<usize> {
    let output = Command::new("git")
        .args(["stash", "list", "--format=%gs"])
        .current_dir(workdir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .position(|line| line.contains(marker))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stash_marker_embeds_transaction_id() {
        assert_eq!(stash_marker("tx_1_ab"), "etx:tx_1_ab");
    }

    #[test]
    fn create_stash_outside_a_repo_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!create_stash(dir.path(), "tx_none"));
    }

    #[test]
    fn restore_stash_outside_a_repo_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!restore_stash(dir.path(), "tx_none"));
    }

    #[test]
    fn stage_paths_with_nothing_to_stage_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(stage_paths(dir.path(), &[]));
    }

    #[test]
    fn stage_paths_outside_a_repo_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!stage_paths(dir.path(), &["a.txt".into()]));
    }
}
