//! Optional git backup of the generated digest and database.
//!
//! After a run, stage everything, commit, push. This is a convenience side
//! channel, not part of the pipeline contract, so every failure here is
//! logged and swallowed: a broken remote must never turn a successful
//! collection run into a non-zero exit.

use chrono::Utc;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Stage, commit, and push the repository at `repo_dir`.
///
/// Returns whether a push happened; `false` covers both "nothing to commit"
/// and any git failure.
#[instrument(level = "info", skip_all, fields(repo = %repo_dir.as_ref().display()))]
pub async fn git_backup(repo_dir: impl AsRef<Path>) -> bool {
    let repo_dir = repo_dir.as_ref();
    let message = format!(
        "newsflow: atualização automática {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );

    if !run_git(repo_dir, &["add", "-A"]).await {
        return false;
    }
    // `git commit` exits non-zero when the tree is clean; treat that as a
    // quiet no-op rather than a failure worth pushing.
    if !run_git(repo_dir, &["commit", "-m", &message]).await {
        info!("Nothing to commit; skipping push");
        return false;
    }
    if !run_git(repo_dir, &["push"]).await {
        return false;
    }
    info!("Backup pushed");
    true
}

async fn run_git(repo_dir: &Path, args: &[&str]) -> bool {
    match Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .await
    {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            warn!(
                args = ?args,
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git command failed"
            );
            false
        }
        Err(e) => {
            warn!(args = ?args, error = %e, "could not spawn git");
            false
        }
    }
}
