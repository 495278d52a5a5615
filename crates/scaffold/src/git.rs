use std::path::Path;
use std::process::Command;

use scaffold_codemod::Checkpoint;

fn git(repo_root: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_root);
    cmd
}

fn run_silent(mut cmd: Command) -> anyhow::Result<()> {
    let out = cmd.output()?;
    if out.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("git command failed: {}", stderr.trim())
    }
}

fn run_stdout(mut cmd: Command) -> anyhow::Result<String> {
    let out = cmd.output()?;
    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("git command failed: {}", stderr.trim())
    }
}

/// Whether `dir` is inside a git work tree.
pub fn is_git_directory(dir: &Path) -> bool {
    let mut cmd = git(dir);
    cmd.args(["rev-parse", "--is-inside-work-tree"]);
    run_stdout(cmd).is_ok_and(|out| out == "true")
}

/// Whether the work tree has no staged, unstaged or untracked changes.
pub fn is_clean(dir: &Path) -> anyhow::Result<bool> {
    let mut cmd = git(dir);
    cmd.args(["status", "--porcelain"]);
    Ok(run_stdout(cmd)?.is_empty())
}

/// Stage everything and commit, skipping hooks.
pub fn commit_all_no_verify(dir: &Path, message: &str) -> anyhow::Result<()> {
    let mut add = git(dir);
    add.args(["add", "-A"]);
    run_silent(add)?;

    let mut commit = git(dir);
    commit.args(["commit", "--no-verify", "-m", message]);
    run_silent(commit)
}

/// Commits a checkpoint after each codemod.
pub struct GitCheckpoint;

impl Checkpoint for GitCheckpoint {
    fn checkpoint(&self, project_root: &Path, message: &str) -> anyhow::Result<()> {
        log::debug!("git commit: {}", message.lines().next().unwrap_or_default());
        commit_all_no_verify(project_root, message)
    }
}
