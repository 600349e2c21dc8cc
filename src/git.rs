use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

/// The handful of git operations the pull-request workflow needs.
pub trait SourceControlClient {
    fn fetch(&self, remote: &str) -> Result<()>;
    /// Fetch a single refspec quietly, e.g. `pull/42/head:42_head`.
    fn fetch_ref(&self, remote: &str, refspec: &str) -> Result<()>;
    fn checkout(&self, rev: &str, force: bool) -> Result<()>;
    fn reset_hard(&self, rev: &str) -> Result<()>;
    /// Signed, no-fast-forward merge of `branch` into the current branch.
    fn merge(&self, branch: &str, message: &str) -> Result<()>;
    fn delete_branch(&self, name: &str) -> Result<()>;
}

/// Shells out to git, always with `-C <workdir>`.
pub struct Git {
    program: String,
    workdir: PathBuf,
}

impl Git {
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Git {
            program: program.into(),
            workdir: workdir.into(),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(args = %args.join(" "), "running git");
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .output()
            .with_context(|| format!("spawning {} (set GIT to override)", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {}", args.join(" "), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SourceControlClient for Git {
    fn fetch(&self, remote: &str) -> Result<()> {
        self.run_git(&["fetch", remote]).map(drop)
    }

    fn fetch_ref(&self, remote: &str, refspec: &str) -> Result<()> {
        self.run_git(&["fetch", "-q", remote, refspec]).map(drop)
    }

    fn checkout(&self, rev: &str, force: bool) -> Result<()> {
        if force {
            self.run_git(&["checkout", "-f", rev]).map(drop)
        } else {
            self.run_git(&["checkout", rev]).map(drop)
        }
    }

    fn reset_hard(&self, rev: &str) -> Result<()> {
        self.run_git(&["reset", "--hard", rev]).map(drop)
    }

    fn merge(&self, branch: &str, message: &str) -> Result<()> {
        self.run_git(&[
            "merge",
            "-q",
            "--commit",
            "--no-edit",
            "-m",
            message,
            "--no-ff",
            "--gpg-sign",
            branch,
        ])
        .map(drop)
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.run_git(&["branch", "-D", name]).map(drop)
    }
}
