// pull.rs — Check out (and optionally merge) a pull request around a run
//
// The pull request head is fetched into `<id>_head`, verified, and the
// temporary branch is removed again whatever the verification outcome was.

use anyhow::{Context, Result};

use crate::git::SourceControlClient;

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub id: String,
    pub remote: String,
    pub target_branch: String,
    /// Merge the head into the target branch before verifying.
    pub merge: bool,
}

impl PullRequest {
    pub fn head_branch(&self) -> String {
        format!("{}_head", self.id)
    }

    fn remote_target(&self) -> String {
        format!("{}/{}", self.remote, self.target_branch)
    }
}

/// Creates `<id>_head`. Nothing needs cleaning up if this fails.
fn fetch_head(scm: &dyn SourceControlClient, pr: &PullRequest) -> Result<()> {
    scm.fetch(&pr.remote)
        .with_context(|| format!("fetching {}", pr.remote))?;
    scm.checkout(&pr.remote_target(), false)?;
    scm.fetch_ref(&pr.remote, &format!("pull/{}/head:{}", pr.id, pr.head_branch()))
        .with_context(|| format!("fetching pull request #{}", pr.id))
}

/// Check out the fetched head, merging it into the target branch if asked.
fn prepare(scm: &dyn SourceControlClient, pr: &PullRequest) -> Result<()> {
    let head = pr.head_branch();
    scm.checkout(&head, true)?;

    if pr.merge {
        scm.checkout(&pr.target_branch, false)?;
        scm.reset_hard(&pr.remote_target())?;
        eprintln!(
            "[sigs] Merging and signing pull request #{}; if you are using a smartcard, confirm the signature now.",
            pr.id
        );
        scm.merge(
            &head,
            &format!("Merge pull request #{} into {}", pr.id, pr.target_branch),
        )
        .with_context(|| format!("merging pull request #{}", pr.id))?;
    }
    Ok(())
}

fn cleanup(scm: &dyn SourceControlClient, pr: &PullRequest) -> Result<()> {
    scm.checkout("master", false)?;
    scm.delete_branch(&pr.head_branch())
}

/// Run `verify` with the pull request checked out. `verify` is skipped when
/// `None`. Once the head branch exists, cleanup happens whatever fails after.
pub fn with_pull_request<T>(
    scm: &dyn SourceControlClient,
    pr: &PullRequest,
    verify: Option<impl FnOnce() -> T>,
) -> Result<Option<T>> {
    tracing::info!(pull_id = %pr.id, remote = %pr.remote, merge = pr.merge, "checking out pull request");
    fetch_head(scm, pr)?;

    let outcome = prepare(scm, pr).map(|()| verify.map(|f| f()));
    let cleaned = cleanup(scm, pr).context("cleaning up pull request branch");
    let outcome = outcome?;
    cleaned?;
    Ok(outcome)
}
