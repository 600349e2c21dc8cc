// cli.rs — Command-line interface definitions (clap derive)
//
//   sigs-verify [options] <version>
//
// Verifies the assert files of <version> (or `*` for all releases) in a
// checkout of the signatures repository, optionally after fetching and
// merging a pull request into it.

use clap::Parser;
use std::path::PathBuf;

use crate::sigs::model::{RunConfig, VersionSelector, DEFAULT_ARTIFACT};

#[derive(Parser, Debug)]
#[command(name = "sigs-verify")]
#[command(
    about = "Verify signed reproducible-build assert files, e.g. before merging a pull request to the sigs repository"
)]
#[command(version)]
pub struct Cli {
    /// Release to verify (e.g. v0.18.0.0), or `*` for every release
    #[arg(value_name = "VERSION")]
    pub release: String,

    /// Root of the sigs checkout holding <release>-<platform>/<signer>/ directories
    #[arg(short = 'd', long, default_value = ".")]
    pub sigs_dir: PathBuf,

    /// Directory of <signer>.asc public keys (default: <sigs-dir>/gitian-pubkeys)
    #[arg(short = 'k', long)]
    pub key_dir: Option<PathBuf>,

    /// Artifact prefix of assert file names (<artifact>-<platform>-0.<major>-build.assert)
    #[arg(long, default_value = DEFAULT_ARTIFACT)]
    pub artifact: String,

    /// Pull request id to fetch and verify
    #[arg(short, long)]
    pub pull_id: Option<String>,

    /// Git remote the pull request lives on
    #[arg(short, long, default_value = "upstream")]
    pub remote: String,

    /// Branch the pull request merges into
    #[arg(short, long, default_value = "master")]
    pub target_branch: String,

    /// Merge the pull request (signed merge commit) before verifying
    #[arg(short, long, requires = "pull_id")]
    pub merge: bool,

    /// Skip verification entirely (only check out / merge the pull request)
    #[arg(short = 'o', long)]
    pub no_verify: bool,

    /// Do not import the key directory into the keyring
    #[arg(long)]
    pub no_import: bool,

    /// Do not refresh the keyring from keyservers after importing
    #[arg(long)]
    pub no_refresh: bool,

    /// git executable
    #[arg(long, env = "GIT", default_value = "git")]
    pub git: String,

    /// gpg executable
    #[arg(long, env = "GPG", default_value = "gpg")]
    pub gpg: String,

    /// Print a JSON report to stdout on success
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.sigs_dir, VersionSelector::parse(&self.release));
        if let Some(ref key_dir) = self.key_dir {
            config.key_dir = key_dir.clone();
        }
        config.artifact = self.artifact.clone();
        config.import_keys = !self.no_import;
        config.refresh_keyring = !self.no_refresh;
        config
    }
}
