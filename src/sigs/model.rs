use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::sigs::error::VerifyError;

// ── Naming convention ───────────────────────────────────────────────────────

/// Extension of the per-signer public key files in the key directory.
pub const KEY_EXTENSION: &str = "asc";
/// Suffix of an attestation (assert) file.
pub const ASSERT_SUFFIX: &str = ".assert";
/// Suffix appended to an assert path to name its detached signature.
pub const SIG_SUFFIX: &str = ".sig";
/// Artifact prefix of the platform filename, e.g. `monero-linux-0.18-build`.
pub const DEFAULT_ARTIFACT: &str = "monero";
/// Key directory name inside the sigs checkout.
pub const DEFAULT_KEY_DIR: &str = "gitian-pubkeys";

/// Everything from this line on is build metadata that legitimately diverges.
pub const BASE_MANIFESTS_MARKER: &str = "base_manifests: !!omap\n";
/// Lines mentioning the platform SDK vary with the builder's environment.
pub const VOLATILE_SUBSTRING: &str = "sdk";

// ── Version selector ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// Every release under the sigs root (`*`).
    All,
    /// One release number, e.g. `v0.18.0.0`.
    Exact(String),
}

impl VersionSelector {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "*" | "" => VersionSelector::All,
            exact => VersionSelector::Exact(exact.to_string()),
        }
    }

    pub fn matches(&self, release_num: &str) -> bool {
        match self {
            VersionSelector::All => true,
            VersionSelector::Exact(v) => v == release_num,
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::All => f.write_str("*"),
            VersionSelector::Exact(v) => f.write_str(v),
        }
    }
}

impl Serialize for VersionSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Attestation record ──────────────────────────────────────────────────────

/// One assert file, as placed at `<release>-<platform>/<signer>/<file>.assert`.
///
/// The signer is whoever's directory the file sits in; the signature payload
/// is not consulted for identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    pub release_full: String,
    pub release_num: String,
    pub platform: String,
    pub signer_name: String,
    /// Relative to the sigs root.
    pub path: PathBuf,
}

impl AttestationRecord {
    /// Decompose a sigs-root-relative path into its release, platform and signer.
    pub fn from_relative_path(path: &Path) -> Result<Self, VerifyError> {
        let malformed = |reason| VerifyError::MalformedPath {
            path: path.to_path_buf(),
            reason,
        };

        let mut parts = Vec::with_capacity(3);
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(
                    part.to_str()
                        .ok_or_else(|| malformed("path is not valid UTF-8"))?,
                ),
                _ => return Err(malformed("path must be relative to the sigs root")),
            }
        }

        let &[release_full, signer, filename] = parts.as_slice() else {
            return Err(malformed("expected <release>-<platform>/<signer>/<file>.assert"));
        };
        if !filename.ends_with(ASSERT_SUFFIX) {
            return Err(malformed("file name does not end in .assert"));
        }
        if signer.is_empty() {
            return Err(malformed("empty signer directory"));
        }
        let (release_num, platform) = release_full
            .rsplit_once('-')
            .filter(|(num, platform)| !num.is_empty() && !platform.is_empty())
            .ok_or_else(|| malformed("release directory is not <release>-<platform>"))?;

        Ok(AttestationRecord {
            release_full: release_full.to_string(),
            release_num: release_num.to_string(),
            platform: platform.to_string(),
            signer_name: signer.to_string(),
            path: path.to_path_buf(),
        })
    }

    /// Path of the detached signature that must accompany this file.
    pub fn signature_path(&self) -> PathBuf {
        let mut sig = self.path.clone().into_os_string();
        sig.push(SIG_SUFFIX);
        PathBuf::from(sig)
    }

    /// The path this record should have, rebuilt from its own fields:
    /// `<release>-<platform>/<signer>/<artifact>-<platform>-0.<major>-build.assert`.
    pub fn expected_path(&self, artifact: &str) -> Option<PathBuf> {
        let major = version_major(&self.release_num)?;
        let filename = format!(
            "{}-{}-0.{}-build{}",
            artifact, self.platform, major, ASSERT_SUFFIX
        );
        Some(
            PathBuf::from(format!("{}-{}", self.release_num, self.platform))
                .join(&self.signer_name)
                .join(filename),
        )
    }
}

/// `v0.18.0.0` → `18`.
pub fn version_major(release_num: &str) -> Option<&str> {
    let trimmed = release_num.strip_prefix('v').unwrap_or(release_num);
    trimmed
        .split('.')
        .nth(1)
        .filter(|major| !major.is_empty() && major.chars().all(|c| c.is_ascii_digit()))
}

/// Strip `.sig` from a signature path, giving the file it signs.
pub fn signed_file_path(signature: &Path) -> Option<PathBuf> {
    let s = signature.to_str()?;
    s.strip_suffix(SIG_SUFFIX).map(PathBuf::from)
}

// ── Run configuration ───────────────────────────────────────────────────────

/// Immutable settings for one verification run. Every path here is used as
/// given; nothing changes the process working directory.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the sigs checkout holding `<release>-<platform>/` directories.
    pub sigs_dir: PathBuf,
    /// Directory of `<signer>.asc` public keys.
    pub key_dir: PathBuf,
    pub version: VersionSelector,
    pub artifact: String,
    /// Import every key file into the keyring before verifying.
    pub import_keys: bool,
    /// Refresh the keyring from keyservers after importing.
    pub refresh_keyring: bool,
}

impl RunConfig {
    pub fn new(sigs_dir: impl Into<PathBuf>, version: VersionSelector) -> Self {
        let sigs_dir = sigs_dir.into();
        RunConfig {
            key_dir: sigs_dir.join(DEFAULT_KEY_DIR),
            sigs_dir,
            version,
            artifact: DEFAULT_ARTIFACT.to_string(),
            import_keys: true,
            refresh_keyring: true,
        }
    }
}
