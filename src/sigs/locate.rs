use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::sigs::error::VerifyError;
use crate::sigs::model::{signed_file_path, AttestationRecord, VersionSelector};

/// Everything found under the sigs root for the requested release(s).
#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted by path.
    pub attestations: Vec<AttestationRecord>,
    /// Relative paths of every `*.assert.sig` found.
    pub signatures: BTreeSet<PathBuf>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty() && self.signatures.is_empty()
    }
}

fn matcher(pattern: &str) -> Result<GlobMatcher, VerifyError> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Scan `root` for `*.assert` files and their `.sig` siblings at any depth.
///
/// Hidden directories and `key_dir` are not entered. Every file named like an
/// assert file or its signature must sit at `<release>-<platform>/<signer>/`;
/// anything else is [`VerifyError::MalformedPath`], whatever the selector. An
/// empty result is fine for `*`, but an exact release with no assert files is
/// reported as [`VerifyError::NoAttestations`].
pub fn locate(
    root: &Path,
    key_dir: &Path,
    selector: &VersionSelector,
) -> Result<Discovery, VerifyError> {
    let assert_glob = matcher("*.assert")?;
    let sig_glob = matcher("*.assert.sig")?;

    let mut discovery = Discovery::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_name().to_string_lossy().starts_with('.') || e.path() == key_dir)
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = Path::new(entry.file_name());
        let is_assert = assert_glob.is_match(name);
        if !is_assert && !sig_glob.is_match(name) {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if is_assert {
            let record = AttestationRecord::from_relative_path(&rel)?;
            if selector.matches(&record.release_num) {
                discovery.attestations.push(record);
            }
        } else {
            let signed = signed_file_path(&rel).ok_or_else(|| VerifyError::MalformedPath {
                path: rel.clone(),
                reason: "signature path is not valid UTF-8",
            })?;
            let record = AttestationRecord::from_relative_path(&signed)?;
            if selector.matches(&record.release_num) {
                discovery.signatures.insert(rel);
            }
        }
    }

    discovery.attestations.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        root = %root.display(),
        version = %selector,
        attestations = discovery.attestations.len(),
        signatures = discovery.signatures.len(),
        "scanned sigs directory"
    );

    if let VersionSelector::Exact(version) = selector {
        if discovery.attestations.is_empty() {
            return Err(VerifyError::NoAttestations(version.clone()));
        }
    }

    Ok(discovery)
}
