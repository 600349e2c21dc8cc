use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::sigs::error::VerifyError;
use crate::sigs::keyring::KeyringClient;
use crate::sigs::model::signed_file_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureFailure {
    /// Relative to the sigs root.
    pub signature: PathBuf,
    pub diagnostic: String,
}

/// Verify every signature in path order and only then report.
///
/// Unlike the structural checks this never stops early: one run shows every
/// bad signature. Returns the number verified.
pub fn verify_all(
    root: &Path,
    signatures: &BTreeSet<PathBuf>,
    keyring: &dyn KeyringClient,
) -> Result<usize, VerifyError> {
    let mut failures = Vec::new();

    for sig in signatures {
        let data = signed_file_path(sig).ok_or_else(|| VerifyError::MalformedPath {
            path: sig.clone(),
            reason: "signature path does not end in .sig",
        })?;
        let status = keyring.verify_detached(&root.join(sig), &root.join(&data))?;
        if status.success {
            tracing::info!(signature = %sig.display(), "signature OK");
        } else {
            tracing::warn!(signature = %sig.display(), "signature FAILED");
            failures.push(SignatureFailure {
                signature: sig.clone(),
                diagnostic: status.diagnostic.trim_end().to_string(),
            });
        }
    }

    if failures.is_empty() {
        Ok(signatures.len())
    } else {
        Err(VerifyError::BadSignatures(failures))
    }
}

/// One block per failing file: the path, then the verifier's output between
/// separator lines.
pub fn render_failures(failures: &[SignatureFailure]) -> String {
    const SEPARATOR: &str = "--------------------------------------------------";
    let mut out = String::new();
    for failure in failures {
        let _ = writeln!(out, "{}", SEPARATOR);
        let _ = writeln!(out, "Verification failed: {}", failure.signature.display());
        let _ = writeln!(out, "{}", SEPARATOR);
        if !failure.diagnostic.is_empty() {
            let _ = writeln!(out, "{}", failure.diagnostic);
        }
    }
    if !failures.is_empty() {
        let _ = writeln!(out, "{}", SEPARATOR);
    }
    out
}
