// naming.rs — Structural checks over the discovered file set
//
// Runs four passes in a fixed order and stops at the first one that fails:
//   1. every .sig has its assert file
//   2. every assert file has its .sig
//   3. every signer directory names a known key
//   4. every assert path equals the one rebuilt from its own fields

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::sigs::error::VerifyError;
use crate::sigs::identity::IdentityRegistry;
use crate::sigs::locate::Discovery;
use crate::sigs::model::signed_file_path;

pub fn validate(
    discovery: &Discovery,
    registry: &IdentityRegistry,
    artifact: &str,
) -> Result<(), VerifyError> {
    let asserts: BTreeSet<&PathBuf> = discovery.attestations.iter().map(|r| &r.path).collect();

    let orphans: Vec<PathBuf> = discovery
        .signatures
        .iter()
        .filter(|sig| match signed_file_path(sig) {
            Some(signed) => !asserts.contains(&signed),
            None => true,
        })
        .cloned()
        .collect();
    if !orphans.is_empty() {
        return Err(VerifyError::OrphanSignatures(orphans));
    }

    for record in &discovery.attestations {
        let sig = record.signature_path();
        if !discovery.signatures.contains(&sig) {
            return Err(VerifyError::MissingSignature(sig));
        }
    }

    for record in &discovery.attestations {
        if !registry.contains(&record.signer_name) {
            return Err(VerifyError::UnknownSigner {
                signer: record.signer_name.clone(),
                path: record.path.clone(),
            });
        }
    }

    for record in &discovery.attestations {
        let expected =
            record
                .expected_path(artifact)
                .ok_or_else(|| VerifyError::UnderivableRelease {
                    release: record.release_num.clone(),
                    path: record.path.clone(),
                })?;
        if expected != record.path {
            return Err(VerifyError::PathMismatch {
                actual: record.path.clone(),
                expected,
            });
        }
    }

    tracing::info!(
        attestations = discovery.attestations.len(),
        "file names and signer directories are well-formed"
    );
    Ok(())
}
