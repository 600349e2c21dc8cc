// sigs/ — assert-file verification engine
//
// model.rs      — AttestationRecord, VersionSelector, RunConfig, naming constants
// locate.rs     — discover *.assert / *.assert.sig files under the sigs root
// identity.rs   — signer names derived from the public-key directory
// naming.rs     — structural checks: pairing, known signers, canonical paths
// keyring.rs    — KeyringClient seam for detached-signature verification
// signatures.rs — verify every signature, collect all failures
// reconcile.rs  — line-by-line comparison of attestations per release
// session.rs    — runs the stages in order and builds the report
// error.rs      — VerifyError and its exit-code classification

pub mod error;
pub mod identity;
pub mod keyring;
pub mod locate;
pub mod model;
pub mod naming;
pub mod reconcile;
pub mod session;
pub mod signatures;

#[cfg(test)]
pub(crate) mod testutil;
