// session.rs — One verification run
//
// check tools → locate → validate naming → import keys → verify signatures → reconcile.
// A failing stage returns its error and nothing after it runs; deciding the
// exit code is left to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sigs::error::VerifyError;
use crate::sigs::identity::IdentityRegistry;
use crate::sigs::keyring::KeyringClient;
use crate::sigs::locate::locate;
use crate::sigs::model::{RunConfig, VersionSelector};
use crate::sigs::naming;
use crate::sigs::reconcile::{reconcile, GroupSummary};
use crate::sigs::signatures;

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub checked_at: DateTime<Utc>,
    pub version: VersionSelector,
    pub signers: Vec<String>,
    pub attestations: usize,
    pub signatures_verified: usize,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Verified(SessionReport),
    /// `*` matched no assert files at all.
    NothingToVerify,
}

pub fn run(config: &RunConfig, keyring: &dyn KeyringClient) -> Result<Outcome, VerifyError> {
    if !config.sigs_dir.is_dir() {
        return Err(VerifyError::MissingSigsDir(config.sigs_dir.clone()));
    }
    let registry = IdentityRegistry::load(&config.key_dir)?;
    keyring.check_available()?;
    if registry.is_empty() {
        tracing::warn!(key_dir = %config.key_dir.display(), "no .asc keys found; every signer will be unknown");
    }

    tracing::info!(
        sigs_dir = %config.sigs_dir.display(),
        version = %config.version,
        signers = registry.len(),
        "starting verification"
    );

    let discovery = locate(&config.sigs_dir, &config.key_dir, &config.version)?;
    if discovery.is_empty() {
        tracing::info!("no assert files found");
        return Ok(Outcome::NothingToVerify);
    }

    naming::validate(&discovery, &registry, &config.artifact)?;

    if config.import_keys {
        for key in registry.key_files() {
            tracing::debug!(key = %key.display(), "importing key");
            keyring.import_key(key)?;
        }
        if config.refresh_keyring {
            tracing::info!("refreshing keyring");
            keyring.refresh_keyring()?;
        }
    }

    let signatures_verified =
        signatures::verify_all(&config.sigs_dir, &discovery.signatures, keyring)?;

    let groups = reconcile(&config.sigs_dir, &discovery.attestations)?;

    Ok(Outcome::Verified(SessionReport {
        checked_at: Utc::now(),
        version: config.version.clone(),
        signers: registry.signers().map(str::to_string).collect(),
        attestations: discovery.attestations.len(),
        signatures_verified,
        groups,
    }))
}
