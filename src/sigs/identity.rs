use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sigs::error::VerifyError;
use crate::sigs::model::KEY_EXTENSION;

/// Signers known to this checkout: one per `<name>.asc` in the key directory.
///
/// Membership only means a key file exists locally. Whether the key is
/// actually trusted is up to the keyring doing the verification.
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    signers: BTreeSet<String>,
    key_files: Vec<PathBuf>,
}

impl IdentityRegistry {
    pub fn load(key_dir: &Path) -> Result<Self, VerifyError> {
        if !key_dir.is_dir() {
            return Err(VerifyError::MissingKeyDir(key_dir.to_path_buf()));
        }

        let mut entries = fs::read_dir(key_dir)
            .and_then(|dir| dir.collect::<Result<Vec<_>, _>>())
            .map_err(|e| VerifyError::io(key_dir, e))?;
        entries.sort_by_key(|e| e.file_name());

        let mut signers = BTreeSet::new();
        let mut key_files = Vec::new();
        for entry in entries {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(KEY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                signers.insert(stem.to_string());
                key_files.push(path);
            }
        }

        tracing::debug!(key_dir = %key_dir.display(), signers = signers.len(), "loaded signer identities");

        Ok(IdentityRegistry { signers, key_files })
    }

    pub fn contains(&self, signer: &str) -> bool {
        self.signers.contains(signer)
    }

    /// Signer names in sorted order.
    pub fn signers(&self) -> impl Iterator<Item = &str> {
        self.signers.iter().map(String::as_str)
    }

    /// Key files in sorted order, for importing into the keyring.
    pub fn key_files(&self) -> &[PathBuf] {
        &self.key_files
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}
