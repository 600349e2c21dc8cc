use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use crate::sigs::error::VerifyError;
use crate::sigs::keyring::{KeyringClient, SignatureStatus};

/// Keyring backed by the user's GnuPG installation.
pub struct Gpg {
    program: String,
}

impl Gpg {
    pub fn new(program: impl Into<String>) -> Self {
        Gpg {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&OsStr]) -> Result<Output, VerifyError> {
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| VerifyError::ToolUnavailable {
                program: self.program.clone(),
                env: "GPG",
                source,
            })
    }

    fn run_checked(&self, args: &[&OsStr]) -> Result<(), VerifyError> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(VerifyError::ToolFailed {
                program: self.program.clone(),
                args: args
                    .iter()
                    .map(|a| a.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl KeyringClient for Gpg {
    fn check_available(&self) -> Result<(), VerifyError> {
        self.run_checked(&[OsStr::new("--version")])
    }

    fn import_key(&self, key: &Path) -> Result<(), VerifyError> {
        self.run_checked(&[OsStr::new("--import"), key.as_os_str()])
    }

    fn refresh_keyring(&self) -> Result<(), VerifyError> {
        self.run_checked(&[OsStr::new("--refresh-keys")])
    }

    fn verify_detached(
        &self,
        signature: &Path,
        data: &Path,
    ) -> Result<SignatureStatus, VerifyError> {
        let output = self.run(&[
            OsStr::new("--verify"),
            signature.as_os_str(),
            data.as_os_str(),
        ])?;
        Ok(SignatureStatus {
            success: output.status.success(),
            diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
