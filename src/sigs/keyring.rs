use std::path::Path;

use crate::sigs::error::VerifyError;

/// Outcome of checking one detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub success: bool,
    /// Whatever the verifier printed; kept for the failure report.
    pub diagnostic: String,
}

/// The only component that touches key material. Verification is delegated
/// to an external tool (see `crate::gpg::Gpg`) so the engine can be tested
/// against a fake.
pub trait KeyringClient {
    /// Fails with [`VerifyError::ToolUnavailable`] when the tool cannot be run.
    fn check_available(&self) -> Result<(), VerifyError>;

    fn import_key(&self, key: &Path) -> Result<(), VerifyError>;

    fn refresh_keyring(&self) -> Result<(), VerifyError>;

    /// Check `signature` against `data`. `Err` means the tool itself could not
    /// run; a bad signature is `Ok` with `success == false`.
    fn verify_detached(&self, signature: &Path, data: &Path)
        -> Result<SignatureStatus, VerifyError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;

    /// Accepts every signature except those whose path ends with one of
    /// `reject`. Records every call. With `unavailable` set it behaves like a
    /// missing gpg binary.
    #[derive(Default)]
    pub struct FakeKeyring {
        pub reject: Vec<PathBuf>,
        pub unavailable: bool,
        pub imported: RefCell<Vec<PathBuf>>,
        pub refreshed: RefCell<usize>,
        pub verified: RefCell<Vec<PathBuf>>,
    }

    impl FakeKeyring {
        pub fn rejecting(paths: &[PathBuf]) -> Self {
            FakeKeyring {
                reject: paths.to_vec(),
                ..Default::default()
            }
        }

        pub fn unavailable() -> Self {
            FakeKeyring {
                unavailable: true,
                ..Default::default()
            }
        }
    }

    impl KeyringClient for FakeKeyring {
        fn check_available(&self) -> Result<(), VerifyError> {
            if self.unavailable {
                return Err(VerifyError::ToolUnavailable {
                    program: "gpg".to_string(),
                    env: "GPG",
                    source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                });
            }
            Ok(())
        }

        fn import_key(&self, key: &Path) -> Result<(), VerifyError> {
            self.imported.borrow_mut().push(key.to_path_buf());
            Ok(())
        }

        fn refresh_keyring(&self) -> Result<(), VerifyError> {
            *self.refreshed.borrow_mut() += 1;
            Ok(())
        }

        fn verify_detached(
            &self,
            signature: &Path,
            _data: &Path,
        ) -> Result<SignatureStatus, VerifyError> {
            self.verified.borrow_mut().push(signature.to_path_buf());
            if self.reject.iter().any(|r| signature.ends_with(r)) {
                Ok(SignatureStatus {
                    success: false,
                    diagnostic: format!("gpg: BAD signature from {}", signature.display()),
                })
            } else {
                Ok(SignatureStatus {
                    success: true,
                    diagnostic: "gpg: Good signature".to_string(),
                })
            }
        }
    }
}
