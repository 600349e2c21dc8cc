use std::fmt;
use std::path::{Path, PathBuf};

use crate::sigs::signatures::SignatureFailure;

/// Failure class of a verification run. Each class has its own exit code so a
/// calling workflow can tell a forged signer from a diverging build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The set of files on disk is not well-formed.
    Structural,
    /// At least one detached signature did not verify.
    Trust,
    /// Two signers recorded different build manifests.
    Content,
    /// A required directory or external program is missing.
    Environment,
    /// Anything else (I/O while reading, a collaborator tool erroring).
    Other,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Other => 1,
            ErrorKind::Structural => 2,
            ErrorKind::Trust => 3,
            ErrorKind::Content => 4,
            ErrorKind::Environment => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Trust => "signature",
            ErrorKind::Content => "content",
            ErrorKind::Environment => "environment",
            ErrorKind::Other => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(
        "attestation directory {} does not exist; run from a checkout of the signatures repository or pass --sigs-dir",
        .0.display()
    )]
    MissingSigsDir(PathBuf),

    #[error(
        "key directory {} does not exist; it must hold one <signer>.asc public key per builder (see --key-dir)",
        .0.display()
    )]
    MissingKeyDir(PathBuf),

    #[error("cannot run `{program}`: {source}; install it or set the {env} environment variable")]
    ToolUnavailable {
        program: String,
        env: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` failed: {stderr}")]
    ToolFailed {
        program: String,
        args: String,
        stderr: String,
    },

    #[error("no assert files found for release {0}")]
    NoAttestations(String),

    #[error("malformed attestation path {}: {reason}", .path.display())]
    MalformedPath { path: PathBuf, reason: &'static str },

    #[error("signature without assert file: {}", display_paths(.0))]
    OrphanSignatures(Vec<PathBuf>),

    #[error("missing signature {}", .0.display())]
    MissingSignature(PathBuf),

    #[error("unknown signer `{signer}` in {}", .path.display())]
    UnknownSigner { signer: String, path: PathBuf },

    #[error("cannot derive major version from release `{release}` ({})", .path.display())]
    UnderivableRelease { release: String, path: PathBuf },

    #[error("path does not follow the naming rule: found {}, expected {}", .actual.display(), .expected.display())]
    PathMismatch { actual: PathBuf, expected: PathBuf },

    #[error("{} signature(s) failed verification", .0.len())]
    BadSignatures(Vec<SignatureFailure>),

    #[error(
        "{release}: {} differs from {} at line {index}\n  expected: {}\n  found:    {}",
        .path.display(),
        .reference.display(),
        display_line(.expected.as_deref()),
        display_line(.actual.as_deref())
    )]
    ContentMismatch {
        release: String,
        path: PathBuf,
        reference: PathBuf,
        index: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walking attestation directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("building file pattern: {0}")]
    Pattern(#[from] globset::Error),
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::MissingSigsDir(_)
            | VerifyError::MissingKeyDir(_)
            | VerifyError::ToolUnavailable { .. } => ErrorKind::Environment,
            VerifyError::NoAttestations(_)
            | VerifyError::MalformedPath { .. }
            | VerifyError::OrphanSignatures(_)
            | VerifyError::MissingSignature(_)
            | VerifyError::UnknownSigner { .. }
            | VerifyError::UnderivableRelease { .. }
            | VerifyError::PathMismatch { .. } => ErrorKind::Structural,
            VerifyError::BadSignatures(_) => ErrorKind::Trust,
            VerifyError::ContentMismatch { .. } => ErrorKind::Content,
            VerifyError::ToolFailed { .. }
            | VerifyError::Io { .. }
            | VerifyError::Walk(_)
            | VerifyError::Pattern(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        VerifyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_line(line: Option<&str>) -> String {
    match line {
        Some(l) => format!("{:?}", l),
        None => "<end of file>".to_string(),
    }
}
