// reconcile.rs — Cross-signer content comparison
//
// Assert files are grouped by release+platform in path order. The first file
// of each group is the reference; every other file must match it line for
// line until the candidate reaches the base_manifests marker. Lines naming
// the SDK are skipped. The first real difference ends the run.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sigs::error::VerifyError;
use crate::sigs::model::{AttestationRecord, BASE_MANIFESTS_MARKER, VOLATILE_SUBSTRING};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDigest {
    pub signer: String,
    pub path: PathBuf,
    pub sha256: String,
}

/// One release+platform and the signers that agreed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub release: String,
    pub reference: PathBuf,
    pub members: Vec<MemberDigest>,
}

/// First differing line between a candidate and its reference, as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMismatch {
    pub index: usize,
    pub expected: Option<Vec<u8>>,
    pub actual: Option<Vec<u8>>,
}

struct Loaded {
    lines: Vec<Vec<u8>>,
    sha256: String,
}

/// Split on `\n`, keeping the terminator on each line.
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    bytes
        .split_inclusive(|b| *b == b'\n')
        .map(<[u8]>::to_vec)
        .collect()
}

fn load(root: &Path, record: &AttestationRecord) -> Result<Loaded, VerifyError> {
    let path = root.join(&record.path);
    let bytes = fs::read(&path).map_err(|e| VerifyError::io(&path, e))?;
    Ok(Loaded {
        lines: split_lines(&bytes),
        sha256: format!("{:x}", Sha256::digest(&bytes)),
    })
}

fn is_volatile(line: &[u8]) -> bool {
    let needle = VOLATILE_SUBSTRING.as_bytes();
    line.windows(needle.len()).any(|w| w == needle)
}

/// Compare line sequences (terminators included) byte for byte in lockstep.
///
/// Stops clean once the candidate reaches [`BASE_MANIFESTS_MARKER`]. A line
/// present on one side only counts as a difference.
pub fn compare_lines(reference: &[Vec<u8>], candidate: &[Vec<u8>]) -> Option<LineMismatch> {
    let marker = BASE_MANIFESTS_MARKER.as_bytes();
    let len = reference.len().max(candidate.len());
    for index in 0..len {
        let expected = reference.get(index).map(Vec::as_slice);
        let actual = candidate.get(index).map(Vec::as_slice);

        if actual == Some(marker) {
            return None;
        }
        if expected == actual {
            continue;
        }
        if expected.is_some_and(is_volatile) || actual.is_some_and(is_volatile) {
            continue;
        }
        return Some(LineMismatch {
            index,
            expected: expected.map(<[u8]>::to_vec),
            actual: actual.map(<[u8]>::to_vec),
        });
    }
    None
}

fn lossy(line: Option<Vec<u8>>) -> Option<String> {
    line.map(|l| String::from_utf8_lossy(&l).into_owned())
}

/// Check every group; `attestations` must already be sorted by path.
pub fn reconcile(
    root: &Path,
    attestations: &[AttestationRecord],
) -> Result<Vec<GroupSummary>, VerifyError> {
    let mut groups: Vec<GroupSummary> = Vec::new();
    let mut reference: Option<(&AttestationRecord, Loaded)> = None;

    for record in attestations {
        let loaded = load(root, record)?;
        let member = MemberDigest {
            signer: record.signer_name.clone(),
            path: record.path.clone(),
            sha256: loaded.sha256.clone(),
        };

        match &reference {
            Some((current, ref_loaded)) if current.release_full == record.release_full => {
                if let Some(m) = compare_lines(&ref_loaded.lines, &loaded.lines) {
                    return Err(VerifyError::ContentMismatch {
                        release: record.release_full.clone(),
                        path: record.path.clone(),
                        reference: current.path.clone(),
                        index: m.index,
                        expected: lossy(m.expected),
                        actual: lossy(m.actual),
                    });
                }
                tracing::debug!(
                    release = %record.release_full,
                    signer = %record.signer_name,
                    "matches reference"
                );
                if let Some(group) = groups.last_mut() {
                    group.members.push(member);
                }
            }
            _ => {
                tracing::debug!(
                    release = %record.release_full,
                    reference = %record.path.display(),
                    "new comparison group"
                );
                groups.push(GroupSummary {
                    release: record.release_full.clone(),
                    reference: record.path.clone(),
                    members: vec![member],
                });
                reference = Some((record, loaded));
            }
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigs::testutil::*;
    use std::fs;

    fn lines(text: &str) -> Vec<Vec<u8>> {
        split_lines(text.as_bytes())
    }

    fn records(rels: &[PathBuf]) -> Vec<AttestationRecord> {
        let mut recs: Vec<_> = rels
            .iter()
            .map(|p| AttestationRecord::from_relative_path(p).unwrap())
            .collect();
        recs.sort_by(|a, b| a.path.cmp(&b.path));
        recs
    }

    #[test]
    fn identical_lines_match() {
        let m = manifest();
        assert_eq!(compare_lines(&lines(&m), &lines(&m)), None);
    }

    #[test]
    fn difference_before_marker_reports_index_and_both_lines() {
        let reference = lines("a\nb\nc\nbase_manifests: !!omap\n");
        let candidate = lines("a\nb\nX\nbase_manifests: !!omap\n");
        let m = compare_lines(&reference, &candidate).unwrap();
        assert_eq!(m.index, 2);
        assert_eq!(m.expected.as_deref(), Some(&b"c\n"[..]));
        assert_eq!(m.actual.as_deref(), Some(&b"X\n"[..]));
    }

    #[test]
    fn difference_after_marker_is_ignored() {
        let reference = lines("a\nbase_manifests: !!omap\n- ubuntu-base: 1\n");
        let candidate = lines("a\nbase_manifests: !!omap\n- ubuntu-base: 2\nextra\n");
        assert_eq!(compare_lines(&reference, &candidate), None);
    }

    #[test]
    fn sdk_lines_are_skipped_whatever_else_differs() {
        let reference = lines("a\n- \"MacOSX10.11.sdk.tar.gz\"\nb\n");
        let candidate = lines("a\ncompletely different sdk line\nb\n");
        assert_eq!(compare_lines(&reference, &candidate), None);
    }

    #[test]
    fn line_terminators_are_significant() {
        let reference = lines("a\r\nb\n");
        let candidate = lines("a\nb\n");
        assert_eq!(compare_lines(&reference, &candidate).unwrap().index, 0);
    }

    #[test]
    fn truncated_candidate_is_a_mismatch() {
        let reference = lines("a\nb\nbase_manifests: !!omap\n");
        let candidate = lines("a\n");
        let m = compare_lines(&reference, &candidate).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.expected.as_deref(), Some(&b"b\n"[..]));
        assert_eq!(m.actual, None);
    }

    #[test]
    fn marker_without_newline_is_not_the_boundary() {
        let reference = lines("a\nbase_manifests: !!omap\n- x\n");
        let candidate = lines("a\nbase_manifests: !!omap");
        assert_eq!(compare_lines(&reference, &candidate).unwrap().index, 1);
    }

    #[test]
    fn groups_follow_release_and_first_file_is_reference() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let rels = vec![
            write_signed(root, "v0.18.0.0-linux", "alice", &manifest()),
            write_signed(root, "v0.18.0.0-linux", "bob", &manifest()),
            write_signed(root, "v0.18.0.0-win", "bob", "win only\n"),
        ];
        let groups = reconcile(root, &records(&rels)).unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].release, "v0.18.0.0-linux");
        assert_eq!(groups[0].reference, rels[0]);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].members[0].sha256, groups[0].members[1].sha256);
        assert_eq!(groups[1].members.len(), 1);
        assert_eq!(groups[0].members[0].sha256.len(), 64);
    }

    #[test]
    fn mismatch_names_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let diverged = manifest().replace("abc123", "fff999");
        let rels = vec![
            write_signed(root, "v0.18.0.0-linux", "alice", &manifest()),
            write_signed(root, "v0.18.0.0-linux", "bob", &diverged),
        ];

        match reconcile(root, &records(&rels)).unwrap_err() {
            VerifyError::ContentMismatch {
                release,
                path,
                reference,
                index,
                expected,
                actual,
            } => {
                assert_eq!(release, "v0.18.0.0-linux");
                assert_eq!(path, rels[1]);
                assert_eq!(reference, rels[0]);
                assert_eq!(index, 10);
                assert!(expected.unwrap().contains("abc123"));
                assert!(actual.unwrap().contains("fff999"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn divergent_base_manifests_still_match() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let other_tail = format!("{}base_manifests: !!omap\n- ubuntu-base: 2222\n", MANIFEST_HEAD);
        let rels = vec![
            write_signed(root, "v0.18.0.0-linux", "alice", &manifest()),
            write_signed(root, "v0.18.0.0-linux", "bob", &other_tail),
        ];
        let groups = reconcile(root, &records(&rels)).unwrap();
        assert_ne!(groups[0].members[0].sha256, groups[0].members[1].sha256);
    }

    #[test]
    fn differing_invalid_utf8_bytes_are_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let rels = vec![
            write_signed(root, "v0.18.0.0-linux", "alice", ""),
            write_signed(root, "v0.18.0.0-linux", "bob", ""),
        ];
        fs::write(root.join(&rels[0]), b"hash \xff\nbase_manifests: !!omap\n").unwrap();
        fs::write(root.join(&rels[1]), b"hash \xfe\nbase_manifests: !!omap\n").unwrap();

        match reconcile(root, &records(&rels)).unwrap_err() {
            VerifyError::ContentMismatch { index, path, .. } => {
                assert_eq!(index, 0);
                assert_eq!(path, rels[1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
