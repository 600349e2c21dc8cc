// Fixture builders shared by the engine tests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::sigs::model::{version_major, DEFAULT_KEY_DIR};

pub const MANIFEST_HEAD: &str = concat!(
    "---\n",
    "name: monero-linux-0.18\n",
    "enable_cache: true\n",
    "distro: ubuntu\n",
    "suite: bionic\n",
    "architectures:\n",
    "- amd64\n",
    "packages:\n",
    "- \"MacOSX10.11.sdk.tar.gz\"\n",
    "out_manifest: |\n",
    "  abc123  monero-x86_64-linux-gnu-v0.18.0.0.tar.bz2\n",
    "in_manifest: |\n",
    "  def456  monero-v0.18.0.0.tar.gz\n",
);

pub const MANIFEST_TAIL: &str = concat!("base_manifests: !!omap\n", "- ubuntu-base: 1111\n");

pub fn manifest() -> String {
    format!("{}{}", MANIFEST_HEAD, MANIFEST_TAIL)
}

/// Relative canonical path for an assert file.
pub fn assert_rel(release_full: &str, signer: &str) -> PathBuf {
    let (num, platform) = release_full.rsplit_once('-').expect("release has platform");
    let major = version_major(num).expect("release has major");
    PathBuf::from(release_full)
        .join(signer)
        .join(format!("monero-{}-0.{}-build.assert", platform, major))
}

/// Write an assert file and its signature; returns the relative assert path.
pub fn write_signed(root: &Path, release_full: &str, signer: &str, content: &str) -> PathBuf {
    let rel = write_unsigned(root, release_full, signer, content);
    fs::write(root.join(format!("{}.sig", rel.display())), "sig").unwrap();
    rel
}

pub fn write_unsigned(root: &Path, release_full: &str, signer: &str, content: &str) -> PathBuf {
    let rel = assert_rel(release_full, signer);
    let abs = root.join(&rel);
    fs::create_dir_all(abs.parent().unwrap()).unwrap();
    fs::write(&abs, content).unwrap();
    rel
}

pub fn write_key(root: &Path, signer: &str) {
    let dir = root.join(DEFAULT_KEY_DIR);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}.asc", signer)), "-----BEGIN PGP PUBLIC KEY BLOCK-----\n").unwrap();
}
