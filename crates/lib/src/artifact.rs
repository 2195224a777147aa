//! Produced files, identified by path and content checksum.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::hash::{Checksum, HashError, hash_file};

/// A built or installed extension.
///
/// Real artifacts are only constructed from files that exist, and their
/// checksum is always computed from the bytes on disk. Simulated artifacts
/// (dry-run) carry a sentinel checksum and make no claim about the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryArtifact {
  pub path: PathBuf,
  pub checksum: Checksum,
}

impl BinaryArtifact {
  /// Hash the file at `path`. Fails if it cannot be read.
  pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, HashError> {
    let path = path.into();
    let checksum = hash_file(&path)?;
    Ok(Self { path, checksum })
  }

  /// An artifact for a run that never touched the filesystem.
  pub fn simulated(path: impl Into<PathBuf>, checksum: Checksum) -> Self {
    Self {
      path: path.into(),
      checksum,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::hash::EMPTY_SHA256;
  use tempfile::tempdir;

  #[test]
  fn from_file_hashes_contents() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("foo.so");
    std::fs::write(&path, b"hello").unwrap();

    let artifact = BinaryArtifact::from_file(&path).unwrap();

    assert_eq!(artifact.path, path);
    assert_eq!(
      artifact.checksum.as_str(),
      "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
  }

  #[test]
  fn from_file_fails_for_missing_file() {
    let temp = tempdir().unwrap();
    assert!(BinaryArtifact::from_file(temp.path().join("missing.so")).is_err());
  }

  #[test]
  fn simulated_does_not_touch_disk() {
    let artifact = BinaryArtifact::simulated("/does/not/exist/foo.so", Checksum::empty());
    assert_eq!(artifact.checksum.as_str(), EMPTY_SHA256);
    assert!(!artifact.path().exists());
  }

  #[test]
  fn serializes_as_path_and_checksum() {
    let artifact = BinaryArtifact::simulated("/ext/foo.so", Checksum::empty());
    let json = serde_json::to_value(&artifact).unwrap();
    assert_eq!(json["path"], "/ext/foo.so");
    assert_eq!(json["checksum"], EMPTY_SHA256);
  }

  #[test]
  fn deserializing_rejects_malformed_checksum() {
    let bad = serde_json::json!({ "path": "/ext/foo.so", "checksum": "not-a-digest" });
    assert!(serde_json::from_value::<BinaryArtifact>(bad).is_err());

    let upper = serde_json::json!({ "path": "/ext/foo.so", "checksum": EMPTY_SHA256.to_uppercase() });
    let artifact: BinaryArtifact = serde_json::from_value(upper).unwrap();
    assert!(artifact.checksum.is_empty_content());
  }
}
