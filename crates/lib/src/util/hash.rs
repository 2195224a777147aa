//! Hashing utilities for artifact verification.
//!
//! This module provides:
//! - `Checksum`: a full 64-character lowercase SHA-256 hex digest
//! - `hash_file()`: streamed single file hashing
//! - `hash_bytes()`: arbitrary byte hashing

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 of zero bytes. Stands in for the content of artifacts that a dry
/// run never produced.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// A full 64-character SHA256 hash used to identify artifact content.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
  /// The checksum of empty content.
  pub fn empty() -> Self {
    Self(EMPTY_SHA256.to_string())
  }

  /// Parse a hex digest, accepting upper or lower case input.
  ///
  /// Returns `None` unless the input is exactly 64 hex characters.
  pub fn parse(digest: &str) -> Option<Self> {
    if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
      Some(Self(digest.to_ascii_lowercase()))
    } else {
      None
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty_content(&self) -> bool {
    self.0 == EMPTY_SHA256
  }
}

#[derive(Debug, thiserror::Error)]
#[error("not a sha256 hex digest: {0:?}")]
pub struct InvalidChecksum(String);

impl TryFrom<String> for Checksum {
  type Error = InvalidChecksum;

  fn try_from(digest: String) -> Result<Self, Self::Error> {
    Self::parse(&digest).ok_or(InvalidChecksum(digest))
  }
}

impl From<Checksum> for String {
  fn from(checksum: Checksum) -> Self {
    checksum.0
  }
}

impl fmt::Display for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing a file.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to read file {path}")]
  ReadFile {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> Result<Checksum, HashError> {
  let read_error = |source| HashError::ReadFile {
    path: path.display().to_string(),
    source,
  };

  let mut file = fs::File::open(path).map_err(read_error)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_error)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Checksum(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> Checksum {
  let mut hasher = Sha256::new();
  hasher.update(data);
  Checksum(hex::encode(hasher.finalize()))
}
