use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system variants with known build conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  FreeBsd,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "freebsd" => Some(Self::FreeBsd),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::FreeBsd => "freebsd",
      Self::Windows => "windows",
    }
  }

  pub fn family(&self) -> OsFamily {
    match self {
      Self::Windows => OsFamily::Windows,
      Self::Linux | Self::MacOs | Self::FreeBsd => OsFamily::Unix,
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The split that matters for building and installing: file conventions,
/// permission model and privilege escalation all follow the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
  Unix,
  Windows,
}

impl OsFamily {
  /// The family this binary was compiled for. Unlike [`Os::current`] this
  /// never fails: anything that is not Windows is treated as Unix-like.
  pub fn current() -> Self {
    if cfg!(windows) { Self::Windows } else { Self::Unix }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Unix => "unix",
      Self::Windows => "windows",
    }
  }
}

impl fmt::Display for OsFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_returns_supported_os() {
    assert!(Os::current().is_some(), "Current OS should be supported");
  }

  #[test]
  fn current_family_matches_current_os() {
    if let Some(os) = Os::current() {
      assert_eq!(os.family(), OsFamily::current());
    }
  }

  #[test]
  fn only_windows_is_in_the_windows_family() {
    assert_eq!(Os::Windows.family(), OsFamily::Windows);
    for os in [Os::Linux, Os::MacOs, Os::FreeBsd] {
      assert_eq!(os.family(), OsFamily::Unix);
    }
  }
}
