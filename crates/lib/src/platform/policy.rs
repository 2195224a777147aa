//! OS-dependent build and install conventions.
//!
//! The pipeline never branches on the operating system itself. Everything
//! that differs between families (library suffix, whether the executable bit
//! means anything, how to elevate) is asked of a [`PlatformPolicy`].

use std::fmt;
use std::sync::Arc;

use super::os::OsFamily;

pub trait PlatformPolicy: fmt::Debug + Send + Sync {
  fn family(&self) -> OsFamily;

  /// File suffix of a loadable native module, without the dot.
  fn shared_library_extension(&self) -> &str;

  /// Whether a tool must carry an executable permission to be usable.
  fn requires_executable_bit(&self) -> bool;

  /// Arguments to put in front of a command that needs elevated filesystem
  /// privileges. `None` when the platform has no such tool.
  fn elevation_command_prefix(&self) -> Option<&[String]>;
}

/// Linux, macOS and the BSDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixPolicy {
  elevation: Vec<String>,
}

impl UnixPolicy {
  /// Elevate with something other than plain `sudo`, e.g. `doas` or
  /// `sudo --non-interactive`.
  pub fn with_elevation<I, S>(prefix: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      elevation: prefix.into_iter().map(Into::into).collect(),
    }
  }
}

impl Default for UnixPolicy {
  fn default() -> Self {
    Self::with_elevation(["sudo"])
  }
}

impl PlatformPolicy for UnixPolicy {
  fn family(&self) -> OsFamily {
    OsFamily::Unix
  }

  fn shared_library_extension(&self) -> &str {
    "so"
  }

  fn requires_executable_bit(&self) -> bool {
    true
  }

  fn elevation_command_prefix(&self) -> Option<&[String]> {
    if self.elevation.is_empty() {
      None
    } else {
      Some(&self.elevation)
    }
  }
}

/// Windows has no executable bit and no command-line elevation tool we can
/// rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowsPolicy;

impl PlatformPolicy for WindowsPolicy {
  fn family(&self) -> OsFamily {
    OsFamily::Windows
  }

  fn shared_library_extension(&self) -> &str {
    "dll"
  }

  fn requires_executable_bit(&self) -> bool {
    false
  }

  fn elevation_command_prefix(&self) -> Option<&[String]> {
    None
  }
}

/// The default policy for a family.
pub fn policy_for(family: OsFamily) -> Arc<dyn PlatformPolicy> {
  match family {
    OsFamily::Unix => Arc::new(UnixPolicy::default()),
    OsFamily::Windows => Arc::new(WindowsPolicy),
  }
}
