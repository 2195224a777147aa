//! Deciding whether `make install` needs elevated privileges.

use std::path::Path;

use crate::platform::access::is_writable;

/// What the current user may write, observed right before installing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeProbe {
  pub directory_writable: bool,
  /// `None` when nothing is installed at the target path yet.
  pub existing_file_writable: Option<bool>,
}

impl PrivilegeProbe {
  /// Look at `directory` and `installed_path` now. Never cached.
  pub fn inspect(directory: &Path, installed_path: &Path) -> Self {
    Self {
      directory_writable: is_writable(directory),
      existing_file_writable: installed_path.exists().then(|| is_writable(installed_path)),
    }
  }

  /// Elevate iff the directory is not writable, or a file is already
  /// installed there and it is not writable.
  pub fn requires_elevation(&self) -> bool {
    !self.directory_writable || self.existing_file_writable == Some(false)
  }
}
