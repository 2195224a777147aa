//! Permission checks for the current user.
//!
//! On Unix these go through `access(2)`, so they answer for the real user
//! and take ACLs and read-only mounts into account instead of guessing from
//! mode bits.

use std::path::Path;

/// Whether the current user may write to `path`. A missing path is not
/// writable.
#[cfg(unix)]
pub fn is_writable(path: &Path) -> bool {
  rustix::fs::access(path, rustix::fs::Access::WRITE_OK).is_ok()
}

#[cfg(windows)]
pub fn is_writable(path: &Path) -> bool {
  std::fs::metadata(path)
    .map(|m| !m.permissions().readonly())
    .unwrap_or(false)
}

/// Whether `path` is a regular file the current user may execute.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
  path.is_file() && rustix::fs::access(path, rustix::fs::Access::EXEC_OK).is_ok()
}

#[cfg(windows)]
pub fn is_executable(path: &Path) -> bool {
  path.is_file()
}

/// Whether the process runs with root (or administrator) privileges.
#[cfg(unix)]
pub fn is_elevated() -> bool {
  rustix::process::geteuid().is_root()
}

#[cfg(windows)]
pub fn is_elevated() -> bool {
  false
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use std::fs;
  use std::os::unix::fs::PermissionsExt;
  use tempfile::tempdir;

  #[test]
  fn missing_path_is_neither_writable_nor_executable() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("nope");
    assert!(!is_writable(&missing));
    assert!(!is_executable(&missing));
  }

  #[test]
  fn fresh_temp_dir_is_writable() {
    let temp = tempdir().unwrap();
    assert!(is_writable(temp.path()));
  }

  #[test]
  fn directory_is_not_executable_tool() {
    let temp = tempdir().unwrap();
    assert!(!is_executable(temp.path()));
  }

  #[test]
  fn executable_bit_is_honoured() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("tool");
    fs::write(&file, "#!/bin/sh\n").unwrap();

    fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
    assert!(!is_executable(&file));

    fs::set_permissions(&file, fs::Permissions::from_mode(0o755)).unwrap();
    assert!(is_executable(&file));
  }

  #[test]
  fn read_only_directory_is_not_writable() {
    // root bypasses permission bits
    if is_elevated() {
      return;
    }
    let temp = tempdir().unwrap();
    let dir = temp.path().join("locked");
    fs::create_dir(&dir).unwrap();
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

    assert!(!is_writable(&dir));

    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
  }
}
