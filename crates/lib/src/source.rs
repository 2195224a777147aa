//! Extracted extension sources and the download boundary.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::package::{ExtensionKind, ExtensionName, Package};
use crate::platform::PlatformPolicy;

/// A buildable source tree for one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
  /// Absolute path of the extracted sources; the working directory of every
  /// build and install stage.
  pub path: PathBuf,
  pub extension_name: ExtensionName,
  pub extension_kind: ExtensionKind,
}

impl SourceTree {
  pub fn new(path: impl Into<PathBuf>, extension_name: ExtensionName, extension_kind: ExtensionKind) -> Self {
    Self {
      path: path.into(),
      extension_name,
      extension_kind,
    }
  }

  /// `<name>.<shared library extension>`
  pub fn shared_library_name(&self, policy: &dyn PlatformPolicy) -> String {
    format!("{}.{}", self.extension_name, policy.shared_library_extension())
  }

  /// Where `make` leaves the compiled extension: `<source>/modules/<name>.<ext>`.
  pub fn compiled_artifact_path(&self, policy: &dyn PlatformPolicy) -> PathBuf {
    self.path.join("modules").join(self.shared_library_name(policy))
  }

  /// Where `make install` puts the extension inside `extension_dir`.
  pub fn installed_artifact_path(&self, extension_dir: &Path, policy: &dyn PlatformPolicy) -> PathBuf {
    extension_dir.join(self.shared_library_name(policy))
  }
}

#[derive(Debug, Error)]
pub enum DownloadError {
  #[error("source directory {path} does not exist or is not a directory")]
  MissingSource { path: String },

  #[error("failed to resolve source directory {path}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Turns a resolved package into an extracted source tree.
pub trait Downloader {
  fn download(&self, package: &Package) -> Result<SourceTree, DownloadError>;
}

/// Uses a directory that already holds the extracted sources.
#[derive(Debug, Clone)]
pub struct LocalSourceDownloader {
  root: PathBuf,
}

impl LocalSourceDownloader {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl Downloader for LocalSourceDownloader {
  fn download(&self, package: &Package) -> Result<SourceTree, DownloadError> {
    if !self.root.is_dir() {
      return Err(DownloadError::MissingSource {
        path: self.root.display().to_string(),
      });
    }

    let path = std::path::absolute(&self.root).map_err(|source| DownloadError::Io {
      path: self.root.display().to_string(),
      source,
    })?;

    debug!(package = %package.pretty_name_and_version(), path = %path.display(), "using local sources");

    Ok(SourceTree::new(path, package.extension_name.clone(), package.extension_kind))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{UnixPolicy, WindowsPolicy};
  use tempfile::tempdir;

  fn package() -> Package {
    Package {
      name: "acme/foo".to_string(),
      version: "1.2.3".to_string(),
      extension_name: ExtensionName::new("foo").unwrap(),
      extension_kind: ExtensionKind::PhpModule,
    }
  }

  #[test]
  fn artifact_paths_follow_policy() {
    let tree = SourceTree::new("/src/foo", ExtensionName::new("foo").unwrap(), ExtensionKind::PhpModule);

    assert_eq!(
      tree.compiled_artifact_path(&UnixPolicy::default()),
      PathBuf::from("/src/foo/modules/foo.so")
    );
    assert_eq!(
      tree.installed_artifact_path(Path::new("/usr/lib/php/ext"), &UnixPolicy::default()),
      PathBuf::from("/usr/lib/php/ext/foo.so")
    );
    assert_eq!(tree.shared_library_name(&WindowsPolicy), "foo.dll");
  }

  #[test]
  fn local_download_returns_absolute_tree() {
    let temp = tempdir().unwrap();
    let tree = LocalSourceDownloader::new(temp.path()).download(&package()).unwrap();

    assert!(tree.path.is_absolute());
    assert_eq!(tree.extension_name.name(), "foo");
    assert_eq!(tree.extension_kind, ExtensionKind::PhpModule);
  }

  #[test]
  fn local_download_requires_directory() {
    let temp = tempdir().unwrap();
    let err = LocalSourceDownloader::new(temp.path().join("missing"))
      .download(&package())
      .unwrap_err();
    assert!(matches!(err, DownloadError::MissingSource { .. }));
  }
}
