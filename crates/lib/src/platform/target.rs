//! The PHP installation an extension is built for.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::os::OsFamily;
use super::policy::{PlatformPolicy, policy_for};
use crate::process::{ProcessError, ProcessRequest, ProcessRunner};

const EXTENSION_DIR_PROBE: &str = r#"echo ini_get("extension_dir");"#;

/// Everything the build and install stages need to know about the target
/// PHP. Constructed once per invocation and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
  pub php_binary: PathBuf,
  /// `php-config` of the same installation, passed to `./configure` when known.
  pub php_config: Option<PathBuf>,
  /// Where `make install` puts the built extension.
  pub extension_dir: PathBuf,
  pub make_parallel_jobs: usize,
  pub dry_run: bool,
  pub os_family: OsFamily,
}

/// Inputs for [`TargetPlatform::detect`]. Anything left `None` is discovered.
#[derive(Debug, Clone, Default)]
pub struct TargetPlatformOptions {
  pub php_binary: Option<PathBuf>,
  pub php_config: Option<PathBuf>,
  pub extension_dir: Option<PathBuf>,
  pub make_parallel_jobs: Option<usize>,
  pub dry_run: bool,
}

#[derive(Debug, Error)]
pub enum TargetPlatformError {
  #[error("could not find a php binary on PATH; pass the path to php explicitly")]
  PhpNotFound(#[source] which::Error),

  #[error("failed to query the extension directory from {php}")]
  ExtensionDirProbe {
    php: String,
    #[source]
    source: ProcessError,
  },

  #[error("{php} reported an empty extension_dir")]
  EmptyExtensionDir { php: String },

  #[error("make parallel jobs must be at least 1")]
  ZeroParallelJobs,
}

impl TargetPlatform {
  /// Platform conventions for this target's OS family.
  pub fn policy(&self) -> Arc<dyn PlatformPolicy> {
    policy_for(self.os_family)
  }

  /// Fill in whatever `options` leaves open by inspecting the host.
  ///
  /// - php: first `php` on `PATH`
  /// - php-config: sibling of the php binary with the same version suffix,
  ///   if it exists
  /// - extension directory: `ini_get("extension_dir")` as reported by php
  /// - parallel jobs: available parallelism of the host
  pub async fn detect<R: ProcessRunner>(
    options: TargetPlatformOptions,
    runner: &R,
  ) -> Result<Self, TargetPlatformError> {
    let php_binary = match options.php_binary {
      Some(path) => path,
      None => which::which("php").map_err(TargetPlatformError::PhpNotFound)?,
    };

    let php_config = options.php_config.or_else(|| {
      let candidate = sibling_tool(&php_binary, "php-config");
      candidate.is_file().then_some(candidate)
    });

    let extension_dir = match options.extension_dir {
      Some(dir) => dir,
      None => probe_extension_dir(&php_binary, runner).await?,
    };

    let make_parallel_jobs = match options.make_parallel_jobs {
      Some(0) => return Err(TargetPlatformError::ZeroParallelJobs),
      Some(jobs) => jobs,
      None => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    };

    let target = Self {
      php_binary,
      php_config,
      extension_dir,
      make_parallel_jobs,
      dry_run: options.dry_run,
      os_family: OsFamily::current(),
    };

    info!(
      php = %target.php_binary.display(),
      php_config = ?target.php_config,
      extension_dir = %target.extension_dir.display(),
      jobs = target.make_parallel_jobs,
      dry_run = target.dry_run,
      "target platform"
    );

    Ok(target)
  }
}

async fn probe_extension_dir<R: ProcessRunner>(php: &Path, runner: &R) -> Result<PathBuf, TargetPlatformError> {
  let php_display = php.display().to_string();
  let request = ProcessRequest::new([php_display.clone(), "-r".to_string(), EXTENSION_DIR_PROBE.to_string()]);

  let output = runner
    .run(request)
    .await
    .map_err(|source| TargetPlatformError::ExtensionDirProbe {
      php: php_display.clone(),
      source,
    })?;

  if output.is_empty() {
    return Err(TargetPlatformError::EmptyExtensionDir { php: php_display });
  }

  debug!(php = %php_display, extension_dir = %output, "probed extension directory");
  Ok(PathBuf::from(output))
}

/// Path of `tool` installed next to `php`, carrying over the version suffix
/// distributions append to the binary name (`php8.3` -> `phpize8.3`).
pub fn sibling_tool(php: &Path, tool: &str) -> PathBuf {
  let stem = php.file_stem().and_then(|s| s.to_str()).unwrap_or("php");
  let suffix = stem.strip_prefix("php").unwrap_or("");
  let extension = php.extension().and_then(|e| e.to_str());

  let mut name = format!("{tool}{suffix}");
  if let Some(ext) = extension {
    name.push('.');
    name.push_str(ext);
  }

  match php.parent() {
    Some(dir) => dir.join(name),
    None => PathBuf::from(name),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::RecordingRunner;
  use tempfile::tempdir;

  #[test]
  fn sibling_tool_keeps_version_suffix() {
    assert_eq!(
      sibling_tool(Path::new("/usr/bin/php8.3"), "phpize"),
      PathBuf::from("/usr/bin/phpize8.3")
    );
    assert_eq!(
      sibling_tool(Path::new("/opt/php/bin/php"), "php-config"),
      PathBuf::from("/opt/php/bin/php-config")
    );
  }

  #[test]
  fn sibling_tool_keeps_file_extension() {
    assert_eq!(
      sibling_tool(Path::new("C:/php/php.exe"), "phpize"),
      PathBuf::from("C:/php/phpize.exe")
    );
  }

  #[tokio::test]
  async fn explicit_options_spawn_nothing() {
    let runner = RecordingRunner::succeeding();
    let options = TargetPlatformOptions {
      php_binary: Some(PathBuf::from("/usr/bin/php")),
      php_config: Some(PathBuf::from("/usr/bin/php-config")),
      extension_dir: Some(PathBuf::from("/usr/lib/php/20230831")),
      make_parallel_jobs: Some(4),
      dry_run: true,
    };

    let target = TargetPlatform::detect(options, &runner).await.unwrap();

    assert!(runner.calls().is_empty());
    assert_eq!(target.extension_dir, PathBuf::from("/usr/lib/php/20230831"));
    assert_eq!(target.make_parallel_jobs, 4);
    assert!(target.dry_run);
    assert_eq!(target.os_family, OsFamily::current());
  }

  #[test]
  fn policy_follows_os_family() {
    let mut target = TargetPlatform {
      php_binary: PathBuf::from("C:/php/php.exe"),
      php_config: None,
      extension_dir: PathBuf::from("C:/php/ext"),
      make_parallel_jobs: 1,
      dry_run: false,
      os_family: OsFamily::Windows,
    };
    assert_eq!(target.policy().shared_library_extension(), "dll");

    target.os_family = OsFamily::Unix;
    assert_eq!(target.policy().shared_library_extension(), "so");
  }

  #[tokio::test]
  async fn extension_dir_is_probed_from_php() {
    let runner = RecordingRunner::with_handler(|_| Ok("/usr/lib/php/20230831".to_string()));
    let options = TargetPlatformOptions {
      php_binary: Some(PathBuf::from("/usr/bin/php8.3")),
      make_parallel_jobs: Some(1),
      ..Default::default()
    };

    let target = TargetPlatform::detect(options, &runner).await.unwrap();

    assert_eq!(target.extension_dir, PathBuf::from("/usr/lib/php/20230831"));
    assert_eq!(
      runner.argvs(),
      vec![vec![
        "/usr/bin/php8.3".to_string(),
        "-r".to_string(),
        EXTENSION_DIR_PROBE.to_string()
      ]]
    );
  }

  #[tokio::test]
  async fn empty_extension_dir_is_rejected() {
    let runner = RecordingRunner::succeeding();
    let options = TargetPlatformOptions {
      php_binary: Some(PathBuf::from("/usr/bin/php")),
      ..Default::default()
    };

    let err = TargetPlatform::detect(options, &runner).await.unwrap_err();
    assert!(matches!(err, TargetPlatformError::EmptyExtensionDir { .. }));
  }

  #[tokio::test]
  async fn zero_jobs_is_rejected() {
    let runner = RecordingRunner::succeeding();
    let options = TargetPlatformOptions {
      php_binary: Some(PathBuf::from("/usr/bin/php")),
      extension_dir: Some(PathBuf::from("/ext")),
      make_parallel_jobs: Some(0),
      ..Default::default()
    };

    let err = TargetPlatform::detect(options, &runner).await.unwrap_err();
    assert!(matches!(err, TargetPlatformError::ZeroParallelJobs));
  }

  #[tokio::test]
  async fn php_config_next_to_php_is_picked_up() {
    let temp = tempdir().unwrap();
    let php = temp.path().join("php8.2");
    std::fs::write(&php, "").unwrap();
    std::fs::write(temp.path().join("php-config8.2"), "").unwrap();

    let runner = RecordingRunner::succeeding();
    let options = TargetPlatformOptions {
      php_binary: Some(php),
      extension_dir: Some(temp.path().join("ext")),
      ..Default::default()
    };

    let target = TargetPlatform::detect(options, &runner).await.unwrap();

    assert_eq!(target.php_config, Some(temp.path().join("php-config8.2")));
    assert!(target.make_parallel_jobs >= 1);
  }
}
