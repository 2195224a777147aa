//! Validation of external tools.
//!
//! Every tool the pipeline shells out to by explicit path is checked the same
//! way before use: the path must exist, must be executable where the platform
//! cares, and must answer a version probe with the expected output.

pub mod git;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use crate::platform::access::is_executable;
use crate::platform::PlatformPolicy;
use crate::platform::target::sibling_tool;
use crate::process::{ProcessError, ProcessRequest, ProcessRunner};

static GIT_VERSION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"git version \d+\.\d+\.\d+").expect("git version pattern is valid"));

static PHPIZE_VERSION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"PHP Api Version:\s+\d+").expect("phpize version pattern is valid"));

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("{name} not found at {path}")]
  NotFound { name: String, path: String },

  #[error("{name} at {path} is not executable")]
  NotExecutable { name: String, path: String },

  #[error("{path} does not look like {name}: unexpected version output {output:?}")]
  VersionUnrecognized { name: String, path: String, output: String },

  #[error("failed to query the version of {name} at {path}")]
  Probe {
    name: String,
    path: String,
    #[source]
    source: ProcessError,
  },
}

/// How to recognize one external tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
  pub name: String,
  pub version_args: Vec<String>,
  pub version_pattern: Regex,
}

impl ToolSpec {
  pub fn new(name: impl Into<String>, version_args: &[&str], version_pattern: Regex) -> Self {
    Self {
      name: name.into(),
      version_args: version_args.iter().map(|a| a.to_string()).collect(),
      version_pattern,
    }
  }

  /// A tool that answers `--version` with `<name> version X.Y.Z`.
  pub fn named(name: &str) -> Result<Self, regex::Error> {
    let pattern = Regex::new(&format!(r"{} version \d+\.\d+\.\d+", regex::escape(name)))?;
    Ok(Self::new(name, &["--version"], pattern))
  }

  pub fn git() -> Self {
    Self::new("git", &["--version"], GIT_VERSION.clone())
  }

  pub fn phpize() -> Self {
    Self::new("phpize", &["--version"], PHPIZE_VERSION.clone())
  }
}

/// An external tool that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHandle {
  /// Absolute path of the binary.
  pub path: PathBuf,
  pub name: String,
  /// The part of the probe output that matched the version pattern.
  pub version: String,
}

impl ToolHandle {
  /// Check `path` against `spec`. The version probe runs without a timeout.
  pub async fn validate<R: ProcessRunner>(
    path: impl AsRef<Path>,
    spec: &ToolSpec,
    policy: &dyn PlatformPolicy,
    runner: &R,
  ) -> Result<Self, ToolError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    if !path.exists() {
      return Err(ToolError::NotFound {
        name: spec.name.clone(),
        path: shown,
      });
    }

    if policy.requires_executable_bit() && !is_executable(path) {
      return Err(ToolError::NotExecutable {
        name: spec.name.clone(),
        path: shown,
      });
    }

    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut argv = vec![path.display().to_string()];
    argv.extend(spec.version_args.iter().cloned());

    let output = match runner.run(ProcessRequest::new(argv)).await {
      Ok(output) => output,
      Err(ProcessError::NonZeroExit { stdout, stderr, .. }) => {
        return Err(ToolError::VersionUnrecognized {
          name: spec.name.clone(),
          path: shown,
          output: format!("{stdout}{stderr}").trim().to_string(),
        });
      }
      // Present and executable, but the OS refuses to run it (wrong format or architecture).
      Err(ProcessError::Spawn { source, .. }) => {
        debug!(tool = %spec.name, path = %shown, error = %source, "version probe could not start");
        return Err(ToolError::VersionUnrecognized {
          name: spec.name.clone(),
          path: shown,
          output: String::new(),
        });
      }
      Err(source) => {
        return Err(ToolError::Probe {
          name: spec.name.clone(),
          path: shown,
          source,
        });
      }
    };

    let Some(found) = spec.version_pattern.find(&output) else {
      return Err(ToolError::VersionUnrecognized {
        name: spec.name.clone(),
        path: shown,
        output,
      });
    };

    let handle = Self {
      path,
      name: spec.name.clone(),
      version: found.as_str().to_string(),
    };
    info!(tool = %handle.name, path = %handle.path.display(), version = %handle.version, "validated tool");
    Ok(handle)
  }
}

impl fmt::Display for ToolHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.path.display(), self.version)
  }
}

/// Where to look for `phpize` for the given php binary: next to it with the
/// same version suffix, else the first `phpize` on `PATH`, else the sibling
/// path so validation reports it as missing.
pub fn guess_phpize_path(php: &Path) -> PathBuf {
  let sibling = sibling_tool(php, "phpize");
  if sibling.exists() {
    return sibling;
  }

  match which::which("phpize") {
    Ok(found) => {
      debug!(php = %php.display(), phpize = %found.display(), "using phpize from PATH");
      found
    }
    Err(_) => sibling,
  }
}
