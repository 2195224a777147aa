//! Stage definitions and command construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::process::{ProcessError, ProcessRequest, ProcessRunner};
use crate::report::{BuildEvent, Reporter};

/// One step of building or installing an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  /// `phpize`: generate `configure` from `config.m4`.
  Bootstrap,
  /// `./configure`: probe the host and PHP, write the Makefile.
  Configure,
  /// `make`: compile the shared library.
  Compile,
  /// `make install`: copy the library into the extension directory.
  Install,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Bootstrap => "bootstrap",
      Stage::Configure => "configure",
      Stage::Compile => "compile",
      Stage::Install => "install",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A fully computed stage command, built right before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStageSpec {
  pub stage: Stage,
  pub argv: Vec<String>,
  pub working_dir: PathBuf,
  pub timeout: Option<Duration>,
}

impl BuildStageSpec {
  pub fn new(stage: Stage, argv: Vec<String>, working_dir: &Path, timeout: Option<Duration>) -> Self {
    Self {
      stage,
      argv,
      working_dir: working_dir.to_path_buf(),
      timeout,
    }
  }

  pub fn command_line(&self) -> String {
    self.argv.join(" ")
  }

  fn request(&self) -> ProcessRequest {
    ProcessRequest::new(self.argv.iter().cloned())
      .cwd(&self.working_dir)
      .timeout(self.timeout)
  }
}

/// `./configure` with the caller's options, plus `--with-php-config=` when
/// the php-config of the target is known.
pub fn configure_command(options: &[String], php_config: Option<&Path>) -> Vec<String> {
  let mut argv = Vec::with_capacity(options.len() + 2);
  argv.push("./configure".to_string());
  argv.extend(options.iter().cloned());
  if let Some(php_config) = php_config {
    argv.push(format!("--with-php-config={}", php_config.display()));
  }
  argv
}

/// `make`, with `-j<N>` only when more than one job is wanted.
pub fn compile_command(jobs: usize) -> Vec<String> {
  let mut argv = vec!["make".to_string()];
  if jobs > 1 {
    argv.push(format!("-j{jobs}"));
  }
  argv
}

/// `make install`, behind the elevation prefix when one is given.
pub fn install_command(elevation: Option<&[String]>) -> Vec<String> {
  let mut argv: Vec<String> = elevation.map(<[String]>::to_vec).unwrap_or_default();
  argv.push("make".to_string());
  argv.push("install".to_string());
  argv
}

/// Run `spec` to completion. With `stream_capacity` set, output is forwarded
/// to `reporter` chunk by chunk while the command runs.
pub(crate) async fn execute<R: ProcessRunner>(
  runner: &R,
  reporter: &dyn Reporter,
  spec: &BuildStageSpec,
  stream_capacity: Option<usize>,
) -> Result<String, ProcessError> {
  debug!(stage = %spec.stage, command = %spec.command_line(), timeout = ?spec.timeout, "running stage");

  let Some(capacity) = stream_capacity else {
    return runner.run(spec.request()).await;
  };

  let (tx, mut rx) = mpsc::channel(capacity.max(1));
  let forward = async {
    while let Some(chunk) = rx.recv().await {
      reporter.report(BuildEvent::Output(chunk));
    }
  };

  // The sender is owned by the request, so the channel closes when the run ends.
  let (result, ()) = tokio::join!(runner.run(spec.request().stream_to(tx)), forward);
  result
}
