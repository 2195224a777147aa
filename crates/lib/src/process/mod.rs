//! External command execution.
//!
//! Every external tool the pipeline touches (phpize, configure, make, git,
//! php itself) goes through a [`ProcessRunner`]. A run is one blocking
//! request: spawn, optionally stream output, wait, and fail on timeout or a
//! non-zero exit.
//!
//! Output streaming is a bounded channel of [`OutputChunk`]s that the caller
//! drains while the run is in flight. The sender lives inside the request, so
//! the channel closes as soon as the run completes.

mod runner;

pub use runner::TokioProcessRunner;

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

/// Which pipe a chunk of output was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
  Stdout,
  Stderr,
}

impl fmt::Display for OutputStream {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OutputStream::Stdout => write!(f, "stdout"),
      OutputStream::Stderr => write!(f, "stderr"),
    }
  }
}

/// A chunk of raw output as it was read from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
  pub stream: OutputStream,
  pub data: Vec<u8>,
}

impl OutputChunk {
  pub fn new(stream: OutputStream, data: impl Into<Vec<u8>>) -> Self {
    Self {
      stream,
      data: data.into(),
    }
  }

  /// Lossy UTF-8 view of the chunk.
  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.data).into_owned()
  }
}

/// A single command invocation.
#[derive(Debug)]
pub struct ProcessRequest {
  pub argv: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub timeout: Option<Duration>,
  pub output: Option<mpsc::Sender<OutputChunk>>,
}

impl ProcessRequest {
  pub fn new<I, S>(argv: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      argv: argv.into_iter().map(Into::into).collect(),
      cwd: None,
      timeout: None,
      output: None,
    }
  }

  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Hard wall-clock cap, measured from spawn. `None` means unbounded.
  pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// Deliver every chunk of stdout and stderr to `sender` as it is read.
  pub fn stream_to(mut self, sender: mpsc::Sender<OutputChunk>) -> Self {
    self.output = Some(sender);
    self
  }

  /// The argument vector joined with spaces, for logs and error messages.
  pub fn command_line(&self) -> String {
    self.argv.join(" ")
  }
}

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The request had an empty argument vector.
  #[error("no command given")]
  EmptyCommand,

  /// The OS refused to start the process.
  #[error("failed to start `{command}`")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// The process outlived its wall-clock budget and was killed.
  #[error("`{command}` timed out after {timeout:?} and was terminated")]
  Timeout { command: String, timeout: Duration },

  /// The process ran to completion but reported failure.
  #[error("`{command}` failed with {}{}", exit_label(.code), diagnostics(.stdout, .stderr))]
  NonZeroExit {
    command: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  /// Reading output from or waiting on the process failed.
  #[error("i/o error while running `{command}`")]
  Io {
    command: String,
    #[source]
    source: std::io::Error,
  },
}

impl ProcessError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, ProcessError::Timeout { .. })
  }
}

fn exit_label(code: &Option<i32>) -> String {
  match *code {
    Some(code) => format!("exit code {code}"),
    None => "no exit code (terminated by signal)".to_string(),
  }
}

fn diagnostics(stdout: &str, stderr: &str) -> String {
  let mut text = String::new();
  for (label, body) in [("output", stdout.trim()), ("error output", stderr.trim())] {
    if !body.is_empty() {
      text.push_str(&format!("\n\n{label}:\n{body}"));
    }
  }
  text
}

/// Runs external commands.
///
/// Implementations must not leak the child: when a timeout fires the process
/// is terminated and reaped before [`ProcessError::Timeout`] is returned.
/// On success the trimmed stdout is returned.
pub trait ProcessRunner: Send + Sync {
  fn run(&self, request: ProcessRequest) -> impl Future<Output = Result<String, ProcessError>> + Send;
}

impl<R: ProcessRunner> ProcessRunner for &R {
  fn run(&self, request: ProcessRequest) -> impl Future<Output = Result<String, ProcessError>> + Send {
    (**self).run(request)
  }
}
