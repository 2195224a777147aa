//! Test utilities for pie-lib.
//!
//! Shell helpers for tests that spawn real processes, fake executables for
//! tool validation, and a recording [`ProcessRunner`] for pipeline tests that
//! must not spawn anything.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::process::{OutputChunk, OutputStream, ProcessError, ProcessRequest, ProcessRunner};
use crate::report::{BuildEvent, Reporter};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write an executable `/bin/sh` script to `dir/name` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// A call observed by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
  pub argv: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub timeout: Option<Duration>,
  pub streamed: bool,
}

type Handler = dyn Fn(&RecordedCall) -> Result<String, ProcessError> + Send + Sync;

/// A runner that never spawns anything.
///
/// Every request is recorded and answered by the handler. When the request
/// asks for streaming, one stdout and one stderr chunk are sent first.
pub struct RecordingRunner {
  calls: Mutex<Vec<RecordedCall>>,
  handler: Box<Handler>,
}

impl RecordingRunner {
  /// A runner for which every command succeeds with empty output.
  pub fn succeeding() -> Self {
    Self::with_handler(|_| Ok(String::new()))
  }

  pub fn with_handler(handler: impl Fn(&RecordedCall) -> Result<String, ProcessError> + Send + Sync + 'static) -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      handler: Box::new(handler),
    }
  }

  pub fn calls(&self) -> Vec<RecordedCall> {
    self.calls.lock().unwrap().clone()
  }

  pub fn argvs(&self) -> Vec<Vec<String>> {
    self.calls().into_iter().map(|c| c.argv).collect()
  }
}

impl ProcessRunner for RecordingRunner {
  async fn run(&self, request: ProcessRequest) -> Result<String, ProcessError> {
    let call = RecordedCall {
      argv: request.argv.clone(),
      cwd: request.cwd.clone(),
      timeout: request.timeout,
      streamed: request.output.is_some(),
    };
    self.calls.lock().unwrap().push(call.clone());

    if let Some(sink) = &request.output {
      let program = call.argv.first().cloned().unwrap_or_default();
      let _ = sink
        .send(OutputChunk::new(OutputStream::Stdout, format!("{program} out\n")))
        .await;
      let _ = sink
        .send(OutputChunk::new(OutputStream::Stderr, format!("{program} err\n")))
        .await;
    }

    (self.handler)(&call)
  }
}

/// Collects every reported event.
#[derive(Default, Clone)]
pub struct RecordingReporter {
  events: Arc<Mutex<Vec<BuildEvent>>>,
}

impl RecordingReporter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<BuildEvent> {
    self.events.lock().unwrap().clone()
  }

  /// The plain-text rendering of each event, in order.
  pub fn lines(&self) -> Vec<String> {
    self.events().iter().map(ToString::to_string).collect()
  }
}

impl Reporter for RecordingReporter {
  fn report(&self, event: BuildEvent) {
    self.events.lock().unwrap().push(event);
  }
}
