//! The real [`ProcessRunner`], backed by `tokio::process`.

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{OutputChunk, OutputStream, ProcessError, ProcessRequest, ProcessRunner};

const READ_BUFFER_SIZE: usize = 8192;

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
  pub fn new() -> Self {
    Self
  }
}

impl ProcessRunner for TokioProcessRunner {
  async fn run(&self, request: ProcessRequest) -> Result<String, ProcessError> {
    let command_line = request.command_line();
    let ProcessRequest {
      argv,
      cwd,
      timeout,
      output,
    } = request;

    let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;

    let mut command = Command::new(program);
    command
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    if let Some(dir) = &cwd {
      command.current_dir(dir);
    }

    // The child leads its own group so everything it starts can be killed together.
    #[cfg(unix)]
    command.process_group(0);

    debug!(command = %command_line, cwd = ?cwd, timeout = ?timeout, "spawning process");

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
      command: command_line.clone(),
      source,
    })?;

    #[cfg(unix)]
    let group = ProcessGroup::led_by(&child, &command_line);

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
      return Err(ProcessError::Io {
        command: command_line,
        source: std::io::Error::other("child output pipes were not captured"),
      });
    };

    let sink = output.as_ref();
    let collect = async {
      let (stdout, stderr) = tokio::try_join!(
        pump(stdout, OutputStream::Stdout, sink),
        pump(stderr, OutputStream::Stderr, sink),
      )?;
      let status = child.wait().await?;
      Ok::<(ExitStatus, Vec<u8>, Vec<u8>), std::io::Error>((status, stdout, stderr))
    };

    let outcome = match timeout {
      Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
      None => Some(collect.await),
    };

    let Some(outcome) = outcome else {
      let limit = timeout.unwrap_or_default();
      warn!(command = %command_line, timeout = ?limit, "process timed out, terminating");
      #[cfg(unix)]
      group.kill();
      // kill() also reaps, so nothing is left behind once the error surfaces
      if let Err(e) = child.kill().await {
        warn!(command = %command_line, error = %e, "failed to terminate timed out process");
      }
      return Err(ProcessError::Timeout {
        command: command_line,
        timeout: limit,
      });
    };

    let (status, stdout, stderr) = outcome.map_err(|source| ProcessError::Io {
      command: command_line.clone(),
      source,
    })?;

    #[cfg(unix)]
    group.release();

    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    if !status.success() {
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(ProcessError::NonZeroExit {
        command: command_line,
        code: status.code(),
        stdout,
        stderr,
      });
    }

    debug!(command = %command_line, "process finished");

    Ok(stdout.trim().to_string())
  }
}

/// The process group a spawned child leads.
///
/// Dropping it before [`ProcessGroup::release`] SIGKILLs the whole group,
/// including grandchildren that `Child::kill` alone would leave running. This
/// covers timeouts as well as a run future dropped mid-flight.
#[cfg(unix)]
struct ProcessGroup {
  leader: Option<rustix::process::Pid>,
  command_line: String,
}

#[cfg(unix)]
impl ProcessGroup {
  fn led_by(child: &tokio::process::Child, command_line: &str) -> Self {
    let leader = child
      .id()
      .and_then(|id| i32::try_from(id).ok())
      .and_then(rustix::process::Pid::from_raw);
    Self {
      leader,
      command_line: command_line.to_string(),
    }
  }

  fn kill(mut self) {
    self.signal_kill();
  }

  /// The child exited on its own; leave the group alone.
  fn release(mut self) {
    self.leader = None;
  }

  fn signal_kill(&mut self) {
    let Some(leader) = self.leader.take() else {
      return;
    };
    if let Err(e) = rustix::process::kill_process_group(leader, rustix::process::Signal::KILL) {
      warn!(command = %self.command_line, error = %e, "failed to terminate process group");
    }
  }
}

#[cfg(unix)]
impl Drop for ProcessGroup {
  fn drop(&mut self) {
    self.signal_kill();
  }
}

/// Read a pipe to the end, forwarding each chunk to `sink` when present.
///
/// A dropped receiver does not stop the read; the output is still captured
/// for the return value and for diagnostics.
async fn pump<R>(mut reader: R, stream: OutputStream, sink: Option<&mpsc::Sender<OutputChunk>>) -> std::io::Result<Vec<u8>>
where
  R: AsyncRead + Unpin,
{
  let mut captured = Vec::new();
  let mut buffer = [0u8; READ_BUFFER_SIZE];

  loop {
    let read = reader.read(&mut buffer).await?;
    if read == 0 {
      break;
    }
    captured.extend_from_slice(&buffer[..read]);
    if let Some(sink) = sink {
      let _ = sink.send(OutputChunk::new(stream, &buffer[..read])).await;
    }
  }

  Ok(captured)
}
