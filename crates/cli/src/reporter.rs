//! Terminal rendering of pipeline progress.

use owo_colors::{OwoColorize, Stream};
use pie_lib::process::OutputStream;
use pie_lib::report::{BuildEvent, Reporter};

use crate::output::{Sink, Status, print_status};

/// Prints [`BuildEvent`]s as they arrive.
///
/// Summary lines and the build's own stdout go to `sink`; the build's stderr
/// always goes to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
  sink: Sink,
}

impl ConsoleReporter {
  pub fn new(sink: Sink) -> Self {
    Self { sink }
  }

  fn raw(&self, stream: OutputStream, text: &str) {
    match stream {
      OutputStream::Stdout => self.sink.write_raw(text),
      OutputStream::Stderr => {
        let tinted = text.if_supports_color(Stream::Stderr, |s| s.yellow()).to_string();
        Sink::Stderr.write_raw(&tinted);
      }
    }
  }
}

fn status_of(event: &BuildEvent) -> Status {
  match event {
    BuildEvent::Command { .. } => Status::Command,
    BuildEvent::ParallelismAdvisory | BuildEvent::Elevating { .. } => Status::Warning,
    BuildEvent::BuildComplete { .. } | BuildEvent::InstallComplete { .. } => Status::Done,
    _ => Status::Note,
  }
}

impl Reporter for ConsoleReporter {
  fn report(&self, event: BuildEvent) {
    match &event {
      BuildEvent::Output(chunk) => self.raw(chunk.stream, &chunk.text()),
      BuildEvent::InstallOutput(output) => self.raw(OutputStream::Stdout, &format!("{output}\n")),
      _ => print_status(self.sink, status_of(&event), &event.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn events_map_to_statuses() {
    assert_eq!(status_of(&BuildEvent::ParallelismAdvisory), Status::Warning);
    assert_eq!(
      status_of(&BuildEvent::Elevating {
        directory: PathBuf::from("/usr/lib/php"),
        via: "sudo".to_string(),
      }),
      Status::Warning
    );
    assert_eq!(
      status_of(&BuildEvent::BuildComplete {
        path: PathBuf::from("modules/x.so")
      }),
      Status::Done
    );
    assert_eq!(status_of(&BuildEvent::BootstrapComplete), Status::Note);
  }
}
