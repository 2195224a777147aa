//! Terminal output for pie commands.
//!
//! Every status line is a [`Status`] symbol followed by a message, written to
//! a [`Sink`]. JSON runs keep stdout for the final document and send progress
//! to stderr instead.

use std::io::Write;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }

  /// Where progress lines go for this format.
  pub fn progress_sink(self) -> Sink {
    if self.is_json() { Sink::Stderr } else { Sink::Stdout }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
  Stdout,
  Stderr,
}

impl Sink {
  fn stream(self) -> Stream {
    match self {
      Sink::Stdout => Stream::Stdout,
      Sink::Stderr => Stream::Stderr,
    }
  }

  /// Write `text` verbatim, without a trailing newline.
  pub fn write_raw(self, text: &str) {
    match self {
      Sink::Stdout => {
        print!("{text}");
        let _ = std::io::stdout().flush();
      }
      Sink::Stderr => eprint!("{text}"),
    }
  }

  fn write_line(self, line: std::fmt::Arguments<'_>) {
    match self {
      Sink::Stdout => println!("{line}"),
      Sink::Stderr => eprintln!("{line}"),
    }
  }
}

/// Kind of a status line; picks its symbol and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Failed,
  Warning,
  Note,
  Command,
}

impl Status {
  pub fn symbol(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Failed => "✗",
      Status::Warning => "⚠",
      Status::Note => "•",
      Status::Command => "→",
    }
  }

  fn paint(self, text: &str) -> String {
    match self {
      Status::Done => text.green().to_string(),
      Status::Failed => text.red().to_string(),
      Status::Warning => text.yellow().to_string(),
      Status::Note => text.blue().to_string(),
      Status::Command => text.dimmed().to_string(),
    }
  }

  /// Failures and warnings color the whole line, not just the symbol.
  fn tints_message(self) -> bool {
    matches!(self, Status::Failed | Status::Warning)
  }
}

pub fn print_status(sink: Sink, status: Status, message: &str) {
  let stream = sink.stream();
  let glyph = status.symbol();
  let symbol = glyph.if_supports_color(stream, |s| status.paint(s));
  if status.tints_message() {
    sink.write_line(format_args!(
      "{symbol} {}",
      message.if_supports_color(stream, |s| status.paint(s))
    ));
  } else {
    sink.write_line(format_args!("{symbol} {message}"));
  }
}

pub fn print_error(message: &str) {
  print_status(Sink::Stderr, Status::Failed, message);
}

/// An indented `label: value` line on stdout.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
