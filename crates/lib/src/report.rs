//! User-facing progress reporting.
//!
//! The pipeline emits [`BuildEvent`]s; a [`Reporter`] decides how they reach
//! the user. Diagnostics for developers go through `tracing` instead.

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::build::Stage;
use crate::process::{OutputChunk, OutputStream};

/// How much the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
  #[default]
  Normal,
  /// Echo commands and stream build output.
  Verbose,
  /// Additionally show the output of `make install`.
  VeryVerbose,
}

impl Verbosity {
  /// Map a repeated `-v` count onto a level.
  pub fn from_count(count: u8) -> Self {
    match count {
      0 => Verbosity::Normal,
      1 => Verbosity::Verbose,
      _ => Verbosity::VeryVerbose,
    }
  }

  pub fn is_verbose(&self) -> bool {
    *self >= Verbosity::Verbose
  }

  pub fn is_very_verbose(&self) -> bool {
    *self >= Verbosity::VeryVerbose
  }
}

/// Something the user should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
  /// A resolved package is about to be processed.
  PackageFound { package: String },
  /// Sources are extracted and ready to build.
  SourceReady { path: PathBuf },
  /// A stage command is about to run.
  Command { stage: Stage, command: String },
  /// Live output of the running command.
  Output(OutputChunk),
  BootstrapComplete,
  /// `options` includes `--with-php-config=` when it was passed.
  ConfigureComplete { options: Vec<String> },
  /// `make` runs without `-j`.
  ParallelismAdvisory,
  BuildComplete { path: PathBuf },
  /// The extension directory needs elevated privileges; `via` is the
  /// elevation program.
  Elevating { directory: PathBuf, via: String },
  /// Captured output of `make install`.
  InstallOutput(String),
  InstallComplete { path: PathBuf },
  /// The php.ini line that activates the extension.
  ActivationHint { directive: &'static str, extension: String },
}

impl fmt::Display for BuildEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildEvent::PackageFound { package } => write!(f, "Found package: {package}"),
      BuildEvent::SourceReady { path } => write!(f, "Extracted source to: {}", path.display()),
      BuildEvent::Command { stage, command } => write!(f, "[{stage}] Running: {command}"),
      BuildEvent::Output(chunk) => write!(f, "{}", chunk.text()),
      BuildEvent::BootstrapComplete => write!(f, "phpize complete."),
      BuildEvent::ConfigureComplete { options } if options.is_empty() => write!(f, "Configure complete."),
      BuildEvent::ConfigureComplete { options } => {
        write!(f, "Configure complete with options: {}", options.join(" "))
      }
      BuildEvent::ParallelismAdvisory => write!(
        f,
        "Running make without parallelization - try providing -jN to PIE where N is the number of cores you have."
      ),
      BuildEvent::BuildComplete { path } => write!(f, "Build complete: {}", path.display()),
      BuildEvent::Elevating { directory, via } => write!(
        f,
        "Cannot write to {}, so using {via} to elevate privileges.",
        directory.display()
      ),
      BuildEvent::InstallOutput(output) => write!(f, "{output}"),
      BuildEvent::InstallComplete { path } => write!(f, "Install complete: {}", path.display()),
      BuildEvent::ActivationHint { directive, extension } => {
        write!(f, "You must now add \"{directive}={extension}\" to your php.ini")
      }
    }
  }
}

/// Receives progress events from the pipeline.
pub trait Reporter: Send + Sync {
  fn report(&self, event: BuildEvent);
}

/// Forwards events to `tracing`, for library consumers without a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
  fn report(&self, event: BuildEvent) {
    match &event {
      BuildEvent::Output(chunk) => match chunk.stream {
        OutputStream::Stdout => info!(stream = "stdout", "{}", chunk.text().trim_end()),
        OutputStream::Stderr => info!(stream = "stderr", "{}", chunk.text().trim_end()),
      },
      other => info!("{other}"),
    }
  }
}
