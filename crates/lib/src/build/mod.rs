//! Building PHP extensions from source.
//!
//! A build is three stages run strictly in order in the source tree:
//!
//! 1. **bootstrap**: the validated `phpize` generates `configure`
//! 2. **configure**: `./configure` with the caller's options
//! 3. **compile**: `make`, parallelised with `-jN` when asked to
//!
//! Any stage failure aborts the build. Afterwards the compiled library must
//! exist at `<source>/modules/<name>.<ext>`. In dry-run mode commands are
//! computed and reported but nothing is spawned and nothing is verified.
//!
//! # Submodules
//!
//! - [`stage`] - Stage definitions and command construction

pub mod stage;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

pub use stage::{BuildStageSpec, Stage, compile_command, configure_command, install_command};

use crate::artifact::BinaryArtifact;
use crate::config::PipelineConfig;
use crate::platform::{PlatformPolicy, TargetPlatform};
use crate::process::{ProcessError, ProcessRunner};
use crate::report::{BuildEvent, Reporter, Verbosity};
use crate::source::SourceTree;
use crate::tool::ToolHandle;
use crate::util::hash::HashError;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("{stage} stage failed")]
  Stage {
    stage: Stage,
    #[source]
    source: ProcessError,
  },

  #[error("build completed but the extension binary was not found at {}", .path.display())]
  ExtensionBinaryNotFound { path: PathBuf },

  #[error("failed to checksum the built extension")]
  Checksum(#[from] HashError),
}

impl BuildError {
  /// The process failure behind a stage error, if any.
  pub fn process_error(&self) -> Option<&ProcessError> {
    match self {
      BuildError::Stage { source, .. } => Some(source),
      _ => None,
    }
  }
}

/// Runs bootstrap, configure and compile for one source tree.
pub struct BuildPipeline<R> {
  runner: R,
  policy: Arc<dyn PlatformPolicy>,
  config: PipelineConfig,
  reporter: Arc<dyn Reporter>,
}

impl<R: ProcessRunner> BuildPipeline<R> {
  pub fn new(runner: R, policy: Arc<dyn PlatformPolicy>, config: PipelineConfig, reporter: Arc<dyn Reporter>) -> Self {
    Self {
      runner,
      policy,
      config,
      reporter,
    }
  }

  /// Build the extension in `source` for `target`.
  ///
  /// `bootstrap_tool` must already be validated; it is run without
  /// arguments. `configure_options` are passed to `./configure` in order.
  pub async fn build(
    &self,
    source: &SourceTree,
    target: &TargetPlatform,
    configure_options: &[String],
    verbosity: Verbosity,
    bootstrap_tool: &ToolHandle,
  ) -> Result<BinaryArtifact, BuildError> {
    info!(
      extension = %source.extension_name,
      source = %source.path.display(),
      dry_run = target.dry_run,
      "building extension"
    );

    let bootstrap = BuildStageSpec::new(
      Stage::Bootstrap,
      vec![bootstrap_tool.path.display().to_string()],
      &source.path,
      self.config.bootstrap_timeout,
    );
    self.run_stage(&bootstrap, target, verbosity).await?;
    self.reporter.report(BuildEvent::BootstrapComplete);

    let configure = BuildStageSpec::new(
      Stage::Configure,
      configure_command(configure_options, target.php_config.as_deref()),
      &source.path,
      self.config.configure_timeout,
    );
    self.run_stage(&configure, target, verbosity).await?;
    self.reporter.report(BuildEvent::ConfigureComplete {
      options: configure.argv[1..].to_vec(),
    });

    if target.make_parallel_jobs <= 1 {
      self.reporter.report(BuildEvent::ParallelismAdvisory);
    }
    let compile = BuildStageSpec::new(
      Stage::Compile,
      compile_command(target.make_parallel_jobs),
      &source.path,
      self.config.compile_timeout,
    );
    self.run_stage(&compile, target, verbosity).await?;

    let expected = source.compiled_artifact_path(self.policy.as_ref());

    let artifact = if target.dry_run {
      BinaryArtifact::simulated(expected, self.config.dry_run_checksum.clone())
    } else {
      if !expected.is_file() {
        return Err(BuildError::ExtensionBinaryNotFound { path: expected });
      }
      BinaryArtifact::from_file(expected)?
    };

    info!(path = %artifact.path.display(), checksum = %artifact.checksum, "build complete");
    self.reporter.report(BuildEvent::BuildComplete {
      path: artifact.path.clone(),
    });

    Ok(artifact)
  }

  async fn run_stage(
    &self,
    spec: &BuildStageSpec,
    target: &TargetPlatform,
    verbosity: Verbosity,
  ) -> Result<(), BuildError> {
    if verbosity.is_verbose() {
      self.reporter.report(BuildEvent::Command {
        stage: spec.stage,
        command: spec.command_line(),
      });
    }

    if target.dry_run {
      debug!(stage = %spec.stage, command = %spec.command_line(), "dry run, not executing");
      return Ok(());
    }

    let stream = verbosity
      .is_verbose()
      .then_some(self.config.output_channel_capacity);

    stage::execute(&self.runner, self.reporter.as_ref(), spec, stream)
      .await
      .map_err(|source| BuildError::Stage {
        stage: spec.stage,
        source,
      })?;

    Ok(())
  }
}
