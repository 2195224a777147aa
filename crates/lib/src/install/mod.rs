//! Installing a built extension into PHP's extension directory.
//!
//! `make install` runs in the source tree, elevated when the extension
//! directory (or an already installed copy) is not writable by the current
//! user. The installed file is verified and checksummed afterwards.

mod privilege;

pub use privilege::PrivilegeProbe;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::BinaryArtifact;
use crate::build::{BuildStageSpec, Stage, install_command, stage};
use crate::config::PipelineConfig;
use crate::platform::{PlatformPolicy, TargetPlatform};
use crate::process::{ProcessError, ProcessRunner};
use crate::report::{BuildEvent, Reporter, Verbosity};
use crate::source::SourceTree;
use crate::util::hash::HashError;

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("cannot write to {}, and this platform has no way to elevate privileges", .directory.display())]
  ElevationUnavailable { directory: PathBuf },

  #[error("install stage failed")]
  Stage(#[source] ProcessError),

  #[error("install completed but the extension was not found at {}", .path.display())]
  InstallationFailed { path: PathBuf },

  #[error("failed to checksum the installed extension")]
  Checksum(#[from] HashError),
}

/// Runs `make install` for a built source tree.
pub struct InstallStage<R> {
  runner: R,
  policy: Arc<dyn PlatformPolicy>,
  config: PipelineConfig,
  reporter: Arc<dyn Reporter>,
}

impl<R: ProcessRunner> InstallStage<R> {
  pub fn new(runner: R, policy: Arc<dyn PlatformPolicy>, config: PipelineConfig, reporter: Arc<dyn Reporter>) -> Self {
    Self {
      runner,
      policy,
      config,
      reporter,
    }
  }

  /// Install the extension built in `source` into `target`'s extension
  /// directory. The source tree must already have been built.
  pub async fn install(
    &self,
    source: &SourceTree,
    target: &TargetPlatform,
    verbosity: Verbosity,
  ) -> Result<BinaryArtifact, InstallError> {
    let policy = self.policy.as_ref();
    let installed = source.installed_artifact_path(&target.extension_dir, policy);

    let probe = PrivilegeProbe::inspect(&target.extension_dir, &installed);
    debug!(?probe, path = %installed.display(), "checked install permissions");

    let elevation = if probe.requires_elevation() {
      let prefix = policy
        .elevation_command_prefix()
        .ok_or_else(|| InstallError::ElevationUnavailable {
          directory: target.extension_dir.clone(),
        })?;
      warn!(directory = %target.extension_dir.display(), via = ?prefix, "elevating privileges for install");
      self.reporter.report(BuildEvent::Elevating {
        directory: target.extension_dir.clone(),
        via: prefix.first().cloned().unwrap_or_default(),
      });
      Some(prefix)
    } else {
      None
    };

    let spec = BuildStageSpec::new(
      Stage::Install,
      install_command(elevation),
      &source.path,
      self.config.install_timeout,
    );

    if verbosity.is_verbose() {
      self.reporter.report(BuildEvent::Command {
        stage: spec.stage,
        command: spec.command_line(),
      });
    }

    let artifact = if target.dry_run {
      debug!(command = %spec.command_line(), "dry run, not executing");
      BinaryArtifact::simulated(installed, self.config.dry_run_checksum.clone())
    } else {
      let output = stage::execute(&self.runner, self.reporter.as_ref(), &spec, None)
        .await
        .map_err(InstallError::Stage)?;

      if verbosity.is_very_verbose() && !output.is_empty() {
        self.reporter.report(BuildEvent::InstallOutput(output));
      }

      if !installed.is_file() {
        return Err(InstallError::InstallationFailed { path: installed });
      }
      BinaryArtifact::from_file(installed)?
    };

    info!(path = %artifact.path.display(), checksum = %artifact.checksum, "install complete");
    self.reporter.report(BuildEvent::InstallComplete {
      path: artifact.path.clone(),
    });
    self.reporter.report(BuildEvent::ActivationHint {
      directive: source.extension_kind.ini_directive(),
      extension: source.extension_name.to_string(),
    });

    Ok(artifact)
  }
}
