//! Runtime configuration for the build and install stages.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::consts::ENV_PREFIX;
use crate::util::hash::Checksum;

const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONFIGURE_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_OUTPUT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("{var} must be a whole number of seconds, got {value:?}")]
  InvalidTimeout { var: String, value: String },
}

/// Timeouts and sentinels for [`BuildPipeline`](crate::build::BuildPipeline)
/// and [`InstallStage`](crate::install::InstallStage).
///
/// A timeout of `None` lets the stage run unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
  pub bootstrap_timeout: Option<Duration>,
  pub configure_timeout: Option<Duration>,
  pub compile_timeout: Option<Duration>,
  pub install_timeout: Option<Duration>,
  /// Chunks buffered between a running command and the reporter.
  pub output_channel_capacity: usize,
  /// Checksum given to artifacts a dry run pretends to produce.
  pub dry_run_checksum: Checksum,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      bootstrap_timeout: Some(DEFAULT_BOOTSTRAP_TIMEOUT),
      configure_timeout: Some(DEFAULT_CONFIGURE_TIMEOUT),
      compile_timeout: None,
      install_timeout: Some(DEFAULT_INSTALL_TIMEOUT),
      output_channel_capacity: DEFAULT_OUTPUT_CHANNEL_CAPACITY,
      dry_run_checksum: Checksum::empty(),
    }
  }
}

impl PipelineConfig {
  /// Defaults, with timeouts overridden by `PIE_<STAGE>_TIMEOUT_SECS`.
  /// `0` disables the timeout for that stage.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();
    override_timeout(&mut config.bootstrap_timeout, "BOOTSTRAP")?;
    override_timeout(&mut config.configure_timeout, "CONFIGURE")?;
    override_timeout(&mut config.compile_timeout, "COMPILE")?;
    override_timeout(&mut config.install_timeout, "INSTALL")?;
    Ok(config)
  }
}

fn override_timeout(slot: &mut Option<Duration>, stage: &str) -> Result<(), ConfigError> {
  let var = format!("{ENV_PREFIX}{stage}_TIMEOUT_SECS");
  let Ok(value) = std::env::var(&var) else {
    return Ok(());
  };

  let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidTimeout {
    var: var.clone(),
    value: value.clone(),
  })?;

  *slot = (secs > 0).then(|| Duration::from_secs(secs));
  debug!(var = %var, timeout = ?slot, "timeout overridden from environment");
  Ok(())
}
