//! Git operations on extracted source trees.

use std::path::Path;

use tracing::info;

use super::{ToolError, ToolHandle, ToolSpec};
use crate::platform::PlatformPolicy;
use crate::process::{ProcessError, ProcessRequest, ProcessRunner};

/// A validated git binary.
#[derive(Debug, Clone)]
pub struct Git {
  handle: ToolHandle,
}

impl Git {
  pub async fn validate<R: ProcessRunner>(
    path: impl AsRef<Path>,
    policy: &dyn PlatformPolicy,
    runner: &R,
  ) -> Result<Self, ToolError> {
    let handle = ToolHandle::validate(path, &ToolSpec::git(), policy, runner).await?;
    Ok(Self { handle })
  }

  pub fn handle(&self) -> &ToolHandle {
    &self.handle
  }

  /// Initialise and update every submodule of `source` to its remote head.
  pub async fn fetch_submodules<R: ProcessRunner>(&self, source: &Path, runner: &R) -> Result<(), ProcessError> {
    let request = ProcessRequest::new([
      self.handle.path.display().to_string(),
      "submodule".to_string(),
      "update".to_string(),
      "--init".to_string(),
      "--force".to_string(),
      "--remote".to_string(),
    ])
    .cwd(source);

    info!(source = %source.display(), "fetching git submodules");
    runner.run(request).await?;
    Ok(())
  }
}
