//! End-to-end orchestration: resolve, download, build, install.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::artifact::BinaryArtifact;
use crate::build::{BuildError, BuildPipeline};
use crate::config::PipelineConfig;
use crate::install::{InstallError, InstallStage};
use crate::package::{Package, RequestedPackage};
use crate::platform::{PlatformPolicy, TargetPlatform};
use crate::process::{ProcessError, ProcessRunner};
use crate::report::{BuildEvent, Reporter, Verbosity};
use crate::resolve::{DependencyResolver, ResolveError};
use crate::source::{DownloadError, Downloader, SourceTree};
use crate::tool::git::Git;
use crate::tool::{ToolError, ToolHandle, ToolSpec, guess_phpize_path};

/// How far to take a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  Download,
  Build,
  /// Build, then install. Installing never happens without a build first.
  Install,
}

#[derive(Debug, Clone)]
pub struct WorkflowRequest {
  pub requested: RequestedPackage,
  pub operation: Operation,
  pub configure_options: Vec<String>,
  pub verbosity: Verbosity,
  /// Explicit `phpize`; guessed from the php binary otherwise.
  pub phpize_path: Option<PathBuf>,
  /// When set, submodules of the source tree are fetched with this git.
  pub git_path: Option<PathBuf>,
}

impl WorkflowRequest {
  pub fn new(requested: RequestedPackage, operation: Operation) -> Self {
    Self {
      requested,
      operation,
      configure_options: Vec::new(),
      verbosity: Verbosity::Normal,
      phpize_path: None,
      git_path: None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
  pub package: Package,
  pub source: SourceTree,
  pub built: Option<BinaryArtifact>,
  pub installed: Option<BinaryArtifact>,
}

impl WorkflowOutcome {
  /// The artifact the operation ended with.
  pub fn final_artifact(&self) -> Option<&BinaryArtifact> {
    self.installed.as_ref().or(self.built.as_ref())
  }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Download(#[from] DownloadError),

  #[error(transparent)]
  Tool(#[from] ToolError),

  #[error("failed to fetch git submodules")]
  Submodules(#[source] ProcessError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Install(#[from] InstallError),
}

/// Wires the collaborators to the build and install stages.
pub struct Workflow<R, V, D> {
  runner: R,
  policy: Arc<dyn PlatformPolicy>,
  config: PipelineConfig,
  reporter: Arc<dyn Reporter>,
  resolver: V,
  downloader: D,
}

impl<R, V, D> Workflow<R, V, D>
where
  R: ProcessRunner,
  V: DependencyResolver,
  D: Downloader,
{
  pub fn new(
    runner: R,
    policy: Arc<dyn PlatformPolicy>,
    config: PipelineConfig,
    reporter: Arc<dyn Reporter>,
    resolver: V,
    downloader: D,
  ) -> Self {
    Self {
      runner,
      policy,
      config,
      reporter,
      resolver,
      downloader,
    }
  }

  pub async fn run(&self, request: &WorkflowRequest, target: &TargetPlatform) -> Result<WorkflowOutcome, WorkflowError> {
    let package = self.resolver.resolve(&request.requested, target)?;
    info!(package = %package.pretty_name_and_version(), extension = %package.extension_name, "resolved package");
    self.reporter.report(BuildEvent::PackageFound {
      package: package.pretty_name_and_version(),
    });

    let source = self.downloader.download(&package)?;
    self.reporter.report(BuildEvent::SourceReady {
      path: source.path.clone(),
    });

    let mut outcome = WorkflowOutcome {
      package,
      source,
      built: None,
      installed: None,
    };

    if request.operation == Operation::Download {
      return Ok(outcome);
    }

    if let Some(git_path) = &request.git_path {
      let git = Git::validate(git_path, self.policy.as_ref(), &self.runner).await?;
      if !target.dry_run {
        git
          .fetch_submodules(&outcome.source.path, &self.runner)
          .await
          .map_err(WorkflowError::Submodules)?;
      }
    }

    let phpize_path = request
      .phpize_path
      .clone()
      .unwrap_or_else(|| guess_phpize_path(&target.php_binary));
    let phpize = ToolHandle::validate(&phpize_path, &ToolSpec::phpize(), self.policy.as_ref(), &self.runner).await?;

    let pipeline = BuildPipeline::new(
      &self.runner,
      Arc::clone(&self.policy),
      self.config.clone(),
      Arc::clone(&self.reporter),
    );
    let built = pipeline
      .build(
        &outcome.source,
        target,
        &request.configure_options,
        request.verbosity,
        &phpize,
      )
      .await?;
    outcome.built = Some(built);

    if request.operation == Operation::Install {
      let stage = InstallStage::new(
        &self.runner,
        Arc::clone(&self.policy),
        self.config.clone(),
        Arc::clone(&self.reporter),
      );
      let installed = stage.install(&outcome.source, target, request.verbosity).await?;
      outcome.installed = Some(installed);
    }

    Ok(outcome)
  }
}
