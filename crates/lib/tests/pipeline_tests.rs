//! Build pipeline tests against real child processes.
//!
//! phpize and configure are stand-in shell scripts, so these only run on
//! Unix and never reach `make`.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pie_lib::build::{BuildError, BuildPipeline, Stage};
use pie_lib::config::PipelineConfig;
use pie_lib::package::{ExtensionKind, ExtensionName};
use pie_lib::platform::{OsFamily, TargetPlatform, UnixPolicy};
use pie_lib::process::{ProcessError, TokioProcessRunner};
use pie_lib::report::{TracingReporter, Verbosity};
use pie_lib::source::SourceTree;
use pie_lib::tool::{ToolHandle, ToolSpec};
use tempfile::{TempDir, tempdir};

fn script(path: &Path, body: &str) {
  std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

struct Project {
  temp: TempDir,
  source: SourceTree,
  target: TargetPlatform,
}

impl Project {
  fn new(dry_run: bool) -> Self {
    let temp = tempdir().unwrap();
    let src = temp.path().join("foo");
    std::fs::create_dir_all(&src).unwrap();

    let source = SourceTree::new(&src, ExtensionName::new("foo").unwrap(), ExtensionKind::PhpModule);
    let target = TargetPlatform {
      php_binary: PathBuf::from("/usr/bin/php"),
      php_config: None,
      extension_dir: temp.path().join("ext"),
      make_parallel_jobs: 1,
      dry_run,
      os_family: OsFamily::Unix,
    };

    Self { temp, source, target }
  }

  /// A phpize that answers the version probe and otherwise runs `body`.
  async fn phpize(&self, body: &str) -> ToolHandle {
    let path = self.temp.path().join("phpize");
    script(
      &path,
      &format!("if [ \"$1\" = \"--version\" ]; then echo 'PHP Api Version:         20230831'; exit 0; fi\n{body}"),
    );
    ToolHandle::validate(&path, &ToolSpec::phpize(), &UnixPolicy::default(), &TokioProcessRunner::new())
      .await
      .unwrap()
  }

  fn pipeline(&self, config: PipelineConfig) -> BuildPipeline<TokioProcessRunner> {
    BuildPipeline::new(
      TokioProcessRunner::new(),
      Arc::new(UnixPolicy::default()),
      config,
      Arc::new(TracingReporter),
    )
  }
}

#[tokio::test]
async fn bootstrap_timeout_kills_the_process() {
  let project = Project::new(false);
  let phpize = project.phpize("sleep 5; touch late_marker").await;
  let config = PipelineConfig {
    bootstrap_timeout: Some(Duration::from_secs(1)),
    ..PipelineConfig::default()
  };

  let started = Instant::now();
  let err = project
    .pipeline(config)
    .build(&project.source, &project.target, &[], Verbosity::Normal, &phpize)
    .await
    .unwrap_err();

  assert!(started.elapsed() < Duration::from_secs(4));
  match err {
    BuildError::Stage {
      stage: Stage::Bootstrap,
      source: ProcessError::Timeout { timeout, .. },
    } => assert_eq!(timeout, Duration::from_secs(1)),
    other => panic!("expected bootstrap timeout, got {other:?}"),
  }

  tokio::time::sleep(Duration::from_millis(200)).await;
  assert!(!project.source.path.join("late_marker").exists());
}

#[tokio::test]
async fn configure_failure_carries_its_output() {
  let project = Project::new(false);
  let configure = project.source.path.join("configure");
  let phpize = project
    .phpize(&format!(
      "printf '#!/bin/sh\\necho \"configure: error: Cannot find php-config\" >&2\\nexit 1\\n' > {0}\nchmod +x {0}",
      configure.display()
    ))
    .await;

  let err = project
    .pipeline(PipelineConfig::default())
    .build(
      &project.source,
      &project.target,
      &["--enable-foo".to_string()],
      Verbosity::Normal,
      &phpize,
    )
    .await
    .unwrap_err();

  assert!(configure.exists(), "phpize should have generated configure");
  assert!(matches!(err, BuildError::Stage { stage: Stage::Configure, .. }));
  assert!(err.process_error().is_some_and(|e| e.to_string().contains("Cannot find php-config")));
}

#[tokio::test]
async fn dry_run_leaves_the_tree_untouched() {
  let project = Project::new(true);
  let phpize = project.phpize("touch phpize_ran").await;

  let artifact = project
    .pipeline(PipelineConfig::default())
    .build(&project.source, &project.target, &[], Verbosity::Verbose, &phpize)
    .await
    .unwrap();

  assert!(artifact.checksum.is_empty_content());
  assert_eq!(artifact.path, project.source.path.join("modules/foo.so"));
  assert_eq!(std::fs::read_dir(&project.source.path).unwrap().count(), 0);
}
