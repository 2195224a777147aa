//! Implementation of `pie download`, `pie build` and `pie install`.
//!
//! The source tree is a locally extracted extension; the package named on
//! the command line is resolved to it directly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Args};
use serde::Serialize;
use tracing::debug;

use pie_lib::artifact::BinaryArtifact;
use pie_lib::config::PipelineConfig;
use pie_lib::package::{ExtensionKind, ExtensionName, Package, RequestedPackage};
use pie_lib::platform::{TargetPlatform, TargetPlatformOptions};
use pie_lib::process::TokioProcessRunner;
use pie_lib::report::Verbosity;
use pie_lib::resolve::StaticResolver;
use pie_lib::source::LocalSourceDownloader;
use pie_lib::workflow::{Operation, Workflow, WorkflowOutcome, WorkflowRequest};

use crate::output::{OutputFormat, print_json, print_stat};
use crate::reporter::ConsoleReporter;

#[derive(Args, Debug)]
pub struct PackageArgs {
  /// Directory holding the extracted extension sources
  #[arg(long, default_value = ".")]
  source: PathBuf,

  /// Name PHP loads the extension by (e.g. xdebug or ext-xdebug)
  #[arg(long)]
  extension: String,

  /// The extension is a Zend extension (loaded with zend_extension=)
  #[arg(long)]
  zend: bool,

  /// Package name to report (defaults to local/<extension>)
  #[arg(long)]
  package: Option<String>,

  /// Version of the package sources
  #[arg(long = "version", value_name = "VERSION")]
  package_version: Option<String>,

  /// The php binary to build for (defaults to php on PATH)
  #[arg(long)]
  with_php_path: Option<PathBuf>,

  /// php-config of the target PHP (defaults to the one next to php)
  #[arg(long)]
  with_php_config: Option<PathBuf>,

  /// phpize of the target PHP (defaults to the one next to php)
  #[arg(long)]
  with_phpize_path: Option<PathBuf>,

  /// Fetch git submodules of the source tree with this git before building
  #[arg(long)]
  with_git_path: Option<PathBuf>,

  /// Extension directory to install into (defaults to PHP's extension_dir)
  #[arg(long)]
  extension_dir: Option<PathBuf>,

  /// Number of parallel make jobs (defaults to the number of CPUs)
  #[arg(short = 'j', long)]
  make_parallel_jobs: Option<usize>,

  /// Show the commands that would run without running them
  #[arg(long)]
  dry_run: bool,

  /// Increase verbosity (-v shows commands and build output, -vv also install output)
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  output: OutputFormat,

  /// Options passed to ./configure
  #[arg(last = true)]
  configure_options: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PackageOutput<'a> {
  package: String,
  extension: &'a str,
  source: String,
  dry_run: bool,
  built: Option<&'a BinaryArtifact>,
  installed: Option<&'a BinaryArtifact>,
}

pub fn cmd_package(operation: Operation, args: PackageArgs) -> Result<()> {
  let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;
  let extension_name = ExtensionName::new(&args.extension)?;
  let extension_kind = if args.zend {
    ExtensionKind::ZendExtension
  } else {
    ExtensionKind::PhpModule
  };

  let source = dunce::canonicalize(&args.source)
    .with_context(|| format!("Source directory {} not found", args.source.display()))?;

  let package_name = args
    .package
    .clone()
    .unwrap_or_else(|| format!("local/{}", extension_name));
  let package = Package {
    name: package_name.clone(),
    version: args.package_version.clone().unwrap_or_else(|| "dev-local".to_string()),
    extension_name,
    extension_kind,
  };

  let verbosity = Verbosity::from_count(args.verbose);
  let runner = TokioProcessRunner::new();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  let options = TargetPlatformOptions {
    php_binary: args.with_php_path,
    php_config: args.with_php_config,
    extension_dir: args.extension_dir,
    make_parallel_jobs: args.make_parallel_jobs,
    dry_run: args.dry_run,
  };
  let target = rt
    .block_on(TargetPlatform::detect(options, &runner))
    .context("Failed to detect the target PHP installation")?;

  let workflow = Workflow::new(
    &runner,
    target.policy(),
    config,
    Arc::new(ConsoleReporter::new(args.output.progress_sink())),
    StaticResolver::new(package),
    LocalSourceDownloader::new(&source),
  );

  let request = WorkflowRequest {
    requested: RequestedPackage::new(package_name, args.package_version),
    operation,
    configure_options: args.configure_options,
    verbosity,
    phpize_path: args.with_phpize_path,
    git_path: args.with_git_path,
  };
  debug!(?request, "running workflow");

  // Dropping the workflow on Ctrl-C kills whatever stage is still running.
  let outcome = rt.block_on(async {
    tokio::select! {
      outcome = workflow.run(&request, &target) => {
        outcome.with_context(|| format!("Failed to {} {}", verb(operation), request.requested))
      }
      _ = tokio::signal::ctrl_c() => {
        Err(anyhow!("Interrupted while trying to {} {}", verb(operation), request.requested))
      }
    }
  })?;

  print_outcome(&outcome, &target, args.output)
}

fn verb(operation: Operation) -> &'static str {
  match operation {
    Operation::Download => "download",
    Operation::Build => "build",
    Operation::Install => "install",
  }
}

fn print_outcome(outcome: &WorkflowOutcome, target: &TargetPlatform, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    return print_json(&PackageOutput {
      package: outcome.package.pretty_name_and_version(),
      extension: outcome.package.extension_name.name(),
      source: outcome.source.path.display().to_string(),
      dry_run: target.dry_run,
      built: outcome.built.as_ref(),
      installed: outcome.installed.as_ref(),
    });
  }

  println!();
  print_stat("Package", &outcome.package.pretty_name_and_version());
  print_stat("Source", &outcome.source.path.display().to_string());
  if let Some(artifact) = outcome.final_artifact() {
    print_stat("Artifact", &artifact.path.display().to_string());
    print_stat("Checksum", artifact.checksum.as_str());
  }
  if target.dry_run {
    print_stat("Mode", "dry run (nothing was executed)");
  }

  Ok(())
}
