//! Implementation of `pie check-tool`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use pie_lib::platform::current_policy;
use pie_lib::process::TokioProcessRunner;
use pie_lib::tool::{ToolHandle, ToolSpec};

use crate::output::{OutputFormat, Sink, Status, print_json, print_status};

#[derive(Debug, Serialize)]
struct CheckToolOutput {
  name: String,
  path: String,
  version: String,
}

/// Validate `path` as the tool called `name`.
///
/// `phpize` and `git` use their known version probes; any other name is
/// expected to answer `--version` with `<name> version X.Y.Z`.
pub fn cmd_check_tool(path: &Path, name: &str, output: OutputFormat) -> Result<()> {
  let spec = match name {
    "git" => ToolSpec::git(),
    "phpize" => ToolSpec::phpize(),
    other => ToolSpec::named(other).with_context(|| format!("Invalid tool name {other}"))?,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let policy = current_policy();
  let handle = rt
    .block_on(ToolHandle::validate(path, &spec, policy.as_ref(), &TokioProcessRunner::new()))
    .context("Tool validation failed")?;

  if output.is_json() {
    return print_json(&CheckToolOutput {
      name: handle.name,
      path: handle.path.display().to_string(),
      version: handle.version,
    });
  }

  print_status(
    Sink::Stdout,
    Status::Done,
    &format!("{} is a usable {}: {}", handle.path.display(), handle.name, handle.version),
  );
  Ok(())
}
