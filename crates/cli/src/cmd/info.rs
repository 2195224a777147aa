//! Implementation of `pie info`.

use anyhow::{Context, Result};
use serde::Serialize;

use pie_lib::config::PipelineConfig;
use pie_lib::consts::APP_NAME;
use pie_lib::platform::{Os, current_policy, is_elevated};

use crate::output::{OutputFormat, Sink, Status, print_json, print_stat, print_status};

#[derive(Debug, Serialize)]
struct InfoOutput {
  version: &'static str,
  os: &'static str,
  family: String,
  shared_library_extension: String,
  requires_executable_bit: bool,
  elevation_command: Option<Vec<String>>,
  elevated: bool,
  timeouts_secs: Timeouts,
}

#[derive(Debug, Serialize)]
struct Timeouts {
  bootstrap: Option<u64>,
  configure: Option<u64>,
  compile: Option<u64>,
  install: Option<u64>,
}

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let policy = current_policy();
  let config = PipelineConfig::from_env().context("Invalid pipeline configuration")?;

  let info = InfoOutput {
    version: env!("CARGO_PKG_VERSION"),
    os: Os::current().map_or(std::env::consts::OS, |os| os.as_str()),
    family: policy.family().to_string(),
    shared_library_extension: policy.shared_library_extension().to_string(),
    requires_executable_bit: policy.requires_executable_bit(),
    elevation_command: policy.elevation_command_prefix().map(<[String]>::to_vec),
    elevated: is_elevated(),
    timeouts_secs: Timeouts {
      bootstrap: config.bootstrap_timeout.map(|d| d.as_secs()),
      configure: config.configure_timeout.map(|d| d.as_secs()),
      compile: config.compile_timeout.map(|d| d.as_secs()),
      install: config.install_timeout.map(|d| d.as_secs()),
    },
  };

  if output.is_json() {
    return print_json(&info);
  }

  print_status(Sink::Stdout, Status::Note, &format!("{} v{}", APP_NAME, info.version));
  println!();
  print_stat("OS", info.os);
  print_stat("Family", &info.family);
  print_stat("Shared library", &format!(".{}", info.shared_library_extension));
  print_stat("Executable bit", if info.requires_executable_bit { "required" } else { "ignored" });
  print_stat(
    "Elevation",
    &info
      .elevation_command
      .as_ref()
      .map(|c| c.join(" "))
      .unwrap_or_else(|| "unavailable".to_string()),
  );
  print_stat("Elevated", if info.elevated { "yes" } else { "no" });
  println!();
  for (stage, timeout) in [
    ("bootstrap", info.timeouts_secs.bootstrap),
    ("configure", info.timeouts_secs.configure),
    ("compile", info.timeouts_secs.compile),
    ("install", info.timeouts_secs.install),
  ] {
    let value = timeout.map(|s| format!("{s}s")).unwrap_or_else(|| "none".to_string());
    print_stat(&format!("Timeout ({stage})"), &value);
  }

  Ok(())
}
