mod cmd;
mod output;
mod reporter;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pie_lib::workflow::Operation;
use tracing_subscriber::EnvFilter;

use crate::cmd::PackageArgs;
use crate::output::{OutputFormat, print_error};

/// pie - build and install PHP extensions from source
#[derive(Parser)]
#[command(name = "pie")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a package and prepare its sources without building
  Download(PackageArgs),

  /// Build an extension with phpize, configure and make
  Build(PackageArgs),

  /// Build an extension and install it into PHP's extension directory
  Install(PackageArgs),

  /// Show platform conventions and configured timeouts
  Info {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Validate an external tool by path
  CheckTool {
    /// Path to the tool binary
    path: PathBuf,

    /// Tool name; git and phpize have dedicated version probes
    #[arg(long, default_value = "git")]
    name: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Download(args) => cmd::cmd_package(Operation::Download, args),
    Commands::Build(args) => cmd::cmd_package(Operation::Build, args),
    Commands::Install(args) => cmd::cmd_package(Operation::Install, args),
    Commands::Info { output } => cmd::cmd_info(output),
    Commands::CheckTool { path, name, output } => cmd::cmd_check_tool(&path, &name, output),
  };

  if let Err(err) = result {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}
