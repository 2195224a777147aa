//! pie-lib: building and installing PHP extensions from source
//!
//! This crate provides the staged pipeline behind the `pie` CLI:
//! - `TargetPlatform`: the PHP installation being built for
//! - `ToolHandle`: an external tool that passed validation
//! - `BuildPipeline`: phpize, configure and make in a source tree
//! - `InstallStage`: `make install`, elevated when the extension directory
//!   requires it
//! - `BinaryArtifact`: the produced library, identified by path and sha256
//!
//! All external commands go through a `ProcessRunner`, and OS differences
//! are confined to a `PlatformPolicy`.

pub mod artifact;
pub mod build;
pub mod config;
pub mod consts;
pub mod install;
pub mod package;
pub mod platform;
pub mod process;
pub mod report;
pub mod resolve;
pub mod source;
pub mod tool;
pub mod util;
pub mod workflow;
