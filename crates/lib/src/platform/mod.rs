//! Host and target platform abstractions.
//!
//! - [`os`]: operating system and family detection
//! - [`policy`]: per-family build conventions behind [`PlatformPolicy`]
//! - [`access`]: writability and executability checks for the current user
//! - [`target`]: the PHP installation being built for

pub mod access;
pub mod os;
pub mod policy;
pub mod target;

use std::sync::Arc;

pub use access::is_elevated;
pub use os::{Os, OsFamily};
pub use policy::{PlatformPolicy, UnixPolicy, WindowsPolicy, policy_for};
pub use target::{TargetPlatform, TargetPlatformError, TargetPlatformOptions};

/// The default policy for the host this binary runs on.
pub fn current_policy() -> Arc<dyn PlatformPolicy> {
  policy_for(OsFamily::current())
}
