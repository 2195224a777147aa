//! The dependency resolution boundary.
//!
//! Choosing a package version for a PHP installation is done by an external
//! resolver; the pipeline only consumes its answer.

use thiserror::Error;

use crate::package::{Package, RequestedPackage};
use crate::platform::TargetPlatform;

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("unable to find an installable package {requested} for this PHP")]
  NotFound { requested: String },
}

pub trait DependencyResolver {
  fn resolve(&self, requested: &RequestedPackage, target: &TargetPlatform) -> Result<Package, ResolveError>;
}

/// Resolves exactly one known package; anything else is not found.
#[derive(Debug, Clone)]
pub struct StaticResolver {
  package: Package,
}

impl StaticResolver {
  pub fn new(package: Package) -> Self {
    Self { package }
  }
}

impl DependencyResolver for StaticResolver {
  fn resolve(&self, requested: &RequestedPackage, _target: &TargetPlatform) -> Result<Package, ResolveError> {
    let name_matches = requested.name == self.package.name;
    let version_matches = requested
      .version
      .as_deref()
      .is_none_or(|v| v == "*" || v == self.package.version);

    if name_matches && version_matches {
      Ok(self.package.clone())
    } else {
      Err(ResolveError::NotFound {
        requested: requested.to_string(),
      })
    }
  }
}
