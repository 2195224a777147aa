//! Package and extension identity.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EXTENSION_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("extension name pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid extension name {0:?}: must start with a letter and contain only letters, digits and underscores")]
pub struct InvalidExtensionName(pub String);

/// The name PHP loads an extension by, e.g. `xdebug`. Determines the file
/// name of the built and installed shared library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionName(String);

impl ExtensionName {
  /// Accepts names with or without the `ext-` prefix used in package
  /// requirements.
  pub fn new(name: &str) -> Result<Self, InvalidExtensionName> {
    let bare = name.strip_prefix("ext-").unwrap_or(name);
    if EXTENSION_NAME.is_match(bare) {
      Ok(Self(bare.to_string()))
    } else {
      Err(InvalidExtensionName(name.to_string()))
    }
  }

  pub fn name(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ExtensionName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl TryFrom<String> for ExtensionName {
  type Error = InvalidExtensionName;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(&value)
  }
}

impl From<ExtensionName> for String {
  fn from(value: ExtensionName) -> Self {
    value.0
  }
}

/// How PHP has to load the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionKind {
  /// An ordinary module, loaded with `extension=`.
  #[default]
  PhpModule,
  /// An engine-level module, loaded with `zend_extension=`.
  ZendExtension,
}

impl ExtensionKind {
  /// The php.ini directive that activates an extension of this kind.
  pub fn ini_directive(&self) -> &'static str {
    match self {
      ExtensionKind::PhpModule => "extension",
      ExtensionKind::ZendExtension => "zend_extension",
    }
  }
}

/// What the user asked for: a package name and an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedPackage {
  pub name: String,
  pub version: Option<String>,
}

impl RequestedPackage {
  pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
    Self {
      name: name.into(),
      version,
    }
  }
}

impl fmt::Display for RequestedPackage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{}:{}", self.name, version),
      None => write!(f, "{}", self.name),
    }
  }
}

/// A package the resolver settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
  pub name: String,
  pub version: String,
  pub extension_name: ExtensionName,
  pub extension_kind: ExtensionKind,
}

impl Package {
  pub fn pretty_name_and_version(&self) -> String {
    format!("{}:{}", self.name, self.version)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn valid_extension_names() {
    for name in ["xdebug", "redis", "pdo_sqlsrv", "Ext2"] {
      assert_eq!(ExtensionName::new(name).unwrap().name(), name);
    }
  }

  #[test]
  fn ext_prefix_is_stripped() {
    let name = ExtensionName::new("ext-xdebug").unwrap();
    assert_eq!(name.name(), "xdebug");
  }

  #[test]
  fn invalid_extension_names() {
    for name in ["", "1abc", "foo-bar", "foo.so", "../etc", "ext-"] {
      assert_eq!(
        ExtensionName::new(name),
        Err(InvalidExtensionName(name.to_string())),
        "{name:?} should be rejected"
      );
    }
  }

  #[test]
  fn ini_directive_depends_on_kind() {
    assert_eq!(ExtensionKind::PhpModule.ini_directive(), "extension");
    assert_eq!(ExtensionKind::ZendExtension.ini_directive(), "zend_extension");
  }

  #[test]
  fn requested_package_display() {
    assert_eq!(RequestedPackage::new("xdebug/xdebug", None).to_string(), "xdebug/xdebug");
    assert_eq!(
      RequestedPackage::new("xdebug/xdebug", Some("^3.3".to_string())).to_string(),
      "xdebug/xdebug:^3.3"
    );
  }
}
