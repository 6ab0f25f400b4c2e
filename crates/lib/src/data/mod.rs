//! Layered configuration data.
//!
//! Data for one (component, host, role, environment) is assembled from five
//! scopes, lowest precedence first:
//!
//! ```text
//! default → component → role → environment → host
//! ```
//!
//! Each scope contributes a data document (see [`module`]) plus the output of
//! any registered [`hooks::Hook`]s, and the scopes are deep-merged in order
//! so that host data wins over everything else.

pub mod hooks;
pub mod loader;
pub mod merge;
pub mod module;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub use hooks::{Hook, HookRegistry};
pub use loader::DataLoader;
pub use merge::{deep_merge, merge};

/// One of the data precedence tiers, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
  Default,
  Component,
  Role,
  Environment,
  Host,
}

impl Scope {
  /// All scopes, lowest precedence first.
  pub const ALL: [Scope; 5] = [
    Scope::Default,
    Scope::Component,
    Scope::Role,
    Scope::Environment,
    Scope::Host,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Scope::Default => "default",
      Scope::Component => "component",
      Scope::Role => "role",
      Scope::Environment => "environment",
      Scope::Host => "host",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Scope {
  type Err = DataError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Scope::ALL
      .into_iter()
      .find(|scope| scope.as_str() == s)
      .ok_or_else(|| DataError::InvalidConfiguration(format!("invalid scope: {}", s)))
  }
}

/// The component being configured and where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentContext {
  pub environment: String,
  pub host: String,
  pub role: String,
  /// Component name.
  pub component: String,
}

#[derive(Debug, Error)]
pub enum DataError {
  /// A data document exists but could not be rendered or evaluated.
  #[error("failed to load data module '{name}' from {}: {message}", path.display())]
  ModuleLoad {
    name: String,
    path: PathBuf,
    message: String,
  },

  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),
}
