//! Access to the true state of remote hosts.
//!
//! Every call carries an explicit [`RemoteContext`] naming the host it acts
//! on; implementations hold no per-host state between calls.
//!
//! - [`SshRemote`]: the real thing, via `ssh` and `scp` subprocesses
//! - [`LocalRemote`]: a directory per host, for staging trees and tests

pub mod local;
pub mod ssh;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use local::LocalRemote;
pub use ssh::{SshConfig, SshRemote};

use crate::resolve::HostAndRole;

/// Which host (and on whose behalf) a remote operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteContext {
  pub environment: String,
  pub host: String,
  pub role: String,
}

impl From<&HostAndRole> for RemoteContext {
  fn from(unit: &HostAndRole) -> Self {
    Self {
      environment: unit.environment.clone(),
      host: unit.host.clone(),
      role: unit.role.clone(),
    }
  }
}

impl fmt::Display for RemoteContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}/{})", self.host, self.environment, self.role)
  }
}

#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("[{host}] command failed: {command}: {message}")]
  Command {
    host: String,
    command: String,
    message: String,
  },

  #[error("[{host}] failed to transfer {path}: {message}")]
  Transfer {
    host: String,
    path: String,
    message: String,
  },

  #[error("[{host}] local I/O error on {}: {source}", path.display())]
  Io {
    host: String,
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("[{host}] {operation} is not supported by this remote")]
  Unsupported { host: String, operation: &'static str },
}

impl RemoteError {
  /// Host the failed operation targeted.
  pub fn host(&self) -> &str {
    match self {
      RemoteError::Command { host, .. }
      | RemoteError::Transfer { host, .. }
      | RemoteError::Io { host, .. }
      | RemoteError::Unsupported { host, .. } => host,
    }
  }
}

/// Remote file access and privileged execution.
///
/// Remote paths are absolute `/`-separated strings. All calls block.
pub trait Remote {
  /// Whether `path` exists on the host.
  fn exists(&self, ctx: &RemoteContext, path: &str) -> Result<bool, RemoteError>;

  /// Download `remote_path` into `local_path`.
  fn get(&self, ctx: &RemoteContext, remote_path: &str, local_path: &Path) -> Result<(), RemoteError>;

  /// Upload `local_path` to `remote_path` with superuser rights.
  ///
  /// With `mirror_local_mode` the remote file takes the local file's permissions.
  fn put(
    &self,
    ctx: &RemoteContext,
    local_path: &Path,
    remote_path: &str,
    mirror_local_mode: bool,
  ) -> Result<(), RemoteError>;

  /// Run a shell command as the superuser, returning its standard output.
  fn run_privileged(&self, ctx: &RemoteContext, command: &str) -> Result<String, RemoteError>;

  /// Create `dir` and its parents.
  fn make_dirs(&self, ctx: &RemoteContext, dir: &str) -> Result<(), RemoteError> {
    self
      .run_privileged(ctx, &format!("mkdir -p {}", shell_quote(dir)))
      .map(|_| ())
  }
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
  if !s.is_empty()
    && s
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | '@' | '='))
  {
    return s.to_string();
  }
  format!("'{}'", s.replace('\'', r"'\''"))
}

/// Parent directory of a remote path, or `None` for the root.
pub fn remote_parent(path: &str) -> Option<&str> {
  let trimmed = path.trim_end_matches('/');
  match trimmed.rfind('/') {
    Some(0) => Some("/"),
    Some(i) => Some(&trimmed[..i]),
    None => None,
  }
}
