use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{Remote, RemoteContext, RemoteError};

/// Remote backed by local directories: `<root>/<host>/` is the host's `/`.
#[derive(Debug, Clone)]
pub struct LocalRemote {
  root: PathBuf,
}

impl LocalRemote {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Local location of `remote_path` on `host`.
  ///
  /// Only normal components are kept, so nothing escapes the host directory.
  pub fn host_path(&self, host: &str, remote_path: &str) -> PathBuf {
    let mut path = self.root.join(host);
    for component in Path::new(remote_path).components() {
      if let Component::Normal(part) = component {
        path.push(part);
      }
    }
    path
  }
}

fn io_error(ctx: &RemoteContext, path: &Path) -> impl FnOnce(std::io::Error) -> RemoteError {
  let host = ctx.host.clone();
  let path = path.to_path_buf();
  move |source| RemoteError::Io { host, path, source }
}

impl Remote for LocalRemote {
  fn exists(&self, ctx: &RemoteContext, path: &str) -> Result<bool, RemoteError> {
    Ok(self.host_path(&ctx.host, path).exists())
  }

  fn get(&self, ctx: &RemoteContext, remote_path: &str, local_path: &Path) -> Result<(), RemoteError> {
    let source = self.host_path(&ctx.host, remote_path);
    debug!(host = %ctx.host, from = %source.display(), to = %local_path.display(), "copying from local remote");
    fs::copy(&source, local_path).map_err(io_error(ctx, &source))?;
    Ok(())
  }

  fn put(
    &self,
    ctx: &RemoteContext,
    local_path: &Path,
    remote_path: &str,
    mirror_local_mode: bool,
  ) -> Result<(), RemoteError> {
    let target = self.host_path(&ctx.host, remote_path);
    debug!(host = %ctx.host, from = %local_path.display(), to = %target.display(), "copying to local remote");

    // Keep an existing target's mode unless mirroring.
    let previous = fs::metadata(&target).ok().map(|m| m.permissions());
    let contents = fs::read(local_path).map_err(io_error(ctx, local_path))?;
    fs::write(&target, contents).map_err(io_error(ctx, &target))?;

    let permissions = if mirror_local_mode {
      Some(fs::metadata(local_path).map_err(io_error(ctx, local_path))?.permissions())
    } else {
      previous
    };
    if let Some(permissions) = permissions {
      fs::set_permissions(&target, permissions).map_err(io_error(ctx, &target))?;
    }
    Ok(())
  }

  fn run_privileged(&self, ctx: &RemoteContext, _command: &str) -> Result<String, RemoteError> {
    Err(RemoteError::Unsupported {
      host: ctx.host.clone(),
      operation: "running commands",
    })
  }

  fn make_dirs(&self, ctx: &RemoteContext, dir: &str) -> Result<(), RemoteError> {
    let path = self.host_path(&ctx.host, dir);
    fs::create_dir_all(&path).map_err(io_error(ctx, &path))
  }
}
