//! Host-bound configuration files.
//!
//! A [`ConfFile`] is one template resolved against one host's data: its name
//! is rendered once, and from then on it can be generated into a local
//! directory, pulled from the host, diffed, and pushed back.

pub mod diff;
pub mod set;

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

pub use diff::{ConfFileDiff, DiffKind};
pub use set::{ConfFiles, Discovery};

use crate::data::DataError;
use crate::mime::{FileKind, MimeClassifier};
use crate::remote::{Remote, RemoteContext, RemoteError, remote_parent};
use crate::template::{Template, TemplateError};
use crate::util::fs::{copy_stat, copy_with_stat, ensure_parent, remove_file_if_exists};

#[derive(Debug, Error)]
pub enum ConfFileError {
  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error(transparent)]
  Data(#[from] DataError),

  #[error("template '{template}' renders to invalid file name '{name}': {reason}")]
  InvalidName {
    template: String,
    name: String,
    reason: &'static str,
  },

  #[error("I/O error on {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("cannot push {name}: no generated copy")]
  MissingGenerated { name: String },

  #[error(transparent)]
  Remote(#[from] RemoteError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ConfFileError + '_ {
  move |source| ConfFileError::Io {
    path: path.to_path_buf(),
    source,
  }
}

/// One configuration file for one host.
#[derive(Debug, Clone)]
pub struct ConfFile {
  pub template: Template,
  /// Rendered relative name, e.g. `etc/nginx/nginx.conf`.
  pub name: String,
  /// Absolute path on the host.
  pub remote_path: String,
  pub kind: FileKind,
  data: Arc<Value>,
}

impl ConfFile {
  /// Bind `template` to `data`, rendering its name.
  pub fn new(template: Template, data: Arc<Value>, mime: &MimeClassifier) -> Result<Self, ConfFileError> {
    let name = template.render_name(&data)?;
    validate_name(&name).map_err(|reason| ConfFileError::InvalidName {
      template: template.name.clone(),
      name: name.clone(),
      reason,
    })?;

    Ok(Self {
      kind: mime.classify(&name),
      remote_path: format!("/{}", name),
      name,
      template,
      data,
    })
  }

  pub fn data(&self) -> &Value {
    &self.data
  }

  /// Location of this file under a local working directory.
  pub fn local_path(&self, root: &Path) -> PathBuf {
    root.join(&self.name)
  }

  /// Write the generated file under `generated_root`.
  pub fn generate(&self, generated_root: &Path) -> Result<(), ConfFileError> {
    let target = self.local_path(generated_root);
    info!(file = %self.remote_path, "Generating");

    ensure_parent(&target).map_err(io_error(&target))?;
    match self.kind {
      FileKind::Verbatim => copy_with_stat(&self.template.source_path, &target).map_err(io_error(&target)),
      FileKind::Rendered => {
        let mut body = self.template.render(&self.data)?;
        body.push('\n');
        fs::write(&target, body).map_err(io_error(&target))?;
        copy_stat(&self.template.source_path, &target).map_err(io_error(&target))
      }
    }
  }

  /// Replace the local copy under `remotes_root` with the host's current file.
  ///
  /// Returns `false`, leaving no local copy, when the host has no such file.
  pub fn pull(&self, remote: &dyn Remote, ctx: &RemoteContext, remotes_root: &Path) -> Result<bool, ConfFileError> {
    let target = self.local_path(remotes_root);
    info!(file = %self.remote_path, host = %ctx.host, "Pulling");

    ensure_parent(&target).map_err(io_error(&target))?;
    remove_file_if_exists(&target).map_err(io_error(&target))?;

    if !remote.exists(ctx, &self.remote_path)? {
      info!(file = %self.remote_path, host = %ctx.host, "Not found");
      return Ok(false);
    }
    remote.get(ctx, &self.remote_path, &target)?;
    Ok(true)
  }

  /// Compare the local copies. Both must already be materialized by generate and pull.
  pub fn diff(&self, generated_root: &Path, remotes_root: &Path) -> Result<ConfFileDiff, ConfFileError> {
    info!(file = %self.remote_path, "Computing diff");
    let remote_file = self.local_path(remotes_root);
    let generated_file = self.local_path(generated_root);
    ConfFileDiff::compute(&self.remote_path, &remote_file, &generated_file)
  }

  /// Upload the generated copy to the host, creating its directory first.
  pub fn push(&self, remote: &dyn Remote, ctx: &RemoteContext, generated_root: &Path) -> Result<(), ConfFileError> {
    let source = self.local_path(generated_root);
    if !source.is_file() {
      return Err(ConfFileError::MissingGenerated {
        name: self.remote_path.clone(),
      });
    }

    info!(file = %self.remote_path, host = %ctx.host, "Pushing");
    if let Some(dir) = remote_parent(&self.remote_path) {
      remote.make_dirs(ctx, dir)?;
    }
    remote.put(ctx, &source, &self.remote_path, true)?;
    Ok(())
  }
}

/// A rendered name must be one relative path that stays inside its root.
fn validate_name(name: &str) -> Result<(), &'static str> {
  if name.trim().is_empty() {
    return Err("name is empty");
  }
  if name.contains('\n') || name.contains('\r') {
    return Err("name spans multiple lines");
  }
  if name.starts_with('/') {
    return Err("name must be relative");
  }
  for component in Path::new(name).components() {
    match component {
      Component::Normal(_) | Component::CurDir => {}
      Component::ParentDir => return Err("name may not contain '..'"),
      Component::RootDir | Component::Prefix(_) => return Err("name must be relative"),
    }
  }
  Ok(())
}
