//! Configuration file templates.
//!
//! Templates live on disk, one directory per component:
//!
//! ```text
//! {templates_dir}/
//! └── <component>/
//!     └── etc/nginx/nginx.conf        # template "etc/nginx/nginx.conf"
//! ```
//!
//! A template's identifier is its path relative to the component directory.
//! The identifier itself may contain placeholders, so one template can
//! produce a host-specific file name.

pub mod filter;
pub mod render;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub use filter::TemplateFilter;
use render::{RenderError, RenderMode};

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template '{name}' not found for component '{component}'")]
  NotFound { component: String, name: String },

  #[error("failed to list templates in {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read template {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to render template '{name}': {source}")]
  Render {
    name: String,
    #[source]
    source: RenderError,
  },
}

/// A single template on disk, owned by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  pub component: String,
  /// Identifier relative to the component directory, `/`-separated.
  pub name: String,
  /// Where the template body lives.
  pub source_path: PathBuf,
}

impl Template {
  /// Render the template's identifier to obtain a literal file name.
  pub fn render_name(&self, data: &Value) -> Result<String, TemplateError> {
    render::render(&self.name, data, RenderMode::Strict).map_err(|source| TemplateError::Render {
      name: self.name.clone(),
      source,
    })
  }

  /// Render the template body against `data`.
  pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
    let body = fs::read_to_string(&self.source_path).map_err(|source| TemplateError::Read {
      path: self.source_path.clone(),
      source,
    })?;
    render::render(&body, data, RenderMode::Strict).map_err(|source| TemplateError::Render {
      name: self.name.clone(),
      source,
    })
  }
}

/// Source of templates for components.
pub trait TemplateSource {
  /// List template identifiers for `component`, in discovery order, that `filter` accepts.
  fn list_templates(&self, component: &str, filter: &dyn Fn(&str) -> bool) -> Result<Vec<String>, TemplateError>;

  /// Fetch one template by identifier.
  fn get_template(&self, component: &str, name: &str) -> Result<Template, TemplateError>;
}

/// Templates loaded from one or more directories.
///
/// When several directories provide the same identifier, the first wins.
#[derive(Debug, Clone)]
pub struct FileSystemTemplates {
  dirs: Vec<PathBuf>,
}

impl FileSystemTemplates {
  pub fn new(dirs: Vec<PathBuf>) -> Self {
    Self { dirs }
  }
}

impl TemplateSource for FileSystemTemplates {
  fn list_templates(&self, component: &str, filter: &dyn Fn(&str) -> bool) -> Result<Vec<String>, TemplateError> {
    let mut names = BTreeSet::new();

    for dir in &self.dirs {
      let root = dir.join(component);
      if !root.is_dir() {
        debug!(path = %root.display(), "no templates directory");
        continue;
      }

      for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|source| TemplateError::Walk {
          path: root.clone(),
          source,
        })?;
        if !entry.file_type().is_file() {
          continue;
        }
        if let Some(name) = relative_name(&root, entry.path())
          && filter(name.as_str())
        {
          names.insert(name);
        }
      }
    }

    Ok(names.into_iter().collect())
  }

  fn get_template(&self, component: &str, name: &str) -> Result<Template, TemplateError> {
    self
      .dirs
      .iter()
      .map(|dir| dir.join(component).join(name))
      .find(|path| path.is_file())
      .map(|source_path| Template {
        component: component.to_string(),
        name: name.to_string(),
        source_path,
      })
      .ok_or_else(|| TemplateError::NotFound {
        component: component.to_string(),
        name: name.to_string(),
      })
  }
}

/// Identifier of `path` under `root`, always `/`-separated.
fn relative_name(root: &Path, path: &Path) -> Option<String> {
  let relative = path.strip_prefix(root).ok()?;
  let parts: Vec<String> = relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect();
  if parts.is_empty() { None } else { Some(parts.join("/")) }
}
