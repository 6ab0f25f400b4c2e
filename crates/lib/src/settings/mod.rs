//! Configuration file loading.
//!
//! The configuration is a Lua file returning a table:
//!
//! ```lua
//! return {
//!   environments = { prod = { "web1", "db1" } },
//!   roles = { web = { "web1" }, db = { "db1" } },
//!   components = { web = { "nginx", "app" } },
//!   templates_dir = "templates",
//!   data_dir = { "data", "shared/data" },
//!   exclude = { "*.swp" },
//! }
//! ```
//!
//! Relative directories are resolved against the directory containing the
//! configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{DEFAULT_DATA_DIR, DEFAULT_GENERATED_DIR, DEFAULT_REMOTES_DIR, DEFAULT_TEMPLATES_DIR};
use crate::lua::convert::lua_to_json;
use crate::lua::runtime::create_runtime;
use crate::mime::MimeClassifier;
use crate::resolve::{EnvironmentCatalog, RoleCatalog};
use crate::template::TemplateFilter;

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read configuration {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to evaluate configuration {}: {message}", path.display())]
  Eval { path: PathBuf, message: String },

  #[error("invalid configuration {}: {source}", path.display())]
  Invalid {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid pattern in '{key}': {source}")]
  Pattern {
    key: &'static str,
    #[source]
    source: globset::Error,
  },
}

/// A list given as one string, a Lua sequence, or an empty table.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
  One(String),
  Many(Vec<String>),
  Empty(EmptyTable),
}

/// `{}` from Lua, which has no way to tell an empty list from an empty map.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyTable {}

impl From<StringList> for Vec<String> {
  fn from(list: StringList) -> Self {
    match list {
      StringList::One(s) => vec![s],
      StringList::Many(v) => v,
      StringList::Empty(_) => Vec::new(),
    }
  }
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
  StringList::deserialize(deserializer).map(Vec::from)
}

fn string_list_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
  let raw = BTreeMap::<String, StringList>::deserialize(deserializer)?;
  Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// The table returned by the configuration file, before path resolution.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
  #[serde(default, deserialize_with = "string_list_map")]
  environments: BTreeMap<String, Vec<String>>,
  #[serde(default, deserialize_with = "string_list_map")]
  roles: BTreeMap<String, Vec<String>>,
  #[serde(default, deserialize_with = "string_list_map")]
  components: BTreeMap<String, Vec<String>>,
  #[serde(default, deserialize_with = "string_list")]
  templates_dir: Vec<String>,
  #[serde(default, deserialize_with = "string_list")]
  data_dir: Vec<String>,
  generated_dir: Option<String>,
  remotes_dir: Option<String>,
  #[serde(default, deserialize_with = "string_list")]
  exclude: Vec<String>,
  #[serde(default, deserialize_with = "string_list")]
  verbatim: Vec<String>,
  #[serde(default)]
  assume_yes: bool,
}

/// Loaded configuration with directories made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  pub environments: EnvironmentCatalog,
  pub roles: RoleCatalog,
  /// Role name to the components it is made of.
  pub components: BTreeMap<String, Vec<String>>,
  pub templates_dirs: Vec<PathBuf>,
  pub data_dirs: Vec<PathBuf>,
  pub generated_dir: PathBuf,
  pub remotes_dir: PathBuf,
  /// Globs excluded from template discovery.
  pub exclude: Vec<String>,
  /// Globs always copied verbatim.
  pub verbatim: Vec<String>,
  pub assume_yes: bool,
}

impl Settings {
  /// Empty settings rooted at `base_dir`, with default directory names.
  pub fn new(base_dir: &Path) -> Self {
    Self {
      environments: BTreeMap::new(),
      roles: BTreeMap::new(),
      components: BTreeMap::new(),
      templates_dirs: vec![base_dir.join(DEFAULT_TEMPLATES_DIR)],
      data_dirs: vec![base_dir.join(DEFAULT_DATA_DIR)],
      generated_dir: base_dir.join(DEFAULT_GENERATED_DIR),
      remotes_dir: base_dir.join(DEFAULT_REMOTES_DIR),
      exclude: Vec::new(),
      verbatim: Vec::new(),
      assume_yes: false,
    }
  }

  /// Load settings from a Lua configuration file.
  pub fn load(path: &Path) -> Result<Self, SettingsError> {
    let source = fs::read_to_string(path).map_err(|source| SettingsError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    debug!(path = %path.display(), "evaluating configuration");

    let value = evaluate(&source, &path).map_err(|e| SettingsError::Eval {
      path: path.clone(),
      message: e.to_string(),
    })?;
    let raw: RawSettings = serde_json::from_value(value).map_err(|source| SettingsError::Invalid {
      path: path.clone(),
      source,
    })?;

    let settings = Self::from_raw(raw, &base_dir);
    info!(
      path = %path.display(),
      environments = settings.environments.len(),
      roles = settings.roles.len(),
      "loaded configuration"
    );
    Ok(settings)
  }

  fn from_raw(raw: RawSettings, base_dir: &Path) -> Self {
    let defaults = Self::new(base_dir);
    let resolve_all = |dirs: Vec<String>, default: Vec<PathBuf>| {
      if dirs.is_empty() {
        default
      } else {
        dirs.iter().map(|d| resolve_path(base_dir, d)).collect()
      }
    };

    Self {
      environments: raw.environments,
      roles: raw.roles,
      components: raw.components,
      templates_dirs: resolve_all(raw.templates_dir, defaults.templates_dirs),
      data_dirs: resolve_all(raw.data_dir, defaults.data_dirs),
      generated_dir: raw
        .generated_dir
        .map(|d| resolve_path(base_dir, &d))
        .unwrap_or(defaults.generated_dir),
      remotes_dir: raw
        .remotes_dir
        .map(|d| resolve_path(base_dir, &d))
        .unwrap_or(defaults.remotes_dir),
      exclude: raw.exclude,
      verbatim: raw.verbatim,
      assume_yes: raw.assume_yes,
    }
  }

  /// Whether any environment is defined. Nothing can run otherwise.
  pub fn is_configured(&self) -> bool {
    !self.environments.is_empty()
  }

  /// Components making up `role`. A role without an explicit list is its own component.
  pub fn components_of(&self, role: &str) -> Vec<String> {
    match self.components.get(role) {
      Some(components) => components.clone(),
      None => vec![role.to_string()],
    }
  }

  pub fn template_filter(&self) -> Result<TemplateFilter, SettingsError> {
    TemplateFilter::new(&self.exclude).map_err(|source| SettingsError::Pattern { key: "exclude", source })
  }

  pub fn mime_classifier(&self) -> Result<MimeClassifier, SettingsError> {
    MimeClassifier::with_verbatim(&self.verbatim).map_err(|source| SettingsError::Pattern { key: "verbatim", source })
  }
}

fn resolve_path(base_dir: &Path, dir: &str) -> PathBuf {
  let path = Path::new(dir);
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base_dir.join(path)
  }
}

/// Run the configuration chunk and convert the returned table to JSON.
///
/// The configuration is trusted, so it runs with the full standard library.
fn evaluate(source: &str, path: &Path) -> LuaResult<serde_json::Value> {
  let lua = create_runtime()?;
  let result: LuaValue = lua.load(source).set_name(format!("@{}", path.display())).eval()?;

  match result {
    LuaValue::Table(_) => match lua_to_json(result)? {
      Some(value @ serde_json::Value::Object(_)) => Ok(value),
      _ => Err(LuaError::external("configuration must return a table of settings")),
    },
    LuaValue::Nil => Ok(serde_json::Value::Object(Default::default())),
    other => Err(LuaError::external(format!(
      "configuration must return a table, got {}",
      other.type_name()
    ))),
  }
}
