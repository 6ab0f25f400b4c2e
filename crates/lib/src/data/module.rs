//! Data documents.
//!
//! A data module `<name>` is a Lua chunk evaluated in a sandbox. It either
//! returns a table or assigns globals; either way the result is plain data.
//!
//! # Lookup
//!
//! For each data directory `d` (and `d/<scope>` right after it):
//!
//! 1. `<name>.lua` is evaluated as-is
//! 2. otherwise `<name>.lua.tmpl` is rendered with an empty mapping, then evaluated
//!
//! The first directory that provides the module wins. A module missing from
//! every directory is empty data; a module that exists but fails to render
//! or run is a [`DataError::ModuleLoad`].

use std::fs;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::consts::{DATA_EXTENSION, DATA_TEMPLATE_EXTENSION};
use crate::lua::convert::{globals_to_map, lua_to_json};
use crate::lua::runtime::{create_runtime, eval_in, sandbox_env};
use crate::template::render::{RenderMode, render};

use super::{DataError, Scope};

/// A data document found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
  /// `<name>.lua`
  Strict(PathBuf),
  /// `<name>.lua.tmpl`
  Templated(PathBuf),
}

impl Document {
  pub fn path(&self) -> &Path {
    match self {
      Document::Strict(p) | Document::Templated(p) => p,
    }
  }
}

/// Find the document for `name` in `dir`, preferring the strict form.
pub fn find_document(name: &str, dir: &Path) -> Option<Document> {
  let strict = dir.join(format!("{}.{}", name, DATA_EXTENSION));
  if strict.is_file() {
    return Some(Document::Strict(strict));
  }

  let templated = dir.join(format!("{}.{}", name, DATA_TEMPLATE_EXTENSION));
  if templated.is_file() {
    return Some(Document::Templated(templated));
  }

  None
}

/// Load and evaluate a document into a data mapping.
pub fn load_document(name: &str, document: &Document) -> Result<Map<String, Value>, DataError> {
  let path = document.path();
  let module_error = |message: String| DataError::ModuleLoad {
    name: name.to_string(),
    path: path.to_path_buf(),
    message,
  };

  let content = fs::read_to_string(path).map_err(|e| module_error(e.to_string()))?;
  let source = match document {
    Document::Strict(_) => content,
    Document::Templated(_) => {
      render(&content, &Value::Object(Map::new()), RenderMode::Lenient).map_err(|e| module_error(e.to_string()))?
    }
  };

  evaluate(&source, path).map_err(|e| module_error(e.to_string()))
}

fn evaluate(source: &str, path: &Path) -> LuaResult<Map<String, Value>> {
  let lua = create_runtime()?;
  let env = sandbox_env(&lua)?;
  let result = eval_in(&lua, source, path, env.clone())?;

  match result {
    LuaValue::Nil => globals_to_map(env),
    LuaValue::Table(_) => match lua_to_json(result)? {
      Some(Value::Object(map)) => Ok(map),
      _ => Err(LuaError::external("data module must return a table of named values")),
    },
    other => Err(LuaError::external(format!(
      "data module must return a table, got {}",
      other.type_name()
    ))),
  }
}

/// Directories to search for a module of `scope`: each data dir followed by its scope subdirectory.
pub fn search_dirs(data_dirs: &[PathBuf], scope: Option<Scope>) -> Vec<PathBuf> {
  match scope {
    None => data_dirs.to_vec(),
    Some(scope) => data_dirs
      .iter()
      .flat_map(|dir| [dir.clone(), dir.join(scope.as_str())])
      .collect(),
  }
}

/// Load module `name` from the first directory providing it.
///
/// Returns an empty mapping if no directory has the module.
pub fn import_configuration(
  name: &str,
  data_dirs: &[PathBuf],
  scope: Option<Scope>,
) -> Result<Map<String, Value>, DataError> {
  for dir in search_dirs(data_dirs, scope) {
    debug!(module = %name, dir = %dir.display(), "looking for data module");

    if let Some(document) = find_document(name, &dir) {
      let data = load_document(name, &document)?;
      info!(module = %name, path = %document.path().display(), "loaded data module");
      return Ok(data);
    }
  }

  debug!(module = %name, "data module not found");
  Ok(Map::new())
}
