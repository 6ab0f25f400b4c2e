use std::path::PathBuf;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::consts::CONFAB_KEY;

use super::hooks::HookRegistry;
use super::merge::merge;
use super::module::import_configuration;
use super::{ComponentContext, DataError, Scope};

/// Assembles the data mapping for one component context.
#[derive(Debug, Clone)]
pub struct DataLoader {
  data_dirs: Vec<PathBuf>,
  scopes: Vec<Scope>,
  hooks: HookRegistry,
}

impl DataLoader {
  /// Loader over all five scopes.
  pub fn new(data_dirs: Vec<PathBuf>, hooks: HookRegistry) -> Self {
    Self {
      data_dirs,
      scopes: Scope::ALL.to_vec(),
      hooks,
    }
  }

  /// Restrict loading to `scopes`. They are always applied in precedence order.
  pub fn with_scopes(mut self, scopes: &[Scope]) -> Self {
    let mut scopes = scopes.to_vec();
    scopes.sort();
    scopes.dedup();
    self.scopes = scopes;
    self
  }

  /// Module name for `scope`, or `None` if the scope contributes nothing for `context`.
  fn module_name<'c>(scope: Scope, context: &'c ComponentContext) -> Option<&'c str> {
    match scope {
      Scope::Default => Some("default"),
      Scope::Component => Some(context.component.as_str()),
      Scope::Role if context.role == context.component => None,
      Scope::Role => Some(context.role.as_str()),
      Scope::Environment => Some(context.environment.as_str()),
      Scope::Host => Some(context.host.as_str()),
    }
  }

  /// Data for one scope: its document with hook outputs merged over it.
  fn load_scope(&self, scope: Scope, name: &str, context: &ComponentContext) -> Result<Map<String, Value>, DataError> {
    let document = import_configuration(name, &self.data_dirs, Some(scope))?;
    let outputs = self.hooks.run(scope, name, context);
    debug!(scope = %scope, module = %name, hooks = outputs.len(), "loaded scope");
    Ok(merge(std::iter::once(document).chain(outputs)))
  }

  /// Merged data for `context`, lowest precedence first.
  ///
  /// The result always starts from the `confab` metadata key, which any
  /// scope may override.
  pub fn load(&self, context: &ComponentContext) -> Result<Value, DataError> {
    let mut layers = vec![metadata(context)];

    for &scope in &self.scopes {
      let Some(name) = Self::module_name(scope, context) else {
        debug!(scope = %scope, role = %context.role, "role is its own component, skipping role scope");
        continue;
      };
      layers.push(self.load_scope(scope, name, context)?);
    }

    Ok(Value::Object(merge(layers)))
  }
}

fn metadata(context: &ComponentContext) -> Map<String, Value> {
  let mut map = Map::new();
  map.insert(
    CONFAB_KEY.to_string(),
    json!({
      "environment": context.environment,
      "host": context.host,
      "role": context.role,
      "component": context.component,
    }),
  );
  map
}
