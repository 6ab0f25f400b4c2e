//! Hooks contributing extra data to a scope.
//!
//! A hook is a (producer, predicate) pair bound to one scope. When data for
//! that scope is loaded, every hook whose predicate accepts the current
//! component context runs, in registration order, and its output is merged
//! over the scope's document.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{ComponentContext, DataError, Scope};

/// Produces data for a module name (e.g. the host name for host scope).
pub type Producer = Arc<dyn Fn(&str) -> Map<String, Value> + Send + Sync>;

/// Decides whether a hook applies to a component context.
pub type Predicate = Arc<dyn Fn(&ComponentContext) -> bool + Send + Sync>;

/// A registered hook.
#[derive(Clone)]
pub struct Hook {
  pub producer: Producer,
  pub predicate: Predicate,
}

impl Hook {
  pub fn new(producer: Producer, predicate: Predicate) -> Self {
    Self { producer, predicate }
  }

  /// A hook that applies to every context.
  pub fn always(producer: Producer) -> Self {
    Self::new(producer, Arc::new(|_: &ComponentContext| true))
  }

  /// Identity comparison: same producer and same predicate.
  fn same_as(&self, other: &Hook) -> bool {
    Arc::ptr_eq(&self.producer, &other.producer) && Arc::ptr_eq(&self.predicate, &other.predicate)
  }
}

impl fmt::Debug for Hook {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Hook").finish_non_exhaustive()
  }
}

/// Hooks by scope.
///
/// Built during setup and handed to the data loader; read-only while
/// configuration files are processed.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
  hooks: BTreeMap<Scope, Vec<Hook>>,
}

impl HookRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a hook for `scope`.
  pub fn register(&mut self, scope: Scope, hook: Hook) {
    self.hooks.entry(scope).or_default().push(hook);
  }

  /// Register a hook for a scope given by name.
  ///
  /// Fails with [`DataError::InvalidConfiguration`] for an unknown scope name.
  pub fn register_named(&mut self, scope: &str, hook: Hook) -> Result<(), DataError> {
    let scope: Scope = scope.parse()?;
    self.register(scope, hook);
    Ok(())
  }

  /// Remove a previously registered hook.
  ///
  /// Returns `false` if this exact (producer, predicate) pair was never registered.
  pub fn unregister(&mut self, scope: Scope, hook: &Hook) -> bool {
    let Some(hooks) = self.hooks.get_mut(&scope) else {
      return false;
    };
    match hooks.iter().position(|h| h.same_as(hook)) {
      Some(index) => {
        hooks.remove(index);
        true
      }
      None => false,
    }
  }

  /// Hooks for `scope`, in registration order.
  pub fn hooks(&self, scope: Scope) -> &[Hook] {
    self.hooks.get(&scope).map(Vec::as_slice).unwrap_or_default()
  }

  /// Outputs of the hooks for `scope` that accept `context`, in registration order.
  pub fn run(&self, scope: Scope, module_name: &str, context: &ComponentContext) -> Vec<Map<String, Value>> {
    self
      .hooks(scope)
      .iter()
      .filter(|hook| (hook.predicate)(context))
      .map(|hook| (hook.producer)(module_name))
      .collect()
  }

  pub fn is_empty(&self) -> bool {
    self.hooks.values().all(Vec::is_empty)
  }
}
