use std::sync::Arc;

use confab_lib::data::hooks::{Predicate, Producer};
use confab_lib::data::{ComponentContext, DataLoader, Hook, HookRegistry, Scope};
use serde_json::{Map, Value, json};

use super::common::Project;

fn context() -> ComponentContext {
  ComponentContext {
    environment: "prod".into(),
    host: "web1".into(),
    role: "web".into(),
    component: "nginx".into(),
  }
}

#[test]
fn all_scopes_layer_over_each_other() {
  let project = Project::new("return {}");
  project.write("data/default.lua", "return { listen = 80, tls = { enabled = false, protocols = { 'TLSv1.2' } } }");
  project.write("data/component/nginx.lua", "workers = 2");
  project.write("data/role/web.lua", "return { tls = { enabled = true } }");
  project.write("data/environment/prod.lua.tmpl", "return { domain = 'example.com{{ nothing }}' }");
  project.write("data/host/web1.lua", "return { workers = 8, tls = { protocols = { 'TLSv1.3' } } }");

  let loader = DataLoader::new(vec![project.path().join("data")], HookRegistry::new());
  let data = loader.load(&context()).unwrap();

  assert_eq!(
    data,
    json!({
      "confab": {"environment": "prod", "host": "web1", "role": "web", "component": "nginx"},
      "listen": 80,
      "workers": 8,
      "domain": "example.com",
      "tls": {"enabled": true, "protocols": ["TLSv1.3"]},
    })
  );
}

#[test]
fn later_data_directories_fill_gaps() {
  let project = Project::new("return {}");
  project.write("site/default.lua", "return { a = 'site' }");
  project.write("shared/default.lua", "return { a = 'shared', b = 'shared' }");
  project.write("shared/host/web1.lua", "return { c = 'shared host' }");

  let loader = DataLoader::new(
    vec![project.path().join("site"), project.path().join("shared")],
    HookRegistry::new(),
  );
  let data = loader.load(&context()).unwrap();

  // Directories are alternatives, not layers: the first one providing a module wins.
  assert_eq!(data["a"], "site");
  assert!(data.get("b").is_none());
  assert_eq!(data["c"], "shared host");
}

#[test]
fn hooks_registered_by_name_contribute_data() {
  let project = Project::new("return {}");
  project.write("data/host/web1.lua", "return { from_file = true }");

  let inventory: Producer = Arc::new(|host: &str| {
    let mut map = Map::new();
    map.insert("address".into(), Value::String(format!("{}.internal", host)));
    map
  });
  let prod_only: Predicate = Arc::new(|ctx: &ComponentContext| ctx.environment == "prod");
  let hook = Hook::new(inventory, prod_only);

  let mut hooks = HookRegistry::new();
  hooks.register_named("host", hook.clone()).unwrap();

  let loader = DataLoader::new(vec![project.path().join("data")], hooks.clone());
  let data = loader.load(&context()).unwrap();
  assert_eq!(data["address"], "web1.internal");
  assert_eq!(data["from_file"], true);

  let mut staging = context();
  staging.environment = "staging".into();
  assert!(loader.load(&staging).unwrap().get("address").is_none());

  assert!(hooks.unregister(Scope::Host, &hook));
  let loader = DataLoader::new(vec![project.path().join("data")], hooks);
  assert!(loader.load(&context()).unwrap().get("address").is_none());
}
