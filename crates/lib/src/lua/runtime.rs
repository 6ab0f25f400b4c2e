use std::path::Path;

use mlua::prelude::*;

/// Globals a data document may use. Everything else (io, os, require, load...)
/// is left out of the document environment.
const SANDBOX_GLOBALS: &[&str] = &[
  "string", "table", "math", "utf8", "pairs", "ipairs", "next", "select", "type", "tostring", "tonumber", "error",
  "assert",
];

/// Create a new Lua runtime with the standard safe libraries loaded.
pub fn create_runtime() -> LuaResult<Lua> {
  Ok(Lua::new())
}

/// Build an empty environment table exposing only [`SANDBOX_GLOBALS`].
///
/// The helpers are reached through `__index`, and there is no `__newindex`,
/// so the table itself holds exactly what the chunk assigns.
pub fn sandbox_env(lua: &Lua) -> LuaResult<LuaTable> {
  let globals = lua.globals();
  let helpers = lua.create_table()?;
  for name in SANDBOX_GLOBALS {
    let value: LuaValue = globals.get(*name)?;
    helpers.set(*name, value)?;
  }

  let env = lua.create_table()?;
  let mt = lua.create_table()?;
  mt.set("__index", helpers)?;
  env.set_metatable(Some(mt))?;
  Ok(env)
}

/// Evaluate `source` inside `env`, naming the chunk after `path` for error messages.
pub fn eval_in(lua: &Lua, source: &str, path: &Path, env: LuaTable) -> LuaResult<LuaValue> {
  lua
    .load(source)
    .set_name(format!("@{}", path.display()))
    .set_environment(env)
    .eval::<LuaValue>()
}
