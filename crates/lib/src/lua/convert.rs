//! Conversion of Lua values into plain JSON data.
//!
//! Only data survives the conversion: functions, userdata and threads are
//! dropped. Sequence tables (integer keys starting at 1) become arrays, any
//! other table becomes an object. A table with both a sequence part and
//! named keys is an error.

use mlua::prelude::*;
use serde_json::{Map, Number, Value};

/// Tables nested deeper than this are rejected (guards against cycles).
const MAX_DEPTH: usize = 64;

/// Convert a Lua value into JSON.
///
/// Returns `Ok(None)` for values that are not data.
pub fn lua_to_json(value: LuaValue) -> LuaResult<Option<Value>> {
  convert(value, 0)
}

/// Convert a table of assigned globals into a data mapping.
///
/// Keys starting with `_` are module machinery, not data, and are skipped
/// along with non-data values.
pub fn globals_to_map(table: LuaTable) -> LuaResult<Map<String, Value>> {
  let mut map = Map::new();
  for pair in table.pairs::<LuaValue, LuaValue>() {
    let (k, v) = pair?;
    let key = key_to_string(k)?;
    if key.starts_with('_') {
      continue;
    }
    if let Some(value) = convert(v, 1)? {
      map.insert(key, value);
    }
  }
  Ok(map)
}

fn convert(value: LuaValue, depth: usize) -> LuaResult<Option<Value>> {
  if depth > MAX_DEPTH {
    return Err(LuaError::external("table nested too deeply (cycle?)"));
  }

  match value {
    LuaValue::Nil => Ok(Some(Value::Null)),
    LuaValue::Boolean(b) => Ok(Some(Value::Bool(b))),
    LuaValue::Integer(i) => Ok(Some(Value::from(i))),
    LuaValue::Number(n) => Number::from_f64(n)
      .map(|n| Some(Value::Number(n)))
      .ok_or_else(|| LuaError::external(format!("number {} cannot be represented as data", n))),
    LuaValue::String(s) => Ok(Some(Value::String(s.to_str()?.to_string()))),
    LuaValue::Table(t) => convert_table(t, depth).map(Some),
    _ => Ok(None),
  }
}

fn convert_table(t: LuaTable, depth: usize) -> LuaResult<Value> {
  // Check if it's an array (sequential integer keys starting at 1)
  let len = t.raw_len();
  let first: LuaValue = t.raw_get(1i64)?;
  if len > 0 && first != LuaValue::Nil {
    let entries = t.pairs::<LuaValue, LuaValue>().count();
    if entries > len {
      return Err(LuaError::external("table mixes list entries and named keys"));
    }

    let mut arr = Vec::with_capacity(len);
    for i in 1..=len {
      let val: LuaValue = t.raw_get(i)?;
      if let Some(v) = convert(val, depth + 1)? {
        arr.push(v);
      }
    }
    return Ok(Value::Array(arr));
  }

  let mut map = Map::new();
  for pair in t.pairs::<LuaValue, LuaValue>() {
    let (k, v) = pair?;
    let key = key_to_string(k)?;
    if let Some(value) = convert(v, depth + 1)? {
      map.insert(key, value);
    }
  }
  Ok(Value::Object(map))
}

fn key_to_string(key: LuaValue) -> LuaResult<String> {
  match key {
    LuaValue::String(s) => Ok(s.to_str()?.to_string()),
    LuaValue::Integer(i) => Ok(i.to_string()),
    other => Err(LuaError::external(format!(
      "unsupported table key type: {}",
      other.type_name()
    ))),
  }
}
