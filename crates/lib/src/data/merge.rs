//! Deep merge of configuration mappings.
//!
//! - Objects: deep-merge by key (recursive)
//! - Arrays: replace (no concatenation)
//! - Scalars: later value wins

use serde_json::{Map, Value};

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
  match (base, overlay) {
    (Value::Object(base_map), Value::Object(overlay_map)) => Value::Object(merge_maps(base_map, overlay_map)),
    (_, overlay) => overlay,
  }
}

/// Merge `overlay` onto `base` key by key.
pub fn merge_maps(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
  for (key, overlay_value) in overlay {
    let merged = match base.remove(&key) {
      Some(base_value) => deep_merge(base_value, overlay_value),
      None => overlay_value,
    };
    base.insert(key, merged);
  }
  base
}

/// Merge mappings left to right; the rightmost mapping has highest precedence.
pub fn merge<I>(maps: I) -> Map<String, Value>
where
  I: IntoIterator<Item = Map<String, Value>>,
{
  maps.into_iter().fold(Map::new(), merge_maps)
}
