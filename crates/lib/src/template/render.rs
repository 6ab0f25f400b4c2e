//! Placeholder parsing and substitution for configuration templates.
//!
//! # Placeholder Format
//!
//! `{{ path.to.value }}` looks up a dotted path in the data mapping. Each
//! segment is an object key, or an index when the current value is an array
//! (`{{ servers.0.name }}`). Whitespace inside the braces is ignored.
//!
//! # Rendering Values
//!
//! - strings are inserted as-is
//! - numbers and booleans use their display form
//! - `null` renders as nothing
//! - arrays and objects render as compact JSON
//!
//! # Escaping
//!
//! `\{{` produces a literal `{{`. A lone `{` or `}` passes through.
//!
//! # Example
//!
//! ```
//! use confab_lib::template::render::{RenderMode, render};
//! use serde_json::json;
//!
//! let data = json!({"confab": {"host": "web1"}});
//! let out = render("/etc/app/{{ confab.host }}.conf", &data, RenderMode::Strict).unwrap();
//! assert_eq!(out, "/etc/app/web1.conf");
//! ```

use serde_json::Value;
use thiserror::Error;

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A dotted lookup path
  Placeholder(Vec<String>),
}

/// How unresolved placeholders are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  /// Unresolved placeholders are an error.
  Strict,
  /// Unresolved placeholders render as nothing.
  Lenient,
}

/// Errors that can occur during placeholder parsing or resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("malformed placeholder: '{0}'")]
  Malformed(String),

  #[error("undefined value: {0}")]
  Undefined(String),
}

/// Parse a template string into segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, RenderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    match ch {
      '\\' => match chars.peek() {
        Some((_, '{')) => {
          // Escaped: \{{ -> {{ (literal), \{ -> \{
          chars.next();
          if let Some((_, '{')) = chars.peek() {
            chars.next();
            literal.push_str("{{");
          } else {
            literal.push_str("\\{");
          }
        }
        _ => literal.push('\\'),
      },
      '{' => match chars.peek() {
        Some((_, '{')) => {
          chars.next(); // consume the second {

          if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
          }

          let mut content = String::new();
          let mut found_close = false;
          while let Some((_, c)) = chars.next() {
            if c == '}'
              && let Some((_, '}')) = chars.peek()
            {
              chars.next();
              found_close = true;
              break;
            }
            content.push(c);
          }

          if !found_close {
            return Err(RenderError::Unclosed(pos));
          }

          segments.push(Segment::Placeholder(parse_path(&content)?));
        }
        _ => literal.push('{'),
      },
      _ => literal.push(ch),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content between `{{` and `}}` into path segments.
fn parse_path(content: &str) -> Result<Vec<String>, RenderError> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(RenderError::Malformed(content.to_string()));
  }

  let path: Vec<String> = trimmed.split('.').map(|s| s.trim().to_string()).collect();
  if path
    .iter()
    .any(|s| s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '{' || c == '}'))
  {
    return Err(RenderError::Malformed(trimmed.to_string()));
  }

  Ok(path)
}

/// Look up a dotted path in a JSON value.
pub fn lookup<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
  path.iter().try_fold(data, |current, key| match current {
    Value::Object(map) => map.get(key),
    Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  })
}

/// Parse and substitute in one step.
pub fn render(input: &str, data: &Value, mode: RenderMode) -> Result<String, RenderError> {
  let segments = parse(input)?;
  substitute_segments(&segments, data, mode)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], data: &Value, mode: RenderMode) -> Result<String, RenderError> {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(path) => match lookup(data, path) {
        Some(value) => push_value(&mut result, value),
        None if mode == RenderMode::Lenient => {}
        None => return Err(RenderError::Undefined(path.join("."))),
      },
    }
  }

  Ok(result)
}

fn push_value(out: &mut String, value: &Value) {
  match value {
    Value::Null => {}
    Value::String(s) => out.push_str(s),
    Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
    Value::Number(n) => out.push_str(&n.to_string()),
    Value::Array(_) | Value::Object(_) => out.push_str(&value.to_string()),
  }
}
