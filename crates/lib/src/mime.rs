//! MIME classification of template files.
//!
//! Decides whether a template body is rendered or copied verbatim.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// `application/*` subtypes that are text and get rendered.
const TEXT_APPLICATION_SUBTYPES: &[&str] = &["json", "xml", "javascript", "toml", "yaml", "x-yaml", "x-sh", "x-toml"];

/// How a template body is turned into a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  /// Rendered against the data mapping.
  Rendered,
  /// Copied unchanged (binary or otherwise non-renderable content).
  Verbatim,
}

/// Classifies template files by name.
#[derive(Debug, Clone)]
pub struct MimeClassifier {
  verbatim: GlobSet,
}

impl Default for MimeClassifier {
  fn default() -> Self {
    Self {
      verbatim: GlobSet::empty(),
    }
  }
}

impl MimeClassifier {
  /// Classifier that additionally forces names matching `patterns` to verbatim.
  pub fn with_verbatim<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
      builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(Self {
      verbatim: builder.build()?,
    })
  }

  pub fn classify(&self, name: &str) -> FileKind {
    if self.verbatim.is_match(name) {
      return FileKind::Verbatim;
    }
    classify_mime(name)
  }
}

/// Classify by guessed MIME type alone.
///
/// Names without a known type are treated as text.
pub fn classify_mime(name: &str) -> FileKind {
  let Some(mime) = mime_guess::from_path(name).first() else {
    return FileKind::Rendered;
  };

  match mime.type_().as_str() {
    "text" => FileKind::Rendered,
    "application" if TEXT_APPLICATION_SUBTYPES.contains(&mime.subtype().as_str()) => FileKind::Rendered,
    _ => FileKind::Verbatim,
  }
}
