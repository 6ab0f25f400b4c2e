//! Exclusion rules for template discovery.

use globset::{Glob, GlobSet, GlobSetBuilder};

/// Name filter applied to template identifiers during discovery.
#[derive(Debug, Clone)]
pub struct TemplateFilter {
  exclude: GlobSet,
}

impl Default for TemplateFilter {
  fn default() -> Self {
    Self {
      exclude: GlobSet::empty(),
    }
  }
}

impl TemplateFilter {
  /// Build a filter rejecting names that match any of `patterns`.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
      builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(Self {
      exclude: builder.build()?,
    })
  }

  /// Whether the template `name` should be included.
  ///
  /// Patterns are matched against both the full relative name and its file name,
  /// so `*.swp` excludes `etc/app/.conf.swp` as well as `x.swp`.
  pub fn accepts(&self, name: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    !(self.exclude.is_match(name) || self.exclude.is_match(file_name))
  }
}
