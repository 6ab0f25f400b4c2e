//! Comparison of the generated and pulled copies of a configuration file.

use std::fs;
use std::io;
use std::path::Path;

use similar::TextDiff;

use super::{ConfFileError, io_error};

/// Lines of context around each hunk.
const CONTEXT_LINES: usize = 3;

/// How a generated file relates to the remote one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
  /// Neither copy exists. Nothing to do.
  BothMissing,
  /// Only the remote copy exists. Generation should always succeed, so this is unexpected.
  RemoteOnly,
  /// Only the generated copy exists: a new file.
  GeneratedOnly,
  /// Both exist and differ; holds the unified diff lines.
  Changed(Vec<String>),
  Identical,
}

/// Diff of one configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfFileDiff {
  /// Remote path, used as the display name.
  pub name: String,
  pub kind: DiffKind,
}

impl ConfFileDiff {
  /// Compare the local copies at `remote_file` and `generated_file`.
  ///
  /// A read failure names the copy that could not be read.
  pub fn compute(name: &str, remote_file: &Path, generated_file: &Path) -> Result<Self, ConfFileError> {
    let kind = match (read_optional(remote_file)?, read_optional(generated_file)?) {
      (None, None) => DiffKind::BothMissing,
      (Some(_), None) => DiffKind::RemoteOnly,
      (None, Some(_)) => DiffKind::GeneratedOnly,
      (Some(remote), Some(generated)) if remote == generated => DiffKind::Identical,
      (Some(remote), Some(generated)) => DiffKind::Changed(diff_bytes(name, &remote, &generated)),
    };

    Ok(Self {
      name: name.to_string(),
      kind,
    })
  }

  /// Whether pushing would change the remote host.
  pub fn has_changes(&self) -> bool {
    matches!(
      self.kind,
      DiffKind::RemoteOnly | DiffKind::GeneratedOnly | DiffKind::Changed(_)
    )
  }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ConfFileError> {
  match fs::read(path) {
    Ok(bytes) => Ok(Some(bytes)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(io_error(path)(e)),
  }
}

fn diff_bytes(name: &str, remote: &[u8], generated: &[u8]) -> Vec<String> {
  match (std::str::from_utf8(remote), std::str::from_utf8(generated)) {
    (Ok(remote), Ok(generated)) => unified_diff(remote, generated, name),
    _ => vec![format!("Binary files {} (remote) and {} (generated) differ", name, name)],
  }
}

/// Unified diff from the remote text to the generated text, one entry per line without line endings.
pub fn unified_diff(remote: &str, generated: &str, name: &str) -> Vec<String> {
  let diff = TextDiff::from_lines(remote, generated);
  diff
    .unified_diff()
    .context_radius(CONTEXT_LINES)
    .header(&format!("{} (remote)", name), &format!("{} (generated)", name))
    .to_string()
    .lines()
    .map(str::to_string)
    .collect()
}
