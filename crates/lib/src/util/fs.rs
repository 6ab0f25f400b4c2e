//! Filesystem helpers for the local working directories.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;

/// Remove everything inside `dir`, creating it if missing.
pub fn clear_dir(dir: &Path) -> io::Result<()> {
  match fs::remove_dir_all(dir) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  fs::create_dir_all(dir)
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
    _ => Ok(()),
  }
}

/// Remove `path` if it exists.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
  match fs::remove_file(path) {
    Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
    _ => Ok(()),
  }
}

/// Copy permission bits and access/modification times from `src` to `dst`.
pub fn copy_stat(src: &Path, dst: &Path) -> io::Result<()> {
  let metadata = fs::metadata(src)?;
  let times = FileTimes::new()
    .set_accessed(metadata.accessed()?)
    .set_modified(metadata.modified()?);

  File::options().write(true).open(dst)?.set_times(times)?;
  fs::set_permissions(dst, metadata.permissions())
}

/// Copy `src` to `dst` along with its permissions and timestamps.
pub fn copy_with_stat(src: &Path, dst: &Path) -> io::Result<()> {
  fs::copy(src, dst)?;
  copy_stat(src, dst)
}
