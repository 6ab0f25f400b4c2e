//! Test doubles for the remote and console collaborators.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::conffile::ConfFileDiff;
use crate::remote::{Remote, RemoteContext, RemoteError};
use crate::sync::Console;

#[derive(Debug, Default)]
struct MemoryState {
  files: BTreeMap<(String, String), Vec<u8>>,
  written: Vec<String>,
  commands: usize,
  failing: BTreeSet<String>,
}

/// In-memory hosts that record every write.
#[derive(Debug, Default)]
pub struct MemoryRemote {
  state: RefCell<MemoryState>,
}

impl MemoryRemote {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, host: &str, path: &str, content: &str) {
    self
      .state
      .borrow_mut()
      .files
      .insert((host.to_string(), path.to_string()), content.as_bytes().to_vec());
  }

  pub fn read(&self, host: &str, path: &str) -> Option<String> {
    let state = self.state.borrow();
    let bytes = state.files.get(&(host.to_string(), path.to_string()))?;
    Some(String::from_utf8_lossy(bytes).into_owned())
  }

  /// Make every operation against `host` fail.
  pub fn fail_host(&self, host: &str) {
    self.state.borrow_mut().failing.insert(host.to_string());
  }

  /// Number of files put.
  pub fn writes(&self) -> usize {
    self.state.borrow().written.len()
  }

  /// Remote paths put, in order.
  pub fn written_paths(&self) -> Vec<String> {
    self.state.borrow().written.clone()
  }

  /// Number of privileged commands run, directory creation included.
  pub fn commands(&self) -> usize {
    self.state.borrow().commands
  }

  fn check(&self, ctx: &RemoteContext, path: &str) -> Result<(), RemoteError> {
    if self.state.borrow().failing.contains(&ctx.host) {
      return Err(RemoteError::Transfer {
        host: ctx.host.clone(),
        path: path.to_string(),
        message: "connection refused".to_string(),
      });
    }
    Ok(())
  }
}

impl Remote for MemoryRemote {
  fn exists(&self, ctx: &RemoteContext, path: &str) -> Result<bool, RemoteError> {
    self.check(ctx, path)?;
    Ok(self.state.borrow().files.contains_key(&(ctx.host.clone(), path.to_string())))
  }

  fn get(&self, ctx: &RemoteContext, remote_path: &str, local_path: &Path) -> Result<(), RemoteError> {
    self.check(ctx, remote_path)?;
    let state = self.state.borrow();
    let bytes = state
      .files
      .get(&(ctx.host.clone(), remote_path.to_string()))
      .ok_or_else(|| RemoteError::Transfer {
        host: ctx.host.clone(),
        path: remote_path.to_string(),
        message: "no such file".to_string(),
      })?;
    fs::write(local_path, bytes).map_err(|source| RemoteError::Io {
      host: ctx.host.clone(),
      path: local_path.to_path_buf(),
      source,
    })
  }

  fn put(
    &self,
    ctx: &RemoteContext,
    local_path: &Path,
    remote_path: &str,
    _mirror_local_mode: bool,
  ) -> Result<(), RemoteError> {
    self.check(ctx, remote_path)?;
    let bytes = fs::read(local_path).map_err(|source| RemoteError::Io {
      host: ctx.host.clone(),
      path: local_path.to_path_buf(),
      source,
    })?;
    let mut state = self.state.borrow_mut();
    state.files.insert((ctx.host.clone(), remote_path.to_string()), bytes);
    state.written.push(remote_path.to_string());
    Ok(())
  }

  fn run_privileged(&self, ctx: &RemoteContext, command: &str) -> Result<String, RemoteError> {
    self.check(ctx, command)?;
    self.state.borrow_mut().commands += 1;
    Ok(String::new())
  }
}

/// Console with a fixed answer that records what it was shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
  answer: bool,
  pub shown: Vec<ConfFileDiff>,
  pub nothing: Vec<String>,
  pub prompts: usize,
}

impl ScriptedConsole {
  pub fn answering(answer: bool) -> Self {
    Self {
      answer,
      ..Self::default()
    }
  }
}

impl Console for ScriptedConsole {
  fn show_diff(&mut self, diff: &ConfFileDiff) {
    self.shown.push(diff.clone());
  }

  fn nothing_to_push(&mut self, host: &str) {
    self.nothing.push(host.to_string());
  }

  fn confirm_push(&mut self, _host: &str, _changed: &[String]) -> bool {
    self.prompts += 1;
    self.answer
  }
}
