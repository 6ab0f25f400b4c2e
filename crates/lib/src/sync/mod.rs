//! The pull, generate, diff, confirm, push pipeline.
//!
//! A [`SyncOrchestrator`] drives one [`ConfFiles`] set through
//!
//! ```text
//! Idle → Pulled → Generated → Diffed → Confirmed → Pushed
//!                                    ↘ Aborted
//! ```
//!
//! Generating straight from `Idle` is allowed (the `generate` command never
//! pulls), but diffing needs both copies, so it requires a pull first.
//! Only files whose diff reports a change are ever pushed, and only after
//! confirmation.

pub mod run;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub use run::{HostFailure, RunCommand, RunOptions, RunSummary, Runner};

use crate::conffile::{ConfFileDiff, ConfFileError, ConfFiles};
use crate::remote::{Remote, RemoteError};
use crate::resolve::{HostAndRole, ResolutionError};
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum SyncError {
  #[error("Confab needs to be configured")]
  NotConfigured,

  #[error(transparent)]
  Resolution(#[from] ResolutionError),

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error(transparent)]
  ConfFile(#[from] ConfFileError),

  #[error("failed to prepare working directory {}: {source}", path.display())]
  WorkDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot {operation} in state {state}")]
  InvalidTransition { state: SyncState, operation: &'static str },

  #[error("host '{host}' (role '{role}', environment '{environment}')")]
  Unit {
    environment: String,
    host: String,
    role: String,
    #[source]
    source: Box<SyncError>,
  },
}

impl SyncError {
  /// The transport failure behind this error, if any.
  pub fn as_remote(&self) -> Option<&RemoteError> {
    match self {
      SyncError::ConfFile(ConfFileError::Remote(e)) => Some(e),
      SyncError::Unit { source, .. } => source.as_remote(),
      _ => None,
    }
  }

  /// Attach the unit of work this error happened in.
  pub fn in_unit(self, unit: &HostAndRole) -> Self {
    SyncError::Unit {
      environment: unit.environment.clone(),
      host: unit.host.clone(),
      role: unit.role.clone(),
      source: Box::new(self),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
  Idle,
  Pulled,
  Generated,
  Diffed,
  Confirmed,
  Aborted,
  Pushed,
}

impl fmt::Display for SyncState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SyncState::Idle => "idle",
      SyncState::Pulled => "pulled",
      SyncState::Generated => "generated",
      SyncState::Diffed => "diffed",
      SyncState::Confirmed => "confirmed",
      SyncState::Aborted => "aborted",
      SyncState::Pushed => "pushed",
    };
    f.write_str(name)
  }
}

/// What a push run did for one set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
  /// No file differs; nothing was asked and nothing written.
  Nothing,
  /// Confirmation was refused; nothing written.
  Declined { changed: Vec<String> },
  /// The changed files were pushed.
  Pushed { changed: Vec<String> },
}

/// User interaction during a sync.
pub trait Console {
  fn show_diff(&mut self, diff: &ConfFileDiff);

  /// Tell the user there is nothing to push for `host`.
  fn nothing_to_push(&mut self, host: &str);

  /// List the files about to be pushed to `host`, whether or not a prompt follows.
  fn show_changed(&mut self, _host: &str, _changed: &[String]) {}

  /// Ask whether to push `changed` (remote paths) to `host`. The default answer is no.
  fn confirm_push(&mut self, host: &str, changed: &[String]) -> bool;
}

/// Drives one set through the pipeline.
pub struct SyncOrchestrator<'a> {
  set: &'a ConfFiles,
  remote: &'a dyn Remote,
  generated_dir: &'a Path,
  remotes_dir: &'a Path,
  state: SyncState,
  pulled: bool,
  diffs: Vec<ConfFileDiff>,
}

impl<'a> SyncOrchestrator<'a> {
  pub fn new(set: &'a ConfFiles, remote: &'a dyn Remote, generated_dir: &'a Path, remotes_dir: &'a Path) -> Self {
    Self {
      set,
      remote,
      generated_dir,
      remotes_dir,
      state: SyncState::Idle,
      pulled: false,
      diffs: Vec::new(),
    }
  }

  pub fn state(&self) -> SyncState {
    self.state
  }

  /// Diffs from the last [`Self::diff`], in discovery order.
  pub fn diffs(&self) -> &[ConfFileDiff] {
    &self.diffs
  }

  fn expect_state(&self, allowed: &[SyncState], operation: &'static str) -> Result<(), SyncError> {
    if allowed.contains(&self.state) {
      Ok(())
    } else {
      Err(SyncError::InvalidTransition {
        state: self.state,
        operation,
      })
    }
  }

  pub fn pull(&mut self) -> Result<(), SyncError> {
    self.expect_state(&[SyncState::Idle], "pull")?;
    self.set.pull(self.remote, self.remotes_dir)?;
    self.pulled = true;
    self.state = SyncState::Pulled;
    Ok(())
  }

  pub fn generate(&mut self) -> Result<(), SyncError> {
    self.expect_state(&[SyncState::Idle, SyncState::Pulled], "generate")?;
    self.set.generate(self.generated_dir)?;
    self.state = SyncState::Generated;
    Ok(())
  }

  pub fn diff(&mut self) -> Result<&[ConfFileDiff], SyncError> {
    self.expect_state(&[SyncState::Generated], "diff")?;
    if !self.pulled {
      return Err(SyncError::InvalidTransition {
        state: self.state,
        operation: "diff without pulling",
      });
    }
    self.diffs = self.set.diff(self.generated_dir, self.remotes_dir)?;
    self.state = SyncState::Diffed;
    Ok(&self.diffs)
  }

  /// Remote paths of the files that would change, in discovery order.
  pub fn changed(&self) -> Vec<String> {
    self
      .diffs
      .iter()
      .filter(|d| d.has_changes())
      .map(|d| d.name.clone())
      .collect()
  }

  /// Record the user's answer.
  pub fn confirm(&mut self, approved: bool) -> Result<(), SyncError> {
    self.expect_state(&[SyncState::Diffed], "confirm")?;
    self.state = if approved {
      SyncState::Confirmed
    } else {
      SyncState::Aborted
    };
    Ok(())
  }

  /// Push the changed files. Returns how many were pushed.
  pub fn push(&mut self) -> Result<usize, SyncError> {
    self.expect_state(&[SyncState::Confirmed], "push")?;
    let indices: Vec<usize> = self
      .diffs
      .iter()
      .enumerate()
      .filter(|(_, d)| d.has_changes())
      .map(|(i, _)| i)
      .collect();
    self.set.push(self.remote, self.generated_dir, &indices)?;
    self.state = SyncState::Pushed;
    Ok(indices.len())
  }

  /// Pull, generate, and show every diff. Never writes to the host.
  pub fn run_diff(&mut self, console: &mut dyn Console) -> Result<(), SyncError> {
    self.pull()?;
    self.generate()?;
    for diff in self.diff()? {
      console.show_diff(diff);
    }
    Ok(())
  }

  /// Pull, generate, diff, then push the changed files once confirmed.
  pub fn run_push(&mut self, console: &mut dyn Console, assume_yes: bool) -> Result<PushOutcome, SyncError> {
    self.pull()?;
    self.generate()?;
    self.diff()?;

    let set = self.set;
    let host = &set.unit.host;
    let changed = self.changed();
    if changed.is_empty() {
      info!(host = %host, "no configuration files to push");
      console.nothing_to_push(host);
      return Ok(PushOutcome::Nothing);
    }

    console.show_changed(host, &changed);
    let approved = assume_yes || console.confirm_push(host, &changed);
    self.confirm(approved)?;
    if !approved {
      warn!(host = %host, changed = changed.len(), "push declined, nothing written");
      return Ok(PushOutcome::Declined { changed });
    }

    self.push()?;
    info!(host = %host, pushed = changed.len(), "pushed configuration files");
    Ok(PushOutcome::Pushed { changed })
  }
}
