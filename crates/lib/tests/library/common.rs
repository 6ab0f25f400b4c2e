//! Shared helpers for library integration tests.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use confab_lib::conffile::ConfFileDiff;
use confab_lib::data::{DataLoader, HookRegistry};
use confab_lib::remote::{LocalRemote, Remote, RemoteContext, RemoteError};
use confab_lib::settings::Settings;
use confab_lib::sync::{Console, RunCommand, RunOptions, RunSummary, Runner, SyncError};
use confab_lib::template::FileSystemTemplates;
use tempfile::TempDir;

/// A project directory with a `confab.lua` and a local remote under `hosts/`.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new(config: &str) -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write("confab.lua", config);
    project
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.path().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn read(&self, relative: &str) -> Option<String> {
    std::fs::read_to_string(self.path().join(relative)).ok()
  }

  pub fn settings(&self) -> Settings {
    Settings::load(&self.path().join("confab.lua")).unwrap()
  }

  pub fn hosts_dir(&self) -> PathBuf {
    self.path().join("hosts")
  }

  /// Write a file onto a host of the local remote.
  pub fn write_remote(&self, host: &str, remote_path: &str, content: &str) {
    let relative = format!("hosts/{}/{}", host, remote_path.trim_start_matches('/'));
    self.write(&relative, content);
  }

  pub fn read_remote(&self, host: &str, remote_path: &str) -> Option<String> {
    self.read(&format!("hosts/{}/{}", host, remote_path.trim_start_matches('/')))
  }

  pub fn run(
    &self,
    command: RunCommand,
    options: &RunOptions,
    remote: &dyn Remote,
    console: &mut dyn Console,
  ) -> Result<RunSummary, SyncError> {
    let settings = self.settings();
    let templates = FileSystemTemplates::new(settings.templates_dirs.clone());
    let data = DataLoader::new(settings.data_dirs.clone(), HookRegistry::new());
    Runner::new(&settings, &templates, &data, remote)?.run(command, options, console)
  }
}

pub fn options(environment: &str) -> RunOptions {
  RunOptions {
    environment: environment.to_string(),
    ..RunOptions::default()
  }
}

/// Local remote that counts mutating calls.
pub struct RecordingRemote {
  inner: LocalRemote,
  puts: Cell<usize>,
  dirs: Cell<usize>,
}

impl RecordingRemote {
  pub fn new(root: PathBuf) -> Self {
    Self {
      inner: LocalRemote::new(root),
      puts: Cell::new(0),
      dirs: Cell::new(0),
    }
  }

  /// Mutating calls of any kind.
  pub fn writes(&self) -> usize {
    self.puts.get() + self.dirs.get()
  }

  pub fn puts(&self) -> usize {
    self.puts.get()
  }
}

impl Remote for RecordingRemote {
  fn exists(&self, ctx: &RemoteContext, path: &str) -> Result<bool, RemoteError> {
    self.inner.exists(ctx, path)
  }

  fn get(&self, ctx: &RemoteContext, remote_path: &str, local_path: &Path) -> Result<(), RemoteError> {
    self.inner.get(ctx, remote_path, local_path)
  }

  fn put(&self, ctx: &RemoteContext, local_path: &Path, remote_path: &str, mirror: bool) -> Result<(), RemoteError> {
    self.puts.set(self.puts.get() + 1);
    self.inner.put(ctx, local_path, remote_path, mirror)
  }

  fn run_privileged(&self, ctx: &RemoteContext, command: &str) -> Result<String, RemoteError> {
    self.dirs.set(self.dirs.get() + 1);
    self.inner.run_privileged(ctx, command)
  }

  fn make_dirs(&self, ctx: &RemoteContext, dir: &str) -> Result<(), RemoteError> {
    self.dirs.set(self.dirs.get() + 1);
    self.inner.make_dirs(ctx, dir)
  }
}

/// Console with a fixed answer.
#[derive(Default)]
pub struct TestConsole {
  pub answer: bool,
  pub diffs: Vec<ConfFileDiff>,
  pub prompts: Vec<(String, Vec<String>)>,
}

impl TestConsole {
  pub fn answering(answer: bool) -> Self {
    Self {
      answer,
      ..Self::default()
    }
  }

  /// Remote paths of the shown diffs that have changes.
  pub fn changed(&self) -> Vec<String> {
    self
      .diffs
      .iter()
      .filter(|d| d.has_changes())
      .map(|d| d.name.clone())
      .collect()
  }
}

impl Console for TestConsole {
  fn show_diff(&mut self, diff: &ConfFileDiff) {
    self.diffs.push(diff.clone());
  }

  fn nothing_to_push(&mut self, _host: &str) {}

  fn confirm_push(&mut self, host: &str, changed: &[String]) -> bool {
    self.prompts.push((host.to_string(), changed.to_vec()));
    self.answer
  }
}
