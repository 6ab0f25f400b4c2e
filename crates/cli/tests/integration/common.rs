//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory.
///
/// Holds `confab.lua`, the templates and data trees, and a `hosts/` directory
/// standing in for the remote hosts (passed as `--remote-root`).
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create from a fixture file, copied to `confab.lua`.
  pub fn from_fixture(name: &str) -> Self {
    Self::with_config(&fixture_content(name))
  }

  pub fn with_config(config: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("confab.lua", config);
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> Option<String> {
    std::fs::read_to_string(self.path().join(relative_path)).ok()
  }

  /// Write a file as it exists on `host`.
  pub fn write_remote(&self, host: &str, remote_path: &str, content: &str) {
    self.write_file(&format!("hosts/{}/{}", host, remote_path.trim_start_matches('/')), content);
  }

  pub fn read_remote(&self, host: &str, remote_path: &str) -> Option<String> {
    self.read_file(&format!("hosts/{}/{}", host, remote_path.trim_start_matches('/')))
  }

  /// The confab binary, run from the project directory.
  pub fn confab_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("confab");
    cmd.current_dir(self.path());
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Run `command` against the local hosts directory.
  pub fn run(&self, command: &str, environment: &str) -> Command {
    let mut cmd = self.confab_cmd();
    cmd.args([command, environment, "--remote-root", "hosts"]);
    cmd
  }
}

/// The webfarm fixture with a template per component.
pub fn webfarm() -> TestEnv {
  let env = TestEnv::from_fixture("webfarm.lua");
  env.write_file("templates/nginx/etc/nginx/nginx.conf", "server_name {{ confab.host }};\nworkers {{ workers }};");
  env.write_file("templates/nginx/etc/nginx/.nginx.conf.swp", "swap");
  env.write_file("templates/motd/etc/motd", "{{ confab.host }} is a {{ confab.role }} host in {{ confab.environment }}");
  env.write_file("data/default.lua", "return { workers = 2 }");
  env.write_file("data/host/web2.lua", "workers = 16");
  env
}
