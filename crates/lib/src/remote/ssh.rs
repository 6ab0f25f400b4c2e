use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, warn};

use super::{Remote, RemoteContext, RemoteError, shell_quote};

/// How to reach hosts over SSH.
#[derive(Debug, Clone)]
pub struct SshConfig {
  /// Login user; `None` leaves it to the SSH client configuration.
  pub user: Option<String>,
  pub port: Option<u16>,
  pub connect_timeout_seconds: u32,
  /// Extra `-o` options.
  pub options: Vec<String>,
  pub ssh_program: PathBuf,
  pub scp_program: PathBuf,
}

impl Default for SshConfig {
  fn default() -> Self {
    Self {
      user: None,
      port: None,
      connect_timeout_seconds: 30,
      options: Vec::new(),
      ssh_program: PathBuf::from("ssh"),
      scp_program: PathBuf::from("scp"),
    }
  }
}

/// Remote reached with the system `ssh` and `scp` clients, using `sudo` for privileged steps.
#[derive(Debug)]
pub struct SshRemote {
  config: SshConfig,
  uploads: AtomicU32,
}

impl SshRemote {
  pub fn new(config: SshConfig) -> Self {
    Self {
      config,
      uploads: AtomicU32::new(0),
    }
  }

  fn target(&self, host: &str) -> String {
    match &self.config.user {
      Some(user) => format!("{}@{}", user, host),
      None => host.to_string(),
    }
  }

  fn common_options(&self) -> Vec<String> {
    let mut args = vec![
      "-o".to_string(),
      format!("ConnectTimeout={}", self.config.connect_timeout_seconds),
      "-o".to_string(),
      "BatchMode=yes".to_string(),
    ];
    for option in &self.config.options {
      args.push("-o".to_string());
      args.push(option.clone());
    }
    args
  }

  fn ssh(&self, ctx: &RemoteContext, remote_command: &str) -> Result<Output, RemoteError> {
    let mut args = self.common_options();
    if let Some(port) = self.config.port {
      args.push("-p".to_string());
      args.push(port.to_string());
    }
    args.push(self.target(&ctx.host));
    args.push(remote_command.to_string());

    debug!(host = %ctx.host, command = %remote_command, "ssh");
    Command::new(&self.config.ssh_program)
      .args(&args)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| RemoteError::Command {
        host: ctx.host.clone(),
        command: remote_command.to_string(),
        message: format!("failed to spawn ssh: {}", e),
      })
  }

  /// Run `command` through `sudo sh -c` and fail on a non-zero exit.
  fn sudo(&self, ctx: &RemoteContext, command: &str) -> Result<Output, RemoteError> {
    let output = self.ssh(ctx, &format!("sudo sh -c {}", shell_quote(command)))?;
    if !output.status.success() {
      return Err(RemoteError::Command {
        host: ctx.host.clone(),
        command: command.to_string(),
        message: failure_message(&output),
      });
    }
    Ok(output)
  }

  /// Best-effort removal of an upload that was never moved into place.
  fn remove_upload(&self, ctx: &RemoteContext, temp: &str) {
    match self.ssh(ctx, &format!("rm -f {}", shell_quote(temp))) {
      Ok(output) if output.status.success() => {}
      Ok(output) => {
        warn!(host = %ctx.host, path = %temp, error = %failure_message(&output), "failed to remove upload")
      }
      Err(e) => warn!(host = %ctx.host, path = %temp, error = %e, "failed to remove upload"),
    }
  }

  fn temp_path(&self) -> String {
    let n = self.uploads.fetch_add(1, Ordering::Relaxed);
    format!("/tmp/.confab-upload-{}-{}", std::process::id(), n)
  }
}

fn failure_message(output: &Output) -> String {
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
  match output.status.code() {
    Some(code) if stderr.is_empty() => format!("exit status {}", code),
    Some(code) => format!("exit status {}: {}", code, stderr),
    None => format!("terminated by signal: {}", stderr),
  }
}

#[cfg(unix)]
fn file_mode(path: &Path) -> std::io::Result<Option<u32>> {
  use std::os::unix::fs::PermissionsExt;
  Ok(Some(fs::metadata(path)?.permissions().mode() & 0o7777))
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> std::io::Result<Option<u32>> {
  Ok(None)
}

impl Remote for SshRemote {
  fn exists(&self, ctx: &RemoteContext, path: &str) -> Result<bool, RemoteError> {
    // The verdict is printed, so a failing sudo can't pass for a missing file.
    let command = format!("if test -e {}; then echo yes; else echo no; fi", shell_quote(path));
    let output = self.sudo(ctx, &command)?;
    match String::from_utf8_lossy(&output.stdout).trim() {
      "yes" => Ok(true),
      "no" => Ok(false),
      other => Err(RemoteError::Command {
        host: ctx.host.clone(),
        command,
        message: format!("unexpected output: {:?}", other),
      }),
    }
  }

  fn get(&self, ctx: &RemoteContext, remote_path: &str, local_path: &Path) -> Result<(), RemoteError> {
    let output = self
      .sudo(ctx, &format!("cat {}", shell_quote(remote_path)))
      .map_err(|e| RemoteError::Transfer {
        host: ctx.host.clone(),
        path: remote_path.to_string(),
        message: e.to_string(),
      })?;

    fs::write(local_path, &output.stdout).map_err(|source| RemoteError::Io {
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
    mirror_local_mode: bool,
  ) -> Result<(), RemoteError> {
    let transfer_error = |message: String| RemoteError::Transfer {
      host: ctx.host.clone(),
      path: remote_path.to_string(),
      message,
    };

    let mode = if mirror_local_mode {
      file_mode(local_path).map_err(|source| RemoteError::Io {
        host: ctx.host.clone(),
        path: local_path.to_path_buf(),
        source,
      })?
    } else {
      None
    };

    let temp = self.temp_path();
    let mut args = self.common_options();
    if let Some(port) = self.config.port {
      args.push("-P".to_string());
      args.push(port.to_string());
    }
    args.push(local_path.display().to_string());
    args.push(format!("{}:{}", self.target(&ctx.host), temp));

    debug!(host = %ctx.host, from = %local_path.display(), to = %temp, "scp");
    let output = Command::new(&self.config.scp_program)
      .args(&args)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| transfer_error(format!("failed to spawn scp: {}", e)))?;
    if !output.status.success() {
      return Err(transfer_error(failure_message(&output)));
    }

    let mut command = format!("mv {} {}", shell_quote(&temp), shell_quote(remote_path));
    if let Some(mode) = mode {
      command.push_str(&format!(" && chmod {:o} {}", mode, shell_quote(remote_path)));
    }

    if let Err(e) = self.sudo(ctx, &command) {
      self.remove_upload(ctx, &temp);
      return Err(e);
    }
    Ok(())
  }

  fn run_privileged(&self, ctx: &RemoteContext, command: &str) -> Result<String, RemoteError> {
    let output = self.sudo(ctx, command)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
  }
}
