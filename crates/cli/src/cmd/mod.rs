mod diff;
mod generate;
mod pull;
mod push;

pub use diff::cmd_diff;
pub use generate::cmd_generate;
pub use pull::cmd_pull;
pub use push::cmd_push;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use confab_lib::data::{DataLoader, HookRegistry};
use confab_lib::remote::{LocalRemote, Remote, SshConfig, SshRemote};
use confab_lib::settings::Settings;
use confab_lib::sync::{Console, RunCommand, RunOptions, RunSummary, Runner};
use confab_lib::template::FileSystemTemplates;

use crate::Target;
use crate::output;

/// Everything a command needs, loaded from the configuration file.
struct Session {
  settings: Settings,
  templates: FileSystemTemplates,
  data: DataLoader,
  remote: Box<dyn Remote>,
}

impl Session {
  fn open(config: &Path, target: &Target) -> Result<Self> {
    let settings =
      Settings::load(config).with_context(|| format!("Failed to load configuration from {}", config.display()))?;

    let remote: Box<dyn Remote> = match &target.remote_root {
      Some(root) => {
        debug!(root = %root.display(), "using local remote");
        Box::new(LocalRemote::new(root.clone()))
      }
      None => Box::new(SshRemote::new(SshConfig::default())),
    };

    Ok(Self {
      templates: FileSystemTemplates::new(settings.templates_dirs.clone()),
      data: DataLoader::new(settings.data_dirs.clone(), HookRegistry::new()),
      settings,
      remote,
    })
  }

  fn run(&self, command: RunCommand, target: &Target, assume_yes: bool, console: &mut dyn Console) -> Result<RunSummary> {
    let options = RunOptions {
      environment: target.environment.clone(),
      hosts: target.hosts.clone(),
      roles: target.roles.clone(),
      assume_yes,
    };

    let runner = Runner::new(&self.settings, &self.templates, &self.data, self.remote.as_ref())?;
    let summary = runner
      .run(command, &options, console)
      .with_context(|| format!("{} failed", command.as_str()))?;
    Ok(summary)
  }
}

/// Report hosts abandoned during the run; an error if there were any.
fn check_failures(summary: &RunSummary) -> Result<()> {
  if summary.is_success() {
    return Ok(());
  }

  for failure in &summary.failed {
    output::print_error(&format!("{}: {}", failure.host, failure.message));
  }
  bail!("{} of {} hosts failed", summary.failed.len(), summary.hosts)
}
