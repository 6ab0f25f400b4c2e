//! Running a command across every resolved host.
//!
//! Hosts are processed one at a time. A transport failure abandons the rest
//! of that host's sets and the run moves on to the next host; every other
//! error ends the run, wrapped in [`SyncError::Unit`] to name the host.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use super::{Console, PushOutcome, SyncError, SyncOrchestrator};
use crate::conffile::{ConfFiles, Discovery};
use crate::data::DataLoader;
use crate::mime::MimeClassifier;
use crate::remote::Remote;
use crate::resolve::{HostAndRole, Resolver, host_and_roles};
use crate::settings::Settings;
use crate::template::{TemplateFilter, TemplateSource};
use crate::util::fs::clear_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
  Generate,
  Pull,
  Diff,
  Push,
}

impl RunCommand {
  pub fn as_str(&self) -> &'static str {
    match self {
      RunCommand::Generate => "generate",
      RunCommand::Pull => "pull",
      RunCommand::Diff => "diff",
      RunCommand::Push => "push",
    }
  }

  fn uses_generated(&self) -> bool {
    !matches!(self, RunCommand::Pull)
  }

  fn uses_remotes(&self) -> bool {
    !matches!(self, RunCommand::Generate)
  }
}

/// Which hosts and roles to run against.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  pub environment: String,
  /// Explicit hosts; empty means all hosts of the environment.
  pub hosts: Vec<String>,
  /// Explicit roles; empty means every role of each host.
  pub roles: Vec<String>,
  pub assume_yes: bool,
}

/// A host abandoned after a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
  pub host: String,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub hosts: usize,
  pub sets: usize,
  /// Files pushed, across all hosts.
  pub pushed: usize,
  /// Hosts where a push was declined.
  pub declined: Vec<String>,
  pub failed: Vec<HostFailure>,
}

impl RunSummary {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

/// Runs commands with everything loaded from [`Settings`].
pub struct Runner<'a> {
  settings: &'a Settings,
  templates: &'a dyn TemplateSource,
  data: &'a DataLoader,
  remote: &'a dyn Remote,
  filter: TemplateFilter,
  mime: MimeClassifier,
}

impl<'a> Runner<'a> {
  pub fn new(
    settings: &'a Settings,
    templates: &'a dyn TemplateSource,
    data: &'a DataLoader,
    remote: &'a dyn Remote,
  ) -> Result<Self, SyncError> {
    Ok(Self {
      settings,
      templates,
      data,
      remote,
      filter: settings.template_filter()?,
      mime: settings.mime_classifier()?,
    })
  }

  /// Units of work, grouped by host in host order.
  fn plan(&self, options: &RunOptions) -> Result<BTreeMap<String, Vec<HostAndRole>>, SyncError> {
    if !self.settings.is_configured() {
      return Err(SyncError::NotConfigured);
    }

    let resolver = Resolver::new(&self.settings.environments, &self.settings.roles);
    let map = resolver.resolve(&options.environment, &options.hosts, &options.roles)?;

    let mut plan: BTreeMap<String, Vec<HostAndRole>> = BTreeMap::new();
    for unit in host_and_roles(&options.environment, &map) {
      plan.entry(unit.host.clone()).or_default().push(unit);
    }
    Ok(plan)
  }

  pub fn run(&self, command: RunCommand, options: &RunOptions, console: &mut dyn Console) -> Result<RunSummary, SyncError> {
    let plan = self.plan(options)?;
    let assume_yes = options.assume_yes || self.settings.assume_yes;
    let mut summary = RunSummary::default();

    for (host, units) in &plan {
      summary.hosts += 1;
      self.prepare_host(command, host)?;

      for unit in units {
        let set = self.discover(unit).map_err(|e| e.in_unit(unit))?;
        summary.sets += 1;
        info!(
          environment = %unit.environment,
          role = %unit.role,
          host = %unit.host,
          "running {}", command.as_str()
        );

        match self.run_set(command, &set, console, assume_yes) {
          Ok(Some(PushOutcome::Pushed { changed })) => summary.pushed += changed.len(),
          Ok(Some(PushOutcome::Declined { .. })) => summary.declined.push(host.clone()),
          Ok(_) => {}
          Err(e) => {
            if let Some(remote_error) = e.as_remote() {
              error!(host = %host, error = %remote_error, "aborting host");
              summary.failed.push(HostFailure {
                host: host.clone(),
                message: remote_error.to_string(),
              });
              break;
            }
            return Err(e.in_unit(unit));
          }
        }
      }
    }

    Ok(summary)
  }

  /// Clear this host's working directories once, before its first set.
  fn prepare_host(&self, command: RunCommand, host: &str) -> Result<(), SyncError> {
    let mut dirs = Vec::new();
    if command.uses_generated() {
      dirs.push(self.settings.generated_dir.join(host));
    }
    if command.uses_remotes() {
      dirs.push(self.settings.remotes_dir.join(host));
    }
    for dir in dirs {
      clear_dir(&dir).map_err(|source| SyncError::WorkDir { path: dir.clone(), source })?;
    }
    Ok(())
  }

  fn discover(&self, unit: &HostAndRole) -> Result<ConfFiles, SyncError> {
    let components = self.settings.components_of(&unit.role);
    let discovery = Discovery {
      templates: self.templates,
      filter: &self.filter,
      data: self.data,
      mime: &self.mime,
    };
    Ok(ConfFiles::discover(unit, &components, discovery)?)
  }

  fn run_set(
    &self,
    command: RunCommand,
    set: &ConfFiles,
    console: &mut dyn Console,
    assume_yes: bool,
  ) -> Result<Option<PushOutcome>, SyncError> {
    let generated: &Path = &self.settings.generated_dir;
    let remotes: &Path = &self.settings.remotes_dir;
    let mut orchestrator = SyncOrchestrator::new(set, self.remote, generated, remotes);

    match command {
      RunCommand::Generate => orchestrator.generate()?,
      RunCommand::Pull => orchestrator.pull()?,
      RunCommand::Diff => orchestrator.run_diff(console)?,
      RunCommand::Push => return orchestrator.run_push(console, assume_yes).map(Some),
    }
    Ok(None)
  }
}
