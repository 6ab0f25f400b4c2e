use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{ConfFile, ConfFileDiff, ConfFileError};
use crate::data::{ComponentContext, DataLoader};
use crate::mime::MimeClassifier;
use crate::remote::{Remote, RemoteContext};
use crate::resolve::HostAndRole;
use crate::template::{TemplateFilter, TemplateSource};

/// What a [`ConfFiles`] set is discovered from.
#[derive(Clone, Copy)]
pub struct Discovery<'a> {
  pub templates: &'a dyn TemplateSource,
  pub filter: &'a TemplateFilter,
  pub data: &'a DataLoader,
  pub mime: &'a MimeClassifier,
}

/// All configuration files of one role on one host.
#[derive(Debug, Clone)]
pub struct ConfFiles {
  pub unit: HostAndRole,
  pub conffiles: Vec<ConfFile>,
}

impl ConfFiles {
  /// Discover the templates of every component of the role and bind them to the host's data.
  ///
  /// Data is loaded once per component; templates keep discovery order.
  pub fn discover(unit: &HostAndRole, components: &[String], discovery: Discovery<'_>) -> Result<Self, ConfFileError> {
    let mut conffiles = Vec::new();

    for component in components {
      debug!(component = %component, role = %unit.role, "including templates");
      let names = discovery
        .templates
        .list_templates(component, &|name: &str| discovery.filter.accepts(name))?;
      debug!(component = %component, templates = %names.join(", "), "found templates");
      if names.is_empty() {
        continue;
      }

      let context = ComponentContext {
        environment: unit.environment.clone(),
        host: unit.host.clone(),
        role: unit.role.clone(),
        component: component.clone(),
      };
      let data = Arc::new(discovery.data.load(&context)?);

      for name in names {
        let template = discovery.templates.get_template(component, &name)?;
        conffiles.push(ConfFile::new(template, Arc::clone(&data), discovery.mime)?);
      }
    }

    if conffiles.is_empty() {
      warn!(
        role = %unit.role,
        host = %unit.host,
        environment = %unit.environment,
        "no conffiles found"
      );
    }

    Ok(Self {
      unit: unit.clone(),
      conffiles,
    })
  }

  pub fn is_empty(&self) -> bool {
    self.conffiles.is_empty()
  }

  pub fn context(&self) -> RemoteContext {
    RemoteContext::from(&self.unit)
  }

  /// This host's directory under a working root.
  pub fn host_dir(&self, root: &Path) -> PathBuf {
    root.join(&self.unit.host)
  }

  pub fn generate(&self, generated_dir: &Path) -> Result<(), ConfFileError> {
    let dir = self.host_dir(generated_dir);
    for conffile in &self.conffiles {
      conffile.generate(&dir)?;
    }
    Ok(())
  }

  pub fn pull(&self, remote: &dyn Remote, remotes_dir: &Path) -> Result<(), ConfFileError> {
    let dir = self.host_dir(remotes_dir);
    let ctx = self.context();
    for conffile in &self.conffiles {
      conffile.pull(remote, &ctx, &dir)?;
    }
    Ok(())
  }

  /// Diff every file, in discovery order.
  pub fn diff(&self, generated_dir: &Path, remotes_dir: &Path) -> Result<Vec<ConfFileDiff>, ConfFileError> {
    let generated = self.host_dir(generated_dir);
    let remotes = self.host_dir(remotes_dir);
    self
      .conffiles
      .iter()
      .map(|conffile| conffile.diff(&generated, &remotes))
      .collect()
  }

  /// Push the files at `indices`.
  pub fn push(&self, remote: &dyn Remote, generated_dir: &Path, indices: &[usize]) -> Result<(), ConfFileError> {
    let dir = self.host_dir(generated_dir);
    let ctx = self.context();
    for conffile in indices.iter().filter_map(|&i| self.conffiles.get(i)) {
      conffile.push(remote, &ctx, &dir)?;
    }
    Ok(())
  }
}
