//! Implementation of the `confab pull` command.

use std::path::Path;

use anyhow::Result;

use confab_lib::sync::RunCommand;

use super::{Session, check_failures};
use crate::Target;
use crate::output::{self, TerminalConsole};

/// Copy the current remote version of every configuration file into the remotes directory.
pub fn cmd_pull(config: &Path, target: &Target) -> Result<()> {
  let session = Session::open(config, target)?;
  let summary = session.run(RunCommand::Pull, target, false, &mut TerminalConsole::new())?;

  output::print_success(&format!(
    "Pulled {} configuration sets from {} hosts into {}",
    summary.sets,
    summary.hosts,
    session.settings.remotes_dir.display()
  ));
  check_failures(&summary)
}
