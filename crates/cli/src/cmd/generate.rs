//! Implementation of the `confab generate` command.
//!
//! Renders every configuration file of the selected hosts into the generated directory.
//! Nothing is read from or written to the hosts.

use std::path::Path;

use anyhow::Result;

use confab_lib::sync::RunCommand;

use super::{Session, check_failures};
use crate::Target;
use crate::output::{self, TerminalConsole};

pub fn cmd_generate(config: &Path, target: &Target) -> Result<()> {
  let session = Session::open(config, target)?;
  let summary = session.run(RunCommand::Generate, target, false, &mut TerminalConsole::new())?;

  output::print_success(&format!(
    "Generated {} configuration sets for {} hosts into {}",
    summary.sets,
    summary.hosts,
    session.settings.generated_dir.display()
  ));
  check_failures(&summary)
}
