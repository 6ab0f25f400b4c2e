//! Implementation of the `confab diff` command.
//!
//! Pulls and generates every configuration file, then prints how the generated copy
//! differs from what is on the host. The hosts are never modified.

use std::path::Path;

use anyhow::Result;

use confab_lib::sync::RunCommand;

use super::{Session, check_failures};
use crate::Target;
use crate::output::TerminalConsole;

pub fn cmd_diff(config: &Path, target: &Target) -> Result<()> {
  let session = Session::open(config, target)?;
  let mut console = TerminalConsole::new();
  let summary = session.run(RunCommand::Diff, target, false, &mut console)?;

  if console.changes_shown() == 0 {
    println!("No differences");
  }
  check_failures(&summary)
}
