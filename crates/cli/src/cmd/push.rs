//! Implementation of the `confab push` command.
//!
//! For each host: pull, generate and diff, list the changed files, and push them once
//! the user confirms (or `--yes` / `assume_yes` is set).

use std::path::Path;

use anyhow::Result;

use confab_lib::sync::RunCommand;

use super::{Session, check_failures};
use crate::Target;
use crate::output::{self, TerminalConsole};

pub fn cmd_push(config: &Path, target: &Target, yes: bool) -> Result<()> {
  let session = Session::open(config, target)?;
  let summary = session.run(RunCommand::Push, target, yes, &mut TerminalConsole::new())?;

  println!();
  if summary.pushed > 0 {
    output::print_success(&format!("Pushed {} configuration files", summary.pushed));
  }
  for host in &summary.declined {
    output::print_warning(&format!("Nothing pushed to {}", host));
  }
  check_failures(&summary)
}
