use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use tracing::warn;

/// Ask a yes/no question on the terminal. Anything but "y" or "yes" is no.
///
/// Without a terminal there is nobody to ask, so the answer is no.
pub fn confirm(message: &str) -> Result<bool> {
  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    warn!("not running interactively, treating confirmation as no");
    return Ok(false);
  }

  write!(io::stderr(), "{} [y/N] ", message)?;
  io::stderr().flush()?;

  let mut input = String::new();
  io::stdin().read_line(&mut input)?;

  Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
  matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
