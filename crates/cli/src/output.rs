//! CLI output formatting utilities.
//!
//! Colored status messages, diff rendering, and the interactive console used
//! while pushing.

use owo_colors::{OwoColorize, Stream};

use confab_lib::conffile::{ConfFileDiff, DiffKind};
use confab_lib::sync::Console;

use crate::prompts;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.magenta()),
    message.if_supports_color(Stream::Stdout, |s| s.magenta())
  );
}

/// Color class of one unified diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
  Removed,
  Added,
  Context,
}

impl LineStyle {
  pub fn of(line: &str) -> Self {
    if line.starts_with('-') {
      LineStyle::Removed
    } else if line.starts_with('+') {
      LineStyle::Added
    } else {
      LineStyle::Context
    }
  }
}

fn print_diff_line(line: &str) {
  let line = line.trim_end();
  match LineStyle::of(line) {
    LineStyle::Removed => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.red())),
    LineStyle::Added => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.blue())),
    LineStyle::Context => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.green())),
  }
}

/// Console on stdout/stderr, prompting on the terminal.
#[derive(Debug, Default)]
pub struct TerminalConsole {
  changes_shown: usize,
}

impl TerminalConsole {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of diffs shown that had changes.
  pub fn changes_shown(&self) -> usize {
    self.changes_shown
  }
}

impl Console for TerminalConsole {
  fn show_diff(&mut self, diff: &ConfFileDiff) {
    if diff.has_changes() {
      self.changes_shown += 1;
    }

    match &diff.kind {
      DiffKind::BothMissing | DiffKind::Identical => {}
      DiffKind::RemoteOnly => {
        let message = format!("Only in remote: {}", diff.name);
        println!("{}", message.if_supports_color(Stream::Stdout, |s| s.red()));
      }
      DiffKind::GeneratedOnly => {
        let message = format!("Only in generated: {}", diff.name);
        println!("{}", message.if_supports_color(Stream::Stdout, |s| s.blue()));
      }
      DiffKind::Changed(lines) => {
        for line in lines {
          print_diff_line(line);
        }
      }
    }
  }

  fn nothing_to_push(&mut self, host: &str) {
    print_info(&format!("No configuration files to push for {}", host));
  }

  fn show_changed(&mut self, host: &str, changed: &[String]) {
    print_info(&format!("The following configuration files have changed for {}:", host));
    println!();
    for name in changed {
      let line = format!("\t{}", name);
      println!("{}", line.if_supports_color(Stream::Stdout, |s| s.magenta()));
    }
  }

  fn confirm_push(&mut self, host: &str, _changed: &[String]) -> bool {
    match prompts::confirm(&format!("Push configuration files to {}?", host)) {
      Ok(answer) => answer,
      Err(err) => {
        print_warning(&format!("Could not read confirmation: {}", err));
        false
      }
    }
  }
}
