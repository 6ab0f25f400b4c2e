mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use confab_lib::consts::CONFIG_FILENAME;

/// confab - render configuration files from templates and keep hosts in sync
#[derive(Parser)]
#[command(name = "confab")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

/// Selection of hosts shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Target {
  /// Environment to operate on
  pub environment: String,

  /// Restrict to these hosts (comma separated)
  #[arg(long, value_delimiter = ',')]
  pub hosts: Vec<String>,

  /// Restrict to these roles (comma separated)
  #[arg(long, value_delimiter = ',')]
  pub roles: Vec<String>,

  /// Treat DIR/<host>/ as each host's filesystem instead of connecting over ssh
  #[arg(long, value_name = "DIR")]
  pub remote_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Render configuration files into the generated directory
  Generate {
    #[command(flatten)]
    target: Target,
  },

  /// Copy the current configuration files from the hosts
  Pull {
    #[command(flatten)]
    target: Target,
  },

  /// Show differences between generated and remote configuration files
  Diff {
    #[command(flatten)]
    target: Target,
  },

  /// Push changed configuration files to the hosts
  Push {
    #[command(flatten)]
    target: Target,

    /// Push without asking for confirmation
    #[arg(short, long)]
    yes: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Generate { target } => cmd::cmd_generate(&cli.config, &target),
    Commands::Pull { target } => cmd::cmd_pull(&cli.config, &target),
    Commands::Diff { target } => cmd::cmd_diff(&cli.config, &target),
    Commands::Push { target, yes } => cmd::cmd_push(&cli.config, &target, yes),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      output::print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
