// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Tokenyard CLI - Version yard for your design tokens

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tokenyard::commands::{self, CommandContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tokenyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (log errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "TOKENYARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Token root holding versions/ and active/
    #[arg(long, env = "TOKENYARD_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the active working set
    Init {
        /// Directory of token files to import
        #[arg(long)]
        source: Option<PathBuf>,

        /// First version to release
        #[arg(long)]
        version: Option<String>,

        /// Re-initialise an existing working set
        #[arg(long)]
        force: bool,
    },

    /// Validate, build and archive the active tokens as a new version
    Create {
        /// Version to create (default: derived from the changes)
        #[arg(long)]
        version: Option<String>,

        /// Release description
        #[arg(long)]
        description: Option<String>,

        /// Release status (alpha, beta, rc, stable, ...)
        #[arg(long)]
        status: Option<String>,

        /// Skip confirmations and overwrite an existing version
        #[arg(long)]
        force: bool,

        /// Show what would happen without building or writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List archived versions
    List,

    /// Restore an archived version into the active working set
    Activate {
        /// Version to activate
        version: String,

        /// Skip confirmation
        #[arg(long)]
        force: bool,

        /// Show what would happen without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Show token changes between two versions ("active" for the working set)
    Diff {
        /// Older version
        from: String,
        /// Newer version
        to: String,
    },

    /// Exit with status 1 if there are breaking changes between two versions
    CheckBreaking {
        /// Older version
        from: String,
        /// Newer version
        to: String,
    },

    /// Show version metadata ("active" for the working set)
    Info {
        /// Version to show
        version: String,
    },

    /// Show the effective configuration
    Config {
        /// Configuration key (omit for all)
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over -v/-q
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli { config, root, no_color, json, command, .. } = cli;

    if let Commands::Completions { shell } = command {
        commands::completions::run(shell, Cli::command())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = tokenyard::config::load(config.as_deref())?;
    if let Some(root) = root {
        config.root = root;
    }
    let color = !no_color && std::io::stdout().is_terminal();
    let ctx = CommandContext::new(config, json, color)?;

    // Execute command
    match command {
        Commands::Init { source, version, force } => {
            commands::init::run(&ctx, commands::init::InitArgs { source, version, force })?;
        }
        Commands::Create { version, description, status, force, dry_run } => {
            commands::create::run(
                &ctx,
                commands::create::CreateArgs { version, description, status, force, dry_run },
            )?;
        }
        Commands::List => commands::list::run(&ctx)?,
        Commands::Activate { version, force, dry_run } => {
            commands::activate::run(&ctx, &version, force, dry_run)?;
        }
        Commands::Diff { from, to } => commands::diff::run(&ctx, &from, &to)?,
        Commands::CheckBreaking { from, to } => {
            if commands::check_breaking::run(&ctx, &from, &to)? {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Info { version } => commands::info::run(&ctx, &version)?,
        Commands::Config { key } => commands::config::run(&ctx, key.as_deref())?,
        Commands::Completions { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_arguments_parse() {
        let cli = Cli::try_parse_from(["tokenyard", "create", "--version", "1.2.3"]).unwrap();
        assert!(matches!(cli.command, Commands::Create { version: Some(v), .. } if v == "1.2.3"));

        let cli = Cli::try_parse_from(["tokenyard", "info", "1.0.0"]).unwrap();
        assert!(matches!(cli.command, Commands::Info { version } if version == "1.0.0"));

        let cli = Cli::try_parse_from(["tokenyard", "init", "--version", "0.2.0"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { version: Some(v), .. } if v == "0.2.0"));
    }

    #[test]
    fn test_quiet_help_describes_logging() {
        let cmd = Cli::command();
        let quiet = cmd.get_arguments().find(|a| a.get_id() == "quiet").unwrap();
        let help = quiet.get_help().unwrap().to_string();
        assert!(help.contains("log errors only"));
    }
}
