//! Command-line interface for boardwalk.
//!
//! Each command lives in its own module as a clap `Args` struct with an
//! `async fn execute(self) -> Result<()>`:
//!
//! - `platforms` — list installed Arduino platforms
//! - `boards` — list a platform's boards and option axes
//! - `resolve` — resolve configuration keys through the scope chain
//! - `libraries` — compute a sketch's library closure
//! - `plan` — run the whole import pipeline and print the build plan
//!
//! ```bash
//! boardwalk platforms --install-dir /opt/arduino
//! boardwalk boards --platform <dir> --options
//! boardwalk resolve --platform <dir> --board uno recipe.c.o.pattern
//! boardwalk plan --platform <dir> --board uno blink.ino
//! ```

mod boards;
pub mod common;
mod libraries;
mod plan;
mod platforms;
mod resolve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Top-level CLI: global verbosity flags plus one subcommand.
#[derive(Parser)]
#[command(
    name = "boardwalk",
    about = "Import Arduino-style build descriptions into concrete build plans",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List installed Arduino platforms
    Platforms(platforms::PlatformsCommand),

    /// List a platform's boards and their options
    Boards(boards::BoardsCommand),

    /// Resolve configuration keys for a board configuration
    Resolve(resolve::ResolveCommand),

    /// Compute the library dependency closure for a sketch
    Libraries(libraries::LibrariesCommand),

    /// Produce the full build plan for a sketch
    Plan(plan::PlanCommand),
}

impl Cli {
    /// Initialize logging and dispatch to the selected command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        match self.command {
            Commands::Platforms(cmd) => cmd.execute().await,
            Commands::Boards(cmd) => cmd.execute().await,
            Commands::Resolve(cmd) => cmd.execute().await,
            Commands::Libraries(cmd) => cmd.execute().await,
            Commands::Plan(cmd) => cmd.execute().await,
        }
    }

    fn init_logging(&self) {
        let filter = if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
