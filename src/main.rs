//! Boardwalk CLI entry point
//!
//! Handles command-line argument parsing, error display, and command
//! execution.
//!
//! Available commands:
//! - `platforms` - List installed Arduino platforms
//! - `boards` - List a platform's boards and options
//! - `resolve` - Resolve configuration keys for a board
//! - `libraries` - Compute a sketch's library closure
//! - `plan` - Produce the full build plan for a sketch

use anyhow::Result;
use boardwalk::cli;
use boardwalk::core::error::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
