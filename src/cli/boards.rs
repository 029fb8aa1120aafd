//! List the boards a platform declares.
//!
//! ```bash
//! boardwalk boards --platform ~/.arduino15/packages/arduino/hardware/avr/1.8.6
//! boardwalk boards --platform ... --options
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::platform::Platform;

/// Command to list a platform's boards and their option axes.
#[derive(Args)]
pub struct BoardsCommand {
    /// Platform root directory (the one containing platform.txt)
    #[arg(long, value_name = "DIR")]
    platform: PathBuf,

    /// Show each board's declared options and legal values
    #[arg(long)]
    options: bool,
}

impl BoardsCommand {
    /// Execute the boards command.
    pub async fn execute(self) -> Result<()> {
        let platform = Arc::new(
            Platform::from_directory(&self.platform, None)
                .with_context(|| format!("failed to parse '{}'", self.platform.display()))?,
        );

        let boards = platform.boards();
        println!(
            "{} {} — {} board(s)",
            format!("{}:{}", platform.vendor(), platform.architecture()).bold(),
            platform.display_name().unwrap_or_default(),
            boards.len()
        );
        for board in &boards {
            println!("{} {}", board.id().to_string().bold(), board.display_name().unwrap_or_default());
            if self.options {
                for option in board.options() {
                    println!(
                        "  {} ({}): {}",
                        option.id,
                        option.label.as_deref().unwrap_or_default().dimmed(),
                        option.values.join(", ")
                    );
                }
            }
        }
        Ok(())
    }
}
