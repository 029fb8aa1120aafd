//! List the Arduino platforms installed on this machine.
//!
//! Walks the board-manager `packages` tree under the settings directory for
//! `platform.txt` files and adds the IDE's bundled root platform unless a
//! user-installed platform shadows it.
//!
//! ```bash
//! boardwalk platforms --install-dir /opt/arduino --settings-dir ~/.arduino15
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::common::EnvArgs;
use crate::platform::{discover_platforms, Platform, ROOT_PLATFORM_ARCH, ROOT_PLATFORM_VENDOR};

/// Command to list installed platforms.
#[derive(Args)]
pub struct PlatformsCommand {
    #[command(flatten)]
    env: EnvArgs,

    /// Also list each platform's boards
    #[arg(long)]
    boards: bool,
}

impl PlatformsCommand {
    /// Execute the platforms command.
    pub async fn execute(self) -> Result<()> {
        let env = self.env.to_env();

        let root_path = env
            .root_platform_path()
            .filter(|p| p.exists())
            .ok_or_else(|| anyhow!("no bundled platform found; pass --install-dir"))?;
        // The bundled tree is <install>/hardware/arduino/avr, which the
        // packages-layout identity derivation would misread; its identity
        // is fixed.
        let root = Arc::new(
            Platform::from_root(None, ROOT_PLATFORM_VENDOR, ROOT_PLATFORM_ARCH, &root_path)
                .with_context(|| format!("failed to parse '{}'", root_path.display()))?,
        );

        let platforms = match env.packages_path().filter(|p| p.exists()) {
            Some(packages) => discover_platforms(&packages, root)?,
            None => vec![root],
        };

        for platform in &platforms {
            println!(
                "{} {} ({})",
                format!("{}:{}", platform.vendor(), platform.architecture()).bold(),
                platform.display_name().unwrap_or_default(),
                platform.root().display().to_string().dimmed()
            );
            if self.boards {
                for board in platform.boards() {
                    println!("  {} {}", board.id(), board.display_name().unwrap_or_default().dimmed());
                }
            }
        }
        println!("{} platform(s)", platforms.len());
        Ok(())
    }
}
