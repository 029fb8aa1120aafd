//! Resolve configuration keys against a board configuration.
//!
//! Looks keys up through the whole scope chain (configuration, selected
//! options, board, platform, parent platform) with token interpolation, the
//! same way recipes are resolved.
//!
//! ```bash
//! boardwalk resolve --platform <dir> --board uno recipe.c.o.pattern
//! boardwalk resolve --platform <dir> --board pro --option cpu=8MHzatmega328 \
//!     --with source_file=wiring.c --with object_file=wiring.c.o build.mcu
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::common::{parse_selections, BoardArgs, EnvArgs};
use crate::config::{ConfigScope, RuntimeOverlay};

/// Command to resolve one or more configuration keys.
#[derive(Args)]
pub struct ResolveCommand {
    #[command(flatten)]
    env: EnvArgs,

    #[command(flatten)]
    board: BoardArgs,

    /// Runtime overlay entry, repeatable (e.g. --with source_file=a.c)
    #[arg(long = "with", value_name = "KEY=VALUE")]
    overlay: Vec<String>,

    /// Keys to resolve
    #[arg(value_name = "KEY", required = true)]
    keys: Vec<String>,
}

impl ResolveCommand {
    /// Execute the resolve command.
    pub async fn execute(self) -> Result<()> {
        let env = self.env.to_env();
        let config = self.board.board_configuration(&env)?;
        let overlay: RuntimeOverlay = parse_selections(&self.overlay)?;

        for key in &self.keys {
            match config.value_overlaid(key, &overlay) {
                Some(value) => println!("{} = {value}", key.bold()),
                None => println!("{} {}", key.bold(), "(not defined)".yellow()),
            }
        }
        Ok(())
    }
}
