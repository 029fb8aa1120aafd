//! Argument blocks shared by several commands.

use anyhow::{anyhow, Result};
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::env::ArduinoEnv;
use crate::platform::{
    BoardConfiguration, Platform, ROOT_PLATFORM_ARCH, ROOT_PLATFORM_VENDOR,
};

/// Where the Arduino installation lives. Everything is optional; unset
/// values fall back to per-OS detection.
#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// Arduino IDE installation directory
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Arduino settings directory (the .arduino15-style tree)
    #[arg(long, value_name = "DIR")]
    pub settings_dir: Option<PathBuf>,

    /// Sketchbook directory
    #[arg(long, value_name = "DIR")]
    pub sketchbook: Option<PathBuf>,
}

impl EnvArgs {
    /// Detected environment with explicit flags layered on top.
    pub fn to_env(&self) -> ArduinoEnv {
        let mut env = ArduinoEnv::detect();
        if let Some(dir) = &self.install_dir {
            env = env.with_install_dir(dir);
        }
        if let Some(dir) = &self.settings_dir {
            env = env.with_settings_dir(dir);
        }
        if let Some(dir) = &self.sketchbook {
            env = env.with_sketchbook_dir(dir);
        }
        env
    }
}

/// Selects one board configuration: a platform root, a board id and zero or
/// more option choices.
#[derive(Args, Debug, Clone)]
pub struct BoardArgs {
    /// Platform root directory (the one containing platform.txt)
    #[arg(long, value_name = "DIR")]
    pub platform: PathBuf,

    /// Board id as declared in boards.txt
    #[arg(long, value_name = "ID")]
    pub board: String,

    /// Option choice, repeatable (e.g. --option cpu=8MHzatmega328)
    #[arg(long = "option", value_name = "OPT=VALUE")]
    pub options: Vec<String>,
}

impl BoardArgs {
    /// Parse the platform and build the selected board configuration.
    ///
    /// When the environment knows the bundled root platform and the selected
    /// platform is a different one, the root platform becomes its parent so
    /// lookups can fall through to the bundled defaults. Selecting the
    /// bundled tree itself yields the stock `arduino:avr` identity; its
    /// `<install>/hardware/arduino/avr` layout does not match the packages
    /// path pattern the identity derivation expects.
    pub fn board_configuration(&self, env: &ArduinoEnv) -> Result<BoardConfiguration> {
        let bundled_root = env.root_platform_path().filter(|p| p.exists());
        let platform = if bundled_root.as_deref() == Some(self.platform.as_path()) {
            Arc::new(Platform::from_root(
                None,
                ROOT_PLATFORM_VENDOR,
                ROOT_PLATFORM_ARCH,
                &self.platform,
            )?)
        } else {
            let parent = bundled_root.and_then(|root| {
                Platform::from_root(None, ROOT_PLATFORM_VENDOR, ROOT_PLATFORM_ARCH, root)
                    .ok()
                    .map(Arc::new)
            });
            Arc::new(Platform::from_directory(&self.platform, parent)?)
        };
        let board = platform.board(&self.board).ok_or_else(|| {
            anyhow!(
                "platform {}:{} declares no board '{}'",
                platform.vendor(),
                platform.architecture(),
                self.board
            )
        })?;
        let choices = parse_selections(&self.options)?;
        Ok(BoardConfiguration::new(Arc::new(board), &choices)?)
    }
}

/// Parse repeated `KEY=VALUE` pairs.
pub fn parse_selections(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected OPT=VALUE, got '{pair}'"))
        })
        .collect()
}
