//! Boardwalk - Arduino build-description importer
//!
//! Boardwalk reads Arduino-format vendor build descriptions (`platform.txt`
//! and `boards.txt` trees) and turns them into concrete build plans for a
//! specific sketch: resolved compiler command templates, resolved include
//! paths, and the complete set of library directories the sketch
//! transitively depends on.
//!
//! # Architecture Overview
//!
//! The model is a chain of configuration scopes with parent delegation:
//!
//! - a [`platform::Platform`] owns the `platform.txt` table and optionally
//!   delegates to the bundled root platform,
//! - a [`platform::Board`] layers the board's `boards.txt` keys on top,
//! - a [`platform::BoardConfiguration`] layers the chosen option values on
//!   top of that and is what recipes are resolved against.
//!
//! Lookups walk this chain with single-pass `{token}` interpolation and an
//! optional per-query overlay for runtime values like `{source_file}`.
//!
//! Importing a sketch then takes three steps (driven by
//! [`importer::Importer`]): preprocess the `.ino` with the external
//! `arduino-builder`, close over the library dependencies with per-file
//! compiler probes, and resolve the core-library makefile.
//!
//! # Core Modules
//!
//! - [`config`] - the scope trait, token interpolation and the description
//!   file parser
//! - [`platform`] - platforms, boards, options and board configurations
//! - [`recipe`] - recipe resolution and the core-library makefile
//! - [`preprocess`] - the `arduino-builder` adapter and its includes cache
//! - [`resolver`] - the library dependency closure
//! - [`importer`] - pipeline orchestration
//!
//! ## Supporting Modules
//!
//! - [`cli`] - command-line interface
//! - [`core`] - error types
//! - [`env`] - Arduino installation and settings-directory detection
//! - [`process`] - external process execution
//! - [`toolchain`] - toolchain binary lookup
//!
//! # Example
//!
//! ```no_run
//! use boardwalk::config::ConfigScope;
//! use boardwalk::platform::{BoardConfiguration, Platform};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let platform = Arc::new(Platform::from_directory(
//!     Path::new("/home/u/.arduino15/packages/arduino/hardware/avr/1.8.6"),
//!     None,
//! )?);
//! let board = Arc::new(platform.board("uno").expect("board exists"));
//! let config = BoardConfiguration::bare(board);
//! println!("{}", config.fqbn());
//! println!("{:?}", config.value("build.mcu"));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod env;
pub mod importer;
pub mod platform;
pub mod preprocess;
pub mod process;
pub mod recipe;
pub mod resolver;
pub mod toolchain;
