//! Compute the library closure for a sketch.
//!
//! Preprocesses the sketch with `arduino-builder`, then runs compiler
//! dependency probes until the set of required libraries stops growing.
//!
//! ```bash
//! boardwalk libraries --platform <dir> --board uno \
//!     --install-dir /opt/arduino ~/Arduino/blink/blink.ino
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::common::{BoardArgs, EnvArgs};
use crate::env::ArduinoEnv;
use crate::platform::BoardConfiguration;
use crate::preprocess::SketchPreprocessor;
use crate::resolver::{GccDependencyProbe, LibraryClosure, LibraryResolver};
use crate::toolchain::{Tool, ToolFinder};

/// Command to list a sketch's main and auxiliary libraries.
#[derive(Args)]
pub struct LibrariesCommand {
    #[command(flatten)]
    env: EnvArgs,

    #[command(flatten)]
    board: BoardArgs,

    /// Toolchain bin directory (defaults to the IDE's bundled toolchain)
    #[arg(long, value_name = "DIR")]
    toolchain: Option<PathBuf>,

    /// Keep preprocessor output here instead of a scratch directory
    #[arg(long, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// The sketch .ino file
    #[arg(value_name = "SKETCH")]
    sketch: PathBuf,
}

impl LibrariesCommand {
    /// Execute the libraries command.
    pub async fn execute(self) -> Result<()> {
        let env = self.env.to_env();
        let mut config = self.board.board_configuration(&env)?;
        let tool_finder = toolchain_finder(&env, self.toolchain.as_deref())?;

        let closure =
            compute_closure(&env, &tool_finder, &mut config, &self.sketch, self.build_dir.as_deref())
                .await?;

        println!("{}", "main libraries:".bold());
        for library in &closure.main {
            println!("  {}", library.display());
        }
        println!("{}", "auxiliary libraries:".bold());
        for library in &closure.auxiliary {
            println!("  {}", library.display());
        }
        Ok(())
    }
}

pub(crate) fn toolchain_finder(
    env: &ArduinoEnv,
    explicit: Option<&std::path::Path>,
) -> Result<ToolFinder> {
    let bin = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => env
            .tools_path()
            .map(|p| p.join("bin"))
            .ok_or_else(|| anyhow::anyhow!("no toolchain found; pass --toolchain or --install-dir"))?,
    };
    Ok(ToolFinder::new(bin))
}

pub(crate) async fn compute_closure(
    env: &ArduinoEnv,
    tool_finder: &ToolFinder,
    config: &mut BoardConfiguration,
    sketch: &std::path::Path,
    build_dir: Option<&std::path::Path>,
) -> Result<LibraryClosure> {
    let core_dir = config.core_directory()?;
    let variant_dir = config.variant_path().ok();
    config.put_value("build.core.path", core_dir.display().to_string());
    config.put_value(
        "build.variant.path",
        variant_dir.map(|p| p.display().to_string()).unwrap_or_default(),
    );

    let preprocessed = SketchPreprocessor::new(env.clone())
        .preprocess(config, sketch, build_dir)
        .await?;
    let probe = GccDependencyProbe::new(tool_finder.find(Tool::CCompiler)?);
    let resolver =
        LibraryResolver::new(probe, preprocessed.libraries_root(), config.core_dir_paths());
    Ok(resolver.resolve(preprocessed.main_libraries()).await?)
}
