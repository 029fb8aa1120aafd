//! Produce a full build plan for a sketch.
//!
//! Runs the whole import pipeline: key injection, preprocessing, library
//! closure and core-makefile resolution. Prints the plan; nothing is
//! compiled.
//!
//! ```bash
//! boardwalk plan --platform <dir> --board uno \
//!     --install-dir /opt/arduino ~/Arduino/blink/blink.ino
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::common::{BoardArgs, EnvArgs};
use crate::cli::libraries::toolchain_finder;
use crate::importer::Importer;

/// Command to print the resolved build plan for a sketch.
#[derive(Args)]
pub struct PlanCommand {
    #[command(flatten)]
    env: EnvArgs,

    #[command(flatten)]
    board: BoardArgs,

    /// Toolchain bin directory (defaults to the IDE's bundled toolchain)
    #[arg(long, value_name = "DIR")]
    toolchain: Option<PathBuf>,

    /// Keep preprocessed artifacts here instead of a scratch directory
    #[arg(long, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// Also write Makefile-Core into the build directory
    #[arg(long)]
    emit_makefile: bool,

    /// The sketch .ino file
    #[arg(value_name = "SKETCH")]
    sketch: PathBuf,
}

impl PlanCommand {
    /// Execute the plan command.
    pub async fn execute(self) -> Result<()> {
        let env = self.env.to_env();
        let mut config = self.board.board_configuration(&env)?;
        let tool_finder = toolchain_finder(&env, self.toolchain.as_deref())?;

        let importer = Importer::new(env, tool_finder);
        let plan = importer.import(&mut config, &self.sketch, self.build_dir.as_deref()).await?;

        println!("{} {}", "board:".bold(), plan.fqbn());
        println!(
            "{} {}",
            "preprocessed sketch:".bold(),
            plan.preprocessed().sketch_dir().display()
        );

        println!("{}", "libraries:".bold());
        for library in plan.libraries().all() {
            println!("  {}", library.display());
        }

        println!("{}", "core compile commands:".bold());
        for command in &plan.core_makefile().compile_commands {
            println!("  {command}");
        }
        println!("{}", "core archive commands:".bold());
        for command in &plan.core_makefile().archive_commands {
            println!("  {command}");
        }

        if self.emit_makefile {
            let path = plan.core_makefile().write_to(plan.preprocessed().preprocess_dir())?;
            println!("{} {}", "wrote".green(), path.display());
        }
        Ok(())
    }
}
