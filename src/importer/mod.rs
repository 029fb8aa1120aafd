//! Import orchestration.
//!
//! [`Importer::import`] runs the whole pipeline for one sketch: inject the
//! run-specific configuration keys, preprocess the sketch with
//! `arduino-builder`, close over the library dependencies with compiler
//! probes, and resolve the core-library makefile. The output is a
//! [`BuildPlan`]; spawning the planned commands is out of scope here.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::env::ArduinoEnv;
use crate::platform::BoardConfiguration;
use crate::preprocess::{PreprocessedSketch, SketchPreprocessor};
use crate::recipe::{CoreMakefile, CoreMakefileBuilder};
use crate::resolver::{GccDependencyProbe, LibraryClosure, LibraryResolver};
use crate::toolchain::{Tool, ToolFinder};

/// The IDE version recipes may interpolate via `{runtime.ide.version}`.
pub const IDE_VERSION: &str = "10802";

/// Drives one sketch import.
pub struct Importer {
    env: ArduinoEnv,
    tool_finder: ToolFinder,
}

/// Everything a caller needs to build the imported sketch.
#[derive(Debug)]
pub struct BuildPlan {
    fqbn: String,
    preprocessed: PreprocessedSketch,
    closure: LibraryClosure,
    core_makefile: CoreMakefile,
}

impl BuildPlan {
    /// The fully-qualified board name the plan was made for.
    pub fn fqbn(&self) -> &str {
        &self.fqbn
    }

    /// The preprocessed sketch artifacts. Scratch directories stay alive as
    /// long as the plan does.
    pub fn preprocessed(&self) -> &PreprocessedSketch {
        &self.preprocessed
    }

    /// The library closure: main and auxiliary directories.
    pub fn libraries(&self) -> &LibraryClosure {
        &self.closure
    }

    /// The resolved core-library makefile.
    pub fn core_makefile(&self) -> &CoreMakefile {
        &self.core_makefile
    }
}

impl Importer {
    /// Create an importer over an environment and a toolchain.
    pub fn new(env: ArduinoEnv, tool_finder: ToolFinder) -> Self {
        Self { env, tool_finder }
    }

    /// Import `ino_file` for `config`.
    ///
    /// When `build_dir` is given the preprocessed artifacts land there and
    /// are removed best-effort if the import fails partway; otherwise a
    /// scratch directory tied to the returned plan is used.
    pub async fn import(
        &self,
        config: &mut BoardConfiguration,
        ino_file: &Path,
        build_dir: Option<&Path>,
    ) -> Result<BuildPlan> {
        let dir_preexisted = build_dir.is_some_and(Path::exists);
        let result = self.run(config, ino_file, build_dir).await;
        if result.is_err() {
            if let Some(dir) = build_dir.filter(|_| !dir_preexisted) {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    warn!("could not remove partial build directory {}: {e}", dir.display());
                }
            }
        }
        result
    }

    async fn run(
        &self,
        config: &mut BoardConfiguration,
        ino_file: &Path,
        build_dir: Option<&Path>,
    ) -> Result<BuildPlan> {
        let compiler = self.tool_finder.find(Tool::CCompiler)?;
        let toolchain_root = self.tool_finder.toolchain_root(Tool::CCompiler)?;

        let core_dir = config.core_directory()?;
        info!("using core directory {}", core_dir.display());
        let variant_dir = config.variant_path().ok();
        info!(
            "using variant directory for board '{}': {:?}",
            config.board().id(),
            variant_dir
        );

        config.put_value("runtime.ide.version", IDE_VERSION);
        config.put_value("build.core.path", core_dir.display().to_string());
        config.put_value(
            "build.variant.path",
            variant_dir.map(|p| p.display().to_string()).unwrap_or_default(),
        );

        let preprocessor = SketchPreprocessor::new(self.env.clone());
        let preprocessed = preprocessor.preprocess(config, ino_file, build_dir).await?;
        // Stored pre-quoted: recipe templates interpolate {build.path}
        // without quoting it.
        config.put_value(
            "build.path",
            format!("\"{}\"", preprocessed.preprocess_dir().display()),
        );

        let probe = GccDependencyProbe::new(compiler);
        let resolver = LibraryResolver::new(
            probe,
            preprocessed.libraries_root(),
            config.core_dir_paths(),
        );
        let closure = resolver.resolve(preprocessed.main_libraries()).await?;
        info!(
            "library closure: {} main, {} auxiliary",
            closure.main.len(),
            closure.auxiliary.len()
        );

        let core_makefile = CoreMakefileBuilder::new(config, &toolchain_root).generate()?;

        Ok(BuildPlan {
            fqbn: config.fqbn(),
            preprocessed,
            closure,
            core_makefile,
        })
    }
}
