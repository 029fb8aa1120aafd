//! Sketch preprocessing via `arduino-builder`.
//!
//! Importing a sketch starts by handing the `.ino` file to the IDE's own
//! `arduino-builder -preprocess`. That produces a compilable C++ rendition
//! of the sketch under `<build>/sketch/` and an `includes.cache` naming the
//! libraries the sketch includes directly. [`SketchPreprocessor`] drives
//! the tool; [`includes_cache`] parses its side channel.

pub mod includes_cache;

pub use includes_cache::{parse_includes_cache, parse_includes_cache_str};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::BoardwalkError;
use crate::env::ArduinoEnv;
use crate::platform::BoardConfiguration;
use crate::process::ProcessRunner;

/// Name of the preprocessor's library side-channel file.
pub const INCLUDES_CACHE_FILENAME: &str = "includes.cache";

/// Runs `arduino-builder -preprocess` for one sketch.
#[derive(Debug, Clone)]
pub struct SketchPreprocessor {
    env: ArduinoEnv,
}

/// What a successful preprocess run leaves behind.
#[derive(Debug)]
pub struct PreprocessedSketch {
    preprocess_dir: PathBuf,
    main_libraries: Vec<PathBuf>,
    libraries_root: PathBuf,
    // Held so a scratch build directory outlives the resolver pass and is
    // removed when the result is dropped.
    _scratch: Option<TempDir>,
}

impl PreprocessedSketch {
    /// The build directory the preprocessor ran in.
    pub fn preprocess_dir(&self) -> &Path {
        &self.preprocess_dir
    }

    /// Directory holding the preprocessed sketch sources.
    pub fn sketch_dir(&self) -> PathBuf {
        self.preprocess_dir.join("sketch")
    }

    /// Library directories the sketch includes directly, in cache order.
    pub fn main_libraries(&self) -> &[PathBuf] {
        &self.main_libraries
    }

    /// The libraries root the preprocessor searched.
    pub fn libraries_root(&self) -> &Path {
        &self.libraries_root
    }
}

impl SketchPreprocessor {
    /// Create a preprocessor for the given environment.
    pub fn new(env: ArduinoEnv) -> Self {
        Self { env }
    }

    /// Preprocess `ino_file` for `config`.
    ///
    /// When `build_dir` is `None` a scratch directory is created and tied to
    /// the returned [`PreprocessedSketch`]. A nonzero `arduino-builder` exit
    /// is fatal: nothing downstream can run without the preprocessed sketch.
    pub async fn preprocess(
        &self,
        config: &BoardConfiguration,
        ino_file: &Path,
        build_dir: Option<&Path>,
    ) -> Result<PreprocessedSketch> {
        let ino_file = ino_file
            .canonicalize()
            .with_context(|| format!("sketch file '{}' not found", ino_file.display()))?;

        let (preprocess_dir, scratch) = match build_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("cannot create build directory '{}'", dir.display()))?;
                (dir.to_path_buf(), None)
            }
            None => {
                let tmp = tempfile::tempdir().context("cannot create scratch build directory")?;
                (tmp.path().to_path_buf(), Some(tmp))
            }
        };

        let libraries_root = self
            .env
            .sketch_libraries_root(&ino_file)
            .ok_or_else(|| BoardwalkError::MalformedInput {
                path: ino_file.clone(),
                reason: "no libraries directory next to the sketchbook and no sketchbook configured"
                    .into(),
            })?;

        let runner = self.builder_command(config, &ino_file, &libraries_root, &preprocess_dir)?;
        let code = runner.run_streaming(|line| debug!("{line}")).await?;
        if code != 0 {
            return Err(BoardwalkError::ExternalToolFailure {
                tool: "arduino-builder".into(),
                code,
            }
            .into());
        }

        let cache_path = preprocess_dir.join(INCLUDES_CACHE_FILENAME);
        let main_libraries = if cache_path.exists() {
            parse_includes_cache(&cache_path)?
        } else {
            // Sketches with no library includes may not leave a cache behind.
            warn!("no {INCLUDES_CACHE_FILENAME} at {}", cache_path.display());
            Vec::new()
        };

        Ok(PreprocessedSketch {
            preprocess_dir,
            main_libraries,
            libraries_root,
            _scratch: scratch,
        })
    }

    fn builder_command(
        &self,
        config: &BoardConfiguration,
        ino_file: &Path,
        libraries_root: &Path,
        preprocess_dir: &Path,
    ) -> Result<ProcessRunner, BoardwalkError> {
        let builder = self
            .env
            .arduino_builder_path()
            .filter(|p| p.exists())
            .ok_or_else(|| BoardwalkError::ToolNotFound { tool: "arduino-builder".into() })?;

        let mut runner = ProcessRunner::new(builder.to_string_lossy())
            .arg("-preprocess")
            .arg("-logger=human");

        if let Some(hardware) = self.env.hardware_path() {
            runner = runner.arg("-hardware").arg(hardware.to_string_lossy());
        }
        if let Some(packages) = self.env.packages_path().filter(|p| p.exists()) {
            runner = runner.arg("-hardware").arg(packages.to_string_lossy());
        }
        if let Some(tools_builder) = self.env.tools_builder_path() {
            runner = runner.arg("-tools").arg(tools_builder.to_string_lossy());
        }
        if let Some(tools) = self.env.tools_path() {
            runner = runner.arg("-tools").arg(tools.to_string_lossy());
        }
        if let Some(packages) = self.env.packages_path().filter(|p| p.exists()) {
            runner = runner.arg("-tools").arg(packages.to_string_lossy());
        }
        if let Some(built_in) = self.env.built_in_libraries_path() {
            runner = runner.arg("-built-in-libraries").arg(built_in.to_string_lossy());
        }
        runner = runner
            .arg("-libraries")
            .arg(libraries_root.to_string_lossy())
            .arg(format!("-fqbn={}", config.fqbn()))
            .arg("-build-path")
            .arg(".")
            .arg("-verbose")
            .arg(ino_file.to_string_lossy());

        // -build-path is relative, so the builder must run inside the
        // preprocess directory.
        Ok(runner.current_dir(preprocess_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        env: ArduinoEnv,
        config: BoardConfiguration,
        ino_file: PathBuf,
    }

    fn fixture(builder_script: &str) -> Fixture {
        let root = TempDir::new().unwrap();
        let install = root.path().join("arduino-ide");
        fs::create_dir_all(install.join("hardware")).unwrap();
        fs::create_dir_all(install.join("tools-builder")).unwrap();
        fs::create_dir_all(install.join("libraries")).unwrap();

        let platform_dir = install.join("hardware/arduino/avr");
        fs::create_dir_all(&platform_dir).unwrap();
        fs::write(platform_dir.join("platform.txt"), "name=Arduino AVR\n").unwrap();
        fs::write(platform_dir.join("boards.txt"), "uno.name=Arduino Uno\n").unwrap();

        let sketchbook = root.path().join("sketchbook");
        fs::create_dir_all(sketchbook.join("libraries/Servo/src")).unwrap();
        let sketch_dir = sketchbook.join("blink");
        fs::create_dir_all(&sketch_dir).unwrap();
        let ino_file = sketch_dir.join("blink.ino");
        fs::write(&ino_file, "void setup() {}\nvoid loop() {}\n").unwrap();

        let builder = install.join("arduino-builder");
        fs::write(&builder, builder_script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&builder, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let env = ArduinoEnv::default()
            .with_install_dir(&install)
            .with_sketchbook_dir(&sketchbook);
        let platform =
            Arc::new(Platform::from_root(None, "arduino", "avr", &platform_dir).unwrap());
        let board = Arc::new(platform.board("uno").unwrap());
        let config = BoardConfiguration::new(board, &HashMap::new()).unwrap();

        Fixture { root, env, config, ino_file }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_collects_main_libraries() {
        let fx = fixture(concat!(
            "#!/bin/sh\n",
            "echo 'Detecting libraries used...'\n",
            "mkdir -p sketch\n",
            "servo_dir=$(dirname \"$0\")/../sketchbook/libraries/Servo/src\n",
            "printf '[{\"Sourcefile\":\"blink.ino.cpp\",\"Include\":\"Servo.h\",",
            "\"Includepath\":\"%s\"}]' \"$servo_dir\" > includes.cache\n",
        ));
        let build_dir = fx.root.path().join("build");

        let result = SketchPreprocessor::new(fx.env.clone())
            .preprocess(&fx.config, &fx.ino_file, Some(&build_dir))
            .await
            .unwrap();

        assert_eq!(result.preprocess_dir(), build_dir);
        assert_eq!(result.sketch_dir(), build_dir.join("sketch"));
        assert_eq!(result.main_libraries().len(), 1);
        assert!(result.main_libraries()[0].ends_with("libraries/Servo"));
        assert!(result.libraries_root().ends_with("sketchbook/libraries"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn builder_receives_fqbn_and_preprocess_flags() {
        let fx = fixture("#!/bin/sh\nprintf '%s\\n' \"$@\" > args.txt\n");
        let build_dir = fx.root.path().join("build");

        SketchPreprocessor::new(fx.env.clone())
            .preprocess(&fx.config, &fx.ino_file, Some(&build_dir))
            .await
            .unwrap();

        let args = fs::read_to_string(build_dir.join("args.txt")).unwrap();
        assert!(args.lines().any(|l| l == "-preprocess"));
        assert!(args.lines().any(|l| l == "-fqbn=arduino:avr:uno"));
        assert!(args.lines().any(|l| l == "-logger=human"));
        assert!(args.lines().any(|l| l.ends_with("blink.ino")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_builder_exit_is_fatal() {
        let fx = fixture("#!/bin/sh\necho 'boom' >&2\nexit 4\n");
        let build_dir = fx.root.path().join("build");

        let err = SketchPreprocessor::new(fx.env.clone())
            .preprocess(&fx.config, &fx.ino_file, Some(&build_dir))
            .await
            .unwrap_err();
        let err = err.downcast::<BoardwalkError>().unwrap();
        assert!(
            matches!(err, BoardwalkError::ExternalToolFailure { ref tool, code: 4 } if tool == "arduino-builder")
        );
    }

    #[tokio::test]
    async fn missing_builder_binary_is_reported() {
        let fx = fixture("");
        fs::remove_file(fx.env.arduino_builder_path().unwrap()).unwrap();

        let err = SketchPreprocessor::new(fx.env.clone())
            .preprocess(&fx.config, &fx.ino_file, None)
            .await
            .unwrap_err();
        let err = err.downcast::<BoardwalkError>().unwrap();
        assert!(matches!(err, BoardwalkError::ToolNotFound { .. }));
    }
}
