//! Arduino installation and settings-directory detection.
//!
//! [`ArduinoEnv`] bundles the handful of well-known locations the importer
//! needs: the IDE install directory (for `arduino-builder`, the tools
//! builder and the built-in libraries), the settings directory (for the
//! board-manager `packages` tree) and the sketchbook (for user libraries).
//!
//! The environment is explicitly constructed and passed to whatever needs
//! it — there is no process-wide singleton — so tests can point it at a
//! fixture tree.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::platform::{ROOT_PLATFORM_ARCH, ROOT_PLATFORM_VENDOR};

/// Well-known Arduino locations for one import run.
#[derive(Debug, Clone, Default)]
pub struct ArduinoEnv {
    install_dir: Option<PathBuf>,
    settings_dir: Option<PathBuf>,
    sketchbook_dir: Option<PathBuf>,
}

impl ArduinoEnv {
    /// Detect default locations for the current user.
    ///
    /// Settings: `~/.arduino15` (`Library/Arduino15` on macOS,
    /// `%LOCALAPPDATA%\Arduino15` on Windows). Sketchbook: `~/Arduino`
    /// (`~/Documents/Arduino` on macOS/Windows). Missing directories are
    /// left unset; builder methods can fill them in explicitly.
    pub fn detect() -> Self {
        let home = dirs::home_dir();

        let settings_dir = settings_candidates(home.as_deref())
            .into_iter()
            .find(|p| p.exists());
        let sketchbook_dir = sketchbook_candidates(home.as_deref())
            .into_iter()
            .find(|p| p.exists());

        debug!(?settings_dir, ?sketchbook_dir, "detected arduino environment");
        Self { install_dir: None, settings_dir, sketchbook_dir }
    }

    /// Set the IDE install directory.
    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Set the settings directory (the `.arduino15`-style tree).
    #[must_use]
    pub fn with_settings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings_dir = Some(dir.into());
        self
    }

    /// Set the sketchbook directory.
    #[must_use]
    pub fn with_sketchbook_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sketchbook_dir = Some(dir.into());
        self
    }

    /// The IDE install directory, when known.
    pub fn install_dir(&self) -> Option<&Path> {
        self.install_dir.as_deref()
    }

    /// The settings directory, when known.
    pub fn settings_dir(&self) -> Option<&Path> {
        self.settings_dir.as_deref()
    }

    /// The board-manager packages tree under the settings directory.
    pub fn packages_path(&self) -> Option<PathBuf> {
        self.settings_dir.as_ref().map(|p| p.join("packages"))
    }

    /// The IDE's bundled hardware tree.
    pub fn hardware_path(&self) -> Option<PathBuf> {
        self.install_dir.as_ref().map(|p| p.join("hardware"))
    }

    /// Root directory of the bundled root platform
    /// (`<install>/hardware/arduino/avr`).
    pub fn root_platform_path(&self) -> Option<PathBuf> {
        self.hardware_path()
            .map(|p| p.join(ROOT_PLATFORM_VENDOR).join(ROOT_PLATFORM_ARCH))
    }

    /// The IDE's bundled toolchain directory
    /// (`<install>/hardware/tools/avr`).
    pub fn tools_path(&self) -> Option<PathBuf> {
        self.hardware_path().map(|p| p.join("tools").join(ROOT_PLATFORM_ARCH))
    }

    /// The IDE's `tools-builder` directory.
    pub fn tools_builder_path(&self) -> Option<PathBuf> {
        self.install_dir.as_ref().map(|p| p.join("tools-builder"))
    }

    /// The IDE's built-in libraries directory.
    pub fn built_in_libraries_path(&self) -> Option<PathBuf> {
        self.install_dir.as_ref().map(|p| p.join("libraries"))
    }

    /// The user libraries directory under the sketchbook.
    pub fn user_libraries_path(&self) -> Option<PathBuf> {
        self.sketchbook_dir.as_ref().map(|p| p.join("libraries"))
    }

    /// Path of the `arduino-builder` binary inside the install directory.
    pub fn arduino_builder_path(&self) -> Option<PathBuf> {
        let name = if cfg!(windows) { "arduino-builder.exe" } else { "arduino-builder" };
        self.install_dir.as_ref().map(|p| p.join(name))
    }

    /// The libraries root for a sketch: `<sketch>/../../libraries` when that
    /// directory exists (the sketch lives in a sketchbook), otherwise the
    /// user libraries directory.
    pub fn sketch_libraries_root(&self, ino_file: &Path) -> Option<PathBuf> {
        let sketchbook_libs = ino_file
            .parent()
            .and_then(Path::parent)
            .map(|p| p.join("libraries"));
        match sketchbook_libs {
            Some(p) if p.exists() => Some(p),
            _ => self.user_libraries_path(),
        }
    }
}

fn settings_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let Some(home) = home else { return Vec::new() };
    let mut candidates = Vec::new();
    if cfg!(target_os = "macos") {
        candidates.push(home.join("Library/Arduino15"));
    } else if cfg!(windows) {
        if let Some(local) = dirs::data_local_dir() {
            candidates.push(local.join("Arduino15"));
        }
    } else {
        candidates.push(home.join(".arduino15"));
        candidates.extend(snap_candidates(home, ".arduino15"));
    }
    candidates
}

fn sketchbook_candidates(home: Option<&Path>) -> Vec<PathBuf> {
    let Some(home) = home else { return Vec::new() };
    let mut candidates = Vec::new();
    if cfg!(target_os = "macos") || cfg!(windows) {
        if let Some(documents) = dirs::document_dir() {
            candidates.push(documents.join("Arduino"));
        }
    } else {
        candidates.push(home.join("Arduino"));
        candidates.extend(snap_candidates(home, "Arduino"));
    }
    candidates
}

// Snap-packaged IDEs keep their dot-directories under ~/snap/<pkg>/current.
fn snap_candidates(home: &Path, name: &str) -> Vec<PathBuf> {
    let snap = home.join("snap");
    let Ok(entries) = fs::read_dir(&snap) else { return Vec::new() };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("arduino"))
        .map(|e| e.path().join("current").join(name))
        .collect()
}
