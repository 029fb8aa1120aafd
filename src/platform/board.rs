//! Board scopes and the option matrix.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::{ConfigScope, RuntimeOverlay};
use crate::core::BoardwalkError;
use crate::platform::{Platform, VARIANTS_DIRNAME};

/// Identifier of a board within its platform, e.g. `uno`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardId(String);

impl BoardId {
    /// Wrap a board id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configuration axis declared by a board (e.g. `cpu`), with its
/// enumerated legal values in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardOption {
    /// Option id, the segment after `menu.` in the composite keys.
    pub id: String,
    /// Human-readable label from the platform-wide `menu.<id>` key.
    pub label: Option<String>,
    /// Legal values, in `boards.txt` declaration order.
    pub values: Vec<String>,
}

impl BoardOption {
    /// Whether `value` is one of the declared legal values.
    pub fn is_legal(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Source-file extensions considered part of a core or variant.
const CORE_SOURCE_EXTENSIONS: [&str; 3] = ["c", "cpp", "S"];

fn is_core_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CORE_SOURCE_EXTENSIONS.contains(&e))
}

/// Configuration scope for one board, nested under its [`Platform`].
///
/// Flat keys are namespaced `<boardId>.<key>` in the shared boards table;
/// the board resolves un-prefixed keys by prepending its id and falls back
/// to the platform chain. A handful of keys are synthesized at construction
/// (`fqbn`, `build.arch`, and a derived `ldscript-debug` name) and the scope
/// is read-only afterwards.
#[derive(Debug)]
pub struct Board {
    platform: Arc<Platform>,
    id: BoardId,
    data: IndexMap<String, String>,
    options: Vec<BoardOption>,
}

impl Board {
    pub(crate) fn new(platform: Arc<Platform>, id: BoardId) -> Self {
        let mut data = platform.boards_data().clone();
        let options = scan_options(&data, id.as_str());

        let prefixed = |key: &str| format!("{}.{key}", id.as_str());
        data.insert(
            prefixed("fqbn"),
            format!("{}:{}:{}", platform.vendor(), platform.architecture(), id.as_str()),
        );
        data.insert(prefixed("build.arch"), platform.architecture().to_uppercase());
        if let Some(ldscript) = data.get(&prefixed("ldscript")).cloned() {
            if let Some(stem) = ldscript.rfind('.').map(|i| &ldscript[..i]) {
                data.insert(prefixed("ldscript-debug"), format!("{stem}-debug.ld"));
            }
        }

        Self { platform, id, data, options }
    }

    /// The board id.
    pub fn id(&self) -> &BoardId {
        &self.id
    }

    /// The owning platform.
    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    /// Display name from the `<id>.name` key.
    pub fn display_name(&self) -> Option<String> {
        self.value("name")
    }

    /// Fully-qualified board name without option selections.
    pub fn fqbn(&self) -> String {
        self.value("fqbn").expect("fqbn synthesized at construction")
    }

    /// Options declared for this board, in `boards.txt` declaration order.
    pub fn options(&self) -> &[BoardOption] {
        &self.options
    }

    /// Look up a declared option by id.
    pub fn option(&self, id: &str) -> Option<&BoardOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Label of one option value, from the `<id>.menu.<opt>.<value>` key.
    pub fn option_value_label(&self, option_id: &str, value: &str) -> Option<String> {
        self.data
            .get(&format!("{}.menu.{option_id}.{value}", self.id.as_str()))
            .cloned()
    }

    /// Raw lookup of an option-scoped override key
    /// `<boardId>.menu.<optionId>.<value>.<key>`, consulting only the board
    /// table (no platform fallback).
    pub(crate) fn option_scoped_value(
        &self,
        option_id: &str,
        value: &str,
        key: &str,
    ) -> Option<String> {
        self.data
            .get(&format!("{}.menu.{option_id}.{value}.{key}", self.id.as_str()))
            .cloned()
    }

    /// The board's variant directory.
    ///
    /// When `variants/<name>` does not exist with exact casing, siblings are
    /// compared case-insensitively before giving up; variant names in vendor
    /// descriptions do not always match the directory casing on disk.
    pub fn variant_path(&self) -> Result<PathBuf, BoardwalkError> {
        let variant = self.value("build.variant").ok_or_else(|| BoardwalkError::VariantNotFound {
            board: self.id.to_string(),
        })?;
        resolve_variant_dir(self.platform.root(), &variant, self.id.as_str())
    }

    /// The board's core directory (`cores/<build.core>`), resolving
    /// `vendor:core` references against the parent platform.
    pub fn core_directory(&self) -> Result<PathBuf, BoardwalkError> {
        let core = self.value("build.core").ok_or_else(|| BoardwalkError::MalformedInput {
            path: self.platform.root().to_path_buf(),
            reason: format!("board '{}' defines no build.core", self.id),
        })?;
        resolve_core_dir(&self.platform, &core)
    }

    /// Core and variant source files; a variant source overrides a core
    /// source with the same file name.
    pub fn core_file_paths(&self) -> Result<Vec<PathBuf>, BoardwalkError> {
        collect_core_files(&self.core_directory()?, &self.variant_path().ok())
    }
}

impl ConfigScope for Board {
    fn data(&self) -> &IndexMap<String, String> {
        &self.data
    }

    fn parent(&self) -> Option<&dyn ConfigScope> {
        Some(self.platform.as_ref() as &dyn ConfigScope)
    }

    fn describe(&self) -> String {
        format!("board {}", self.id)
    }

    fn raw_value(
        &self,
        key: &str,
        context: &dyn ConfigScope,
        overlay: Option<&RuntimeOverlay>,
    ) -> Option<String> {
        if let Some(value) = overlay.and_then(|o| o.get(key)) {
            return Some(value.clone());
        }
        if let Some(value) = self.data.get(&format!("{}.{key}", self.id.as_str())) {
            return Some(value.clone());
        }
        self.platform.raw_value(key, context, overlay)
    }
}

/// Scan the boards table for the option axes of one board.
///
/// An option value is declared either by its label key
/// `<board>.menu.<opt>.<value>` or implicitly by an override key
/// `<board>.menu.<opt>.<value>.<key>`. Options and values keep their
/// declaration order; the platform-wide `menu.<opt>` keys supply labels.
fn scan_options(data: &IndexMap<String, String>, board_id: &str) -> Vec<BoardOption> {
    let prefix = format!("{board_id}.menu.");
    let mut options: Vec<BoardOption> = Vec::new();

    for (key, _) in data.iter() {
        let Some(rest) = key.strip_prefix(&prefix) else { continue };
        let mut segments = rest.splitn(3, '.');
        let (Some(option_id), Some(value)) = (segments.next(), segments.next()) else { continue };
        if option_id.is_empty() || value.is_empty() {
            continue;
        }
        let option = match options.iter_mut().find(|o| o.id == option_id) {
            Some(option) => option,
            None => {
                options.push(BoardOption {
                    id: option_id.to_string(),
                    label: data.get(&format!("menu.{option_id}")).cloned(),
                    values: Vec::new(),
                });
                options.last_mut().expect("just pushed")
            }
        };
        if !option.values.iter().any(|v| v == value) {
            option.values.push(value.to_string());
        }
    }
    options
}

pub(crate) fn resolve_variant_dir(
    platform_root: &Path,
    variant: &str,
    board_id: &str,
) -> Result<PathBuf, BoardwalkError> {
    let variants_dir = platform_root.join(VARIANTS_DIRNAME);
    let exact = variants_dir.join(variant);
    if exact.exists() {
        return Ok(exact);
    }
    // Exact-case miss: scan siblings case-insensitively.
    let wanted = variant.to_lowercase();
    if let Ok(entries) = fs::read_dir(&variants_dir) {
        for entry in entries.filter_map(|e| e.ok()) {
            if entry.file_name().to_string_lossy().to_lowercase() == wanted {
                debug!(
                    "variant '{variant}' matched '{}' case-insensitively",
                    entry.file_name().to_string_lossy()
                );
                return Ok(entry.path());
            }
        }
    }
    Err(BoardwalkError::VariantNotFound { board: board_id.to_string() })
}

pub(crate) fn resolve_core_dir(
    platform: &Platform,
    core: &str,
) -> Result<PathBuf, BoardwalkError> {
    // A `vendor:core` reference points at the parent platform's cores.
    let (root, core_name) = match core.split_once(':') {
        Some((_, name)) => {
            let root = platform
                .parent_platform()
                .map(|p| p.root().to_path_buf())
                .unwrap_or_else(|| platform.root().to_path_buf());
            (root, name)
        }
        None => (platform.root().to_path_buf(), core),
    };
    let core_dir = root.join("cores").join(core_name);
    if core_dir.exists() {
        Ok(core_dir)
    } else {
        Err(BoardwalkError::MalformedInput {
            path: core_dir,
            reason: "core directory does not exist".into(),
        })
    }
}

pub(crate) fn collect_core_files(
    core_dir: &Path,
    variant_dir: &Option<PathBuf>,
) -> Result<Vec<PathBuf>, BoardwalkError> {
    let mut variant_files: Vec<PathBuf> = Vec::new();
    if let Some(variant_dir) = variant_dir {
        for entry in fs::read_dir(variant_dir)?.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() && is_core_source(&path) {
                variant_files.push(path);
            }
        }
    }
    let variant_names: Vec<String> = variant_files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();

    let mut all = variant_files;
    for entry in fs::read_dir(core_dir)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !is_core_source(&path) {
            continue;
        }
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if !variant_names.contains(&name) {
            all.push(path);
        }
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BOARDS_FILENAME, PLATFORM_FILENAME};
    use std::fs;
    use tempfile::TempDir;

    const BOARDS: &str = "\
menu.cpu=Processor
menu.speed=Clock Speed
uno.name=Arduino Uno
uno.build.core=arduino
uno.build.variant=Standard
uno.build.mcu=atmega328p
uno.ldscript=chipKIT-application-32MX.ld
pro.name=Arduino Pro
pro.build.core=arduino
pro.menu.cpu.16MHzatmega328=ATmega328P (5V, 16 MHz)
pro.menu.cpu.16MHzatmega328.build.mcu=atmega328p
pro.menu.cpu.8MHzatmega328=ATmega328P (3.3V, 8 MHz)
pro.menu.cpu.8MHzatmega328.build.mcu=atmega328p
pro.menu.speed.normal.build.f_cpu=16000000L
";

    fn fixture() -> (TempDir, Arc<Platform>) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PLATFORM_FILENAME), "name=AVR\ncompiler.warning_flags=-w\n")
            .unwrap();
        fs::write(tmp.path().join(BOARDS_FILENAME), BOARDS).unwrap();
        fs::create_dir_all(tmp.path().join("variants/standard")).unwrap();
        fs::create_dir_all(tmp.path().join("cores/arduino")).unwrap();
        let platform =
            Platform::from_root(None, "arduino", "avr", tmp.path().to_path_buf()).unwrap();
        (tmp, Arc::new(platform))
    }

    #[test]
    fn board_resolves_prefixed_keys() {
        let (_tmp, platform) = fixture();
        let board = platform.board("uno").unwrap();
        assert_eq!(board.display_name().as_deref(), Some("Arduino Uno"));
        assert_eq!(board.value("build.mcu").as_deref(), Some("atmega328p"));
        // Platform chain fallback for keys the board does not define.
        assert_eq!(board.value("compiler.warning_flags").as_deref(), Some("-w"));
    }

    #[test]
    fn synthesized_keys_present() {
        let (_tmp, platform) = fixture();
        let board = platform.board("uno").unwrap();
        assert_eq!(board.fqbn(), "arduino:avr:uno");
        assert_eq!(board.value("build.arch").as_deref(), Some("AVR"));
        assert_eq!(
            board.value("ldscript-debug").as_deref(),
            Some("chipKIT-application-32MX-debug.ld")
        );
    }

    #[test]
    fn options_scanned_in_declaration_order() {
        let (_tmp, platform) = fixture();
        let board = platform.board("pro").unwrap();
        let ids: Vec<&str> = board.options().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["cpu", "speed"]);
        let cpu = board.option("cpu").unwrap();
        assert_eq!(cpu.label.as_deref(), Some("Processor"));
        assert_eq!(cpu.values, vec!["16MHzatmega328", "8MHzatmega328"]);
        assert!(cpu.is_legal("8MHzatmega328"));
        assert!(!cpu.is_legal("20MHz"));
        // Declared only through an override key, no label line.
        let speed = board.option("speed").unwrap();
        assert_eq!(speed.values, vec!["normal"]);
    }

    #[test]
    fn board_without_menu_keys_has_no_options() {
        let (_tmp, platform) = fixture();
        let board = platform.board("uno").unwrap();
        assert!(board.options().is_empty());
    }

    #[test]
    fn variant_lookup_falls_back_case_insensitively() {
        let (_tmp, platform) = fixture();
        let board = platform.board("uno").unwrap();
        // build.variant says "Standard" but the directory is "standard".
        let variant = board.variant_path().unwrap();
        assert_eq!(variant.file_name().unwrap(), "standard");
    }

    #[test]
    fn missing_variant_is_an_error() {
        let (_tmp, platform) = fixture();
        let board = platform.board("pro").unwrap();
        let err = board.variant_path().unwrap_err();
        assert!(matches!(err, BoardwalkError::VariantNotFound { .. }));
    }

    #[test]
    fn variant_sources_override_core_sources() {
        let (tmp, platform) = fixture();
        fs::write(tmp.path().join("cores/arduino/main.cpp"), "").unwrap();
        fs::write(tmp.path().join("cores/arduino/wiring.c"), "").unwrap();
        fs::write(tmp.path().join("cores/arduino/notes.md"), "").unwrap();
        fs::write(tmp.path().join("variants/standard/wiring.c"), "").unwrap();

        let board = platform.board("uno").unwrap();
        let files = board.core_file_paths().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.iter().filter(|n| n.as_str() == "wiring.c").count(), 1);
        assert!(names.contains(&"main.cpp".to_string()));
        assert!(!names.contains(&"notes.md".to_string()));
        // The surviving wiring.c is the variant's copy.
        let wiring = files.iter().find(|p| p.file_name().unwrap() == "wiring.c").unwrap();
        assert!(wiring.starts_with(tmp.path().join("variants/standard")));
    }
}
