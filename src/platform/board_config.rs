//! Concrete board configurations: a board plus chosen option values.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ConfigScope, RuntimeOverlay};
use crate::core::BoardwalkError;
use crate::platform::board::{collect_core_files, resolve_core_dir, resolve_variant_dir};
use crate::platform::{Board, Platform};

/// A [`Board`] with one chosen value per (selected) declared option: the
/// terminal query target for recipes.
///
/// Resolution order for a key `K`: runtime overlay, this scope's own data,
/// then `menu.<optionId>.<chosenValue>.K` against the board table for each
/// selected option *in declaration order* (the first option that supplies a
/// value wins), then the board's flat keys and the platform chain.
///
/// Read-only after construction apart from [`put_value`](Self::put_value)
/// calls the importer makes before handing the configuration out.
#[derive(Debug)]
pub struct BoardConfiguration {
    board: Arc<Board>,
    selections: Vec<(String, String)>,
    data: IndexMap<String, String>,
}

impl BoardConfiguration {
    /// Configure a board with no option selections.
    pub fn bare(board: Arc<Board>) -> Self {
        Self::new(board, &HashMap::new()).expect("empty selection is always valid")
    }

    /// Configure a board with the given option choices.
    ///
    /// Choices are validated against the board's declared options and
    /// normalized to declaration order; a partial selection is fine. An
    /// unknown option id or a value outside the declared set is rejected.
    pub fn new(
        board: Arc<Board>,
        choices: &HashMap<String, String>,
    ) -> Result<Self, BoardwalkError> {
        for option_id in choices.keys() {
            if board.option(option_id).is_none() {
                return Err(BoardwalkError::InvalidOptionSelection {
                    board: board.id().to_string(),
                    reason: format!("board declares no option '{option_id}'"),
                });
            }
        }
        let mut selections = Vec::new();
        for option in board.options() {
            if let Some(value) = choices.get(&option.id) {
                if !option.is_legal(value) {
                    return Err(BoardwalkError::InvalidOptionSelection {
                        board: board.id().to_string(),
                        reason: format!(
                            "'{value}' is not a legal value for option '{}' (expected one of: {})",
                            option.id,
                            option.values.join(", ")
                        ),
                    });
                }
                selections.push((option.id.clone(), value.clone()));
            }
        }

        let mut config = Self { board, selections, data: IndexMap::new() };
        let fqbn = config.synthesize_fqbn();
        config.data.insert("fqbn".into(), fqbn);
        Ok(config)
    }

    /// The underlying board.
    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    /// The owning platform.
    pub fn platform(&self) -> &Arc<Platform> {
        self.board.platform()
    }

    /// Selected `(option, value)` pairs in declaration order.
    pub fn selections(&self) -> &[(String, String)] {
        &self.selections
    }

    /// Whether the given option has a selected value.
    pub fn has_option(&self, option_id: &str) -> bool {
        self.selections.iter().any(|(id, _)| id == option_id)
    }

    /// The selected value for an option, if any.
    pub fn option_value(&self, option_id: &str) -> Option<&str> {
        self.selections
            .iter()
            .find(|(id, _)| id == option_id)
            .map(|(_, value)| value.as_str())
    }

    /// Human-readable label of the selected option value.
    pub fn option_value_label(&self, option_id: &str) -> Option<String> {
        self.option_value(option_id)
            .and_then(|value| self.board.option_value_label(option_id, value))
    }

    /// The fully-qualified board name, e.g. `arduino:avr:pro:cpu=8MHzatmega328`.
    pub fn fqbn(&self) -> String {
        self.data.get("fqbn").cloned().expect("fqbn synthesized at construction")
    }

    /// Store a key in this scope's own data. Never touches ancestors.
    ///
    /// Used by the importer to inject run-specific keys such as `build.path`
    /// and `build.core.path` before recipes are resolved.
    pub fn put_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Look up a key with this configuration as the resolution context,
    /// returning [`BoardwalkError::ConfigurationNotFound`] on a miss.
    ///
    /// For lookups where absence is expected, use [`ConfigScope::value`].
    pub fn require_value(
        &self,
        key: &str,
        overlay: Option<&RuntimeOverlay>,
    ) -> Result<String, BoardwalkError> {
        self.value_with(key, self, overlay).ok_or_else(|| BoardwalkError::ConfigurationNotFound {
            key: key.to_string(),
            scope: self.describe(),
        })
    }

    /// The variant directory, honoring option-scoped `build.variant`
    /// overrides and the case-insensitive sibling fallback.
    pub fn variant_path(&self) -> Result<PathBuf, BoardwalkError> {
        let variant = self.value("build.variant").ok_or_else(|| {
            BoardwalkError::VariantNotFound { board: self.board.id().to_string() }
        })?;
        resolve_variant_dir(self.platform().root(), &variant, self.board.id().as_str())
    }

    /// The core directory, honoring option-scoped `build.core` overrides.
    pub fn core_directory(&self) -> Result<PathBuf, BoardwalkError> {
        let core = self.value("build.core").ok_or_else(|| BoardwalkError::MalformedInput {
            path: self.platform().root().to_path_buf(),
            reason: format!("board '{}' defines no build.core", self.board.id()),
        })?;
        resolve_core_dir(self.platform(), &core)
    }

    /// Core/variant include directories from the injected `build.core.path`
    /// and `build.variant.path` keys, in that order.
    pub fn core_dir_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(core) = self.value("build.core.path") {
            if !core.is_empty() {
                paths.push(PathBuf::from(core));
            }
        }
        if let Some(variant) = self.value("build.variant.path") {
            if !variant.is_empty() {
                paths.push(PathBuf::from(variant));
            }
        }
        paths
    }

    /// Core and variant source files, variant overriding core by file name.
    pub fn core_file_paths(&self) -> Result<Vec<PathBuf>, BoardwalkError> {
        collect_core_files(&self.core_directory()?, &self.variant_path().ok())
    }

    fn synthesize_fqbn(&self) -> String {
        let platform = self.platform();
        let base =
            format!("{}:{}:{}", platform.vendor(), platform.architecture(), self.board.id());
        match self.option_value("cpu") {
            Some(cpu) => format!("{base}:cpu={cpu}"),
            None => base,
        }
    }
}

impl ConfigScope for BoardConfiguration {
    fn data(&self) -> &IndexMap<String, String> {
        &self.data
    }

    fn parent(&self) -> Option<&dyn ConfigScope> {
        Some(self.board.as_ref() as &dyn ConfigScope)
    }

    fn describe(&self) -> String {
        format!("board configuration {}", self.fqbn())
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
        if let Some(value) = self.data.get(key) {
            return Some(value.clone());
        }
        // Option-scoped overrides, first declared option wins.
        for (option_id, value) in &self.selections {
            if let Some(found) = self.board.option_scoped_value(option_id, value, key) {
                return Some(found);
            }
        }
        self.board.raw_value(key, context, overlay)
    }
}
