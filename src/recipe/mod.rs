//! Recipe resolution and the core-library makefile.
//!
//! Recipes are the `recipe.*.pattern` templates a platform defines: compile
//! patterns per source language and the archiver pattern. Resolving one
//! means querying a [`BoardConfiguration`] with a per-invocation overlay
//! carrying `source_file`, `object_file`, `includes` and the toolchain root.
//!
//! [`CoreMakefileBuilder`] turns a board's core and variant sources into a
//! makefile-shaped list of resolved commands for `libCore.a`. Running make
//! (or the commands themselves) is the caller's business.

use std::path::{Path, PathBuf};

use crate::config::RuntimeOverlay;
use crate::core::BoardwalkError;
use crate::platform::{BoardConfiguration, Platform};

/// Archive file the core makefile builds.
pub const LIB_CORE_FILENAME: &str = "libCore.a";

/// Name of the generated makefile.
pub const CORE_MAKEFILE_NAME: &str = "Makefile-Core";

/// The overlay key recipes use for the toolchain root, per architecture.
pub fn toolchain_root_key(platform: &Platform) -> &'static str {
    if platform.is_samd() {
        "runtime.tools.arm-none-eabi-gcc.path"
    } else if platform.is_pic32() {
        "runtime.tools.pic32-tools.path"
    } else {
        "runtime.tools.avr-gcc.path"
    }
}

/// The `{includes}` section for core compilation: the variant directory
/// (when distinct from the core) followed by the core directory, each as a
/// quoted `-I` argument.
pub fn includes_section(config: &BoardConfiguration) -> Result<String, BoardwalkError> {
    let core = config.core_directory()?;
    let variant = config.variant_path().ok();
    let mut section = String::new();
    if let Some(variant) = variant.filter(|v| *v != core) {
        section.push_str(&format!(" \"-I{}\"", variant.display()));
    }
    section.push_str(&format!(" \"-I{}\"", core.display()));
    Ok(section)
}

/// A generated core-library makefile: the raw lines plus the resolved
/// commands broken out for callers that spawn them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMakefile {
    /// Makefile lines, target first, tab-indented commands after.
    pub lines: Vec<String>,
    /// Object file names in compilation order.
    pub object_files: Vec<String>,
    /// Resolved compile command per source file.
    pub compile_commands: Vec<String>,
    /// Resolved archiver command per object file.
    pub archive_commands: Vec<String>,
}

impl CoreMakefile {
    /// Write the makefile into `build_dir` and return its path.
    pub fn write_to(&self, build_dir: &Path) -> Result<PathBuf, BoardwalkError> {
        let path = build_dir.join(CORE_MAKEFILE_NAME);
        std::fs::write(&path, self.lines.join("\n") + "\n")?;
        Ok(path)
    }
}

/// Builds the `libCore.a` makefile for one board configuration.
pub struct CoreMakefileBuilder<'a> {
    config: &'a BoardConfiguration,
    toolchain_root: PathBuf,
}

impl<'a> CoreMakefileBuilder<'a> {
    /// Create a builder.
    ///
    /// `toolchain_root` is the directory recipes expect in their
    /// `runtime.tools.*.path` token (two levels above the compiler binary).
    pub fn new(config: &'a BoardConfiguration, toolchain_root: impl Into<PathBuf>) -> Self {
        Self { config, toolchain_root: toolchain_root.into() }
    }

    /// Resolve every core/variant source into a compile command and every
    /// object into an archive command.
    pub fn generate(&self) -> Result<CoreMakefile, BoardwalkError> {
        let tools_key = toolchain_root_key(self.config.platform());
        let includes = includes_section(self.config)?;

        let mut lines = vec![format!("{LIB_CORE_FILENAME}:")];
        let mut object_files = Vec::new();
        let mut compile_commands = Vec::new();

        for source_file in self.config.core_file_paths()? {
            let file_name = source_file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| BoardwalkError::MalformedInput {
                    path: source_file.clone(),
                    reason: "core source file has no usable name".into(),
                })?
                .to_string();
            let object_file = format!("{file_name}.o");

            let overlay = RuntimeOverlay::from([
                (tools_key.to_string(), self.toolchain_root.display().to_string()),
                ("source_file".to_string(), source_file.display().to_string()),
                ("object_file".to_string(), object_file.clone()),
                ("includes".to_string(), includes.clone()),
            ]);
            let command =
                self.config.require_value(recipe_key_for(&file_name), Some(&overlay))?;

            object_files.push(object_file);
            lines.push(format!("\t{command}"));
            compile_commands.push(command);
        }

        let mut archive_commands = Vec::new();
        for object_file in &object_files {
            let overlay = RuntimeOverlay::from([
                (tools_key.to_string(), self.toolchain_root.display().to_string()),
                ("archive_file_path".to_string(), LIB_CORE_FILENAME.to_string()),
                ("object_file".to_string(), object_file.clone()),
            ]);
            let command = self.config.require_value("recipe.ar.pattern", Some(&overlay))?;
            lines.push(format!("\t{command}"));
            archive_commands.push(command);
        }

        Ok(CoreMakefile { lines, object_files, compile_commands, archive_commands })
    }
}

fn recipe_key_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".S") {
        "recipe.S.o.pattern"
    } else if file_name.ends_with(".c") {
        "recipe.c.o.pattern"
    } else {
        "recipe.cpp.o.pattern"
    }
}
