//! Toolchain binary lookup.
//!
//! Vendor toolchains ship their binaries under one directory with a
//! target-specific prefix (`avr-gcc`, `pic32-g++`, `xc32-ar`, ...). The
//! finder scans that directory by suffix so it works for any prefix, and
//! falls back to `PATH` for the make tool.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::BoardwalkError;

/// The toolchain binaries the importer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// C compiler (`*-gcc`).
    CCompiler,
    /// C++ compiler (`*-g++`).
    CppCompiler,
    /// Static archiver (`*-ar`).
    Archiver,
    /// Assembler (`*-as`).
    Assembler,
    /// The make tool (resolved from `PATH`).
    Make,
}

impl Tool {
    fn suffix(self) -> &'static str {
        match self {
            Tool::CCompiler => "-gcc",
            Tool::CppCompiler => "-g++",
            Tool::Archiver => "-ar",
            Tool::Assembler => "-as",
            Tool::Make => "make",
        }
    }
}

/// Locates toolchain binaries under a toolchain `bin` directory.
#[derive(Debug, Clone)]
pub struct ToolFinder {
    bin_dir: PathBuf,
}

impl ToolFinder {
    /// Create a finder over a toolchain binary directory.
    pub fn new(bin_dir: impl Into<PathBuf>) -> Self {
        Self { bin_dir: bin_dir.into() }
    }

    /// Locate one tool.
    ///
    /// Binaries are matched by suffix on the file stem (the part before the
    /// first `.`, so `avr-gcc.exe` matches `-gcc`). [`Tool::Make`] comes
    /// from `PATH` instead of the toolchain directory.
    pub fn find(&self, tool: Tool) -> Result<PathBuf, BoardwalkError> {
        if tool == Tool::Make {
            return which::which("make")
                .map_err(|_| BoardwalkError::ToolNotFound { tool: "make".into() });
        }

        let suffix = tool.suffix();
        let entries = fs::read_dir(&self.bin_dir).map_err(|_| BoardwalkError::ToolNotFound {
            tool: format!("*{suffix} (no toolchain directory at {})", self.bin_dir.display()),
        })?;
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .find(|p| stem_matches(p, suffix))
            .ok_or_else(|| BoardwalkError::ToolNotFound { tool: format!("*{suffix}") })
    }

    /// The toolchain root, two levels above a tool binary. This is the value
    /// recipes expect in their `runtime.tools.*.path` token.
    pub fn toolchain_root(&self, tool: Tool) -> Result<PathBuf, BoardwalkError> {
        let tool_path = self.find(tool)?;
        Ok(tool_path
            .parent()
            .and_then(Path::parent)
            .unwrap_or(&self.bin_dir)
            .to_path_buf())
    }
}

fn stem_matches(path: &Path, suffix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else { return false };
    // Strip everything from the first dot so Windows `.exe` suffixes match.
    let stem = name.split('.').next().unwrap_or(name);
    stem.ends_with(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn finds_tools_by_suffix_regardless_of_prefix() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "avr-gcc");
        touch(tmp.path(), "avr-g++");
        touch(tmp.path(), "avr-ar");

        let finder = ToolFinder::new(tmp.path());
        assert_eq!(finder.find(Tool::CCompiler).unwrap().file_name().unwrap(), "avr-gcc");
        assert_eq!(finder.find(Tool::CppCompiler).unwrap().file_name().unwrap(), "avr-g++");
        assert_eq!(finder.find(Tool::Archiver).unwrap().file_name().unwrap(), "avr-ar");
    }

    #[test]
    fn matches_windows_style_extensions() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "xc32-gcc.exe");
        let finder = ToolFinder::new(tmp.path());
        assert_eq!(finder.find(Tool::CCompiler).unwrap().file_name().unwrap(), "xc32-gcc.exe");
    }

    #[test]
    fn missing_tool_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let finder = ToolFinder::new(tmp.path());
        let err = finder.find(Tool::Archiver).unwrap_err();
        assert!(matches!(err, BoardwalkError::ToolNotFound { .. }));
    }

    #[test]
    fn toolchain_root_is_two_levels_up() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("avr/bin");
        fs::create_dir_all(&bin).unwrap();
        touch(&bin, "avr-gcc");
        let finder = ToolFinder::new(&bin);
        assert_eq!(finder.toolchain_root(Tool::CCompiler).unwrap(), tmp.path().join("avr"));
    }
}
