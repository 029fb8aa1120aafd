//! Per-file compiler dependency probes.
//!
//! One probe asks the toolchain compiler which headers a single source file
//! pulls in, by running it in make-style dependency-listing mode (`-MM`)
//! with the caller's `-I` search paths. The trait exists so the closure
//! algorithm can be tested against a scripted probe.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::BoardwalkError;
use crate::process::ProcessRunner;

/// A single dependency-listing invocation for one source file.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// List the dependency paths of `source_file`, searched with
    /// `include_dirs`. Returns only paths that exist on disk.
    async fn probe(
        &self,
        source_file: &Path,
        include_dirs: &[PathBuf],
    ) -> Result<Vec<PathBuf>, BoardwalkError>;
}

/// Probe backed by a gcc-compatible compiler binary.
#[derive(Debug, Clone)]
pub struct GccDependencyProbe {
    compiler: PathBuf,
}

impl GccDependencyProbe {
    /// Create a probe around a compiler binary (`avr-gcc`, `xc32-g++`, ...).
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Self { compiler: compiler.into() }
    }
}

#[async_trait]
impl DependencyProbe for GccDependencyProbe {
    async fn probe(
        &self,
        source_file: &Path,
        include_dirs: &[PathBuf],
    ) -> Result<Vec<PathBuf>, BoardwalkError> {
        let mut runner = ProcessRunner::new(self.compiler.to_string_lossy());
        for dir in include_dirs {
            runner = runner.arg("-I").arg(dir.to_string_lossy());
        }
        runner = runner.arg("-MM").arg(source_file.to_string_lossy());

        let (code, lines) =
            runner
                .run_collect()
                .await
                .map_err(|e| BoardwalkError::DependencyProbeFailure {
                    source_file: source_file.to_path_buf(),
                    reason: e.to_string(),
                })?;
        if code != 0 {
            return Err(BoardwalkError::DependencyProbeFailure {
                source_file: source_file.to_path_buf(),
                reason: format!("compiler exited with code {code}"),
            });
        }

        Ok(lines
            .iter()
            .filter_map(|line| parse_probe_line(line))
            .filter(|path| path.exists())
            .collect())
    }
}

/// Extract a dependency path from one line of probe output.
///
/// Lines starting with two dashes are diagnostics and go to the log; lines
/// starting with a space carry a path, with a trailing line-continuation
/// backslash stripped. Everything else is ignored. Error text that happens
/// to start with a space and look like a path slips through here; the
/// exists-on-disk filter in the caller is the only guard against that.
pub(crate) fn parse_probe_line(line: &str) -> Option<PathBuf> {
    if line.starts_with("--") {
        debug!("{line}");
        return None;
    }
    if !line.starts_with(' ') {
        return None;
    }
    let mut text = line.trim();
    if let Some(stripped) = text.strip_suffix('\\') {
        text = stripped.trim_end();
    }
    if text.is_empty() {
        None
    } else {
        Some(PathBuf::from(text))
    }
}
