//! Library dependency closure.
//!
//! Starting from the libraries a sketch includes directly, the resolver
//! repeatedly probes each library's sources with the compiler to find the
//! headers they pull in, and folds any newly referenced library under the
//! libraries root back into the worklist. The closure is complete when a
//! full scan of the known set discovers nothing new.
//!
//! Probing is strictly sequential: each probe's `-I` set must reflect every
//! library discovered by the probes before it.

pub mod probe;

pub use probe::{DependencyProbe, GccDependencyProbe};

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::BoardwalkError;

/// Source extensions that get probed inside a library.
const LIBRARY_SOURCE_EXTENSIONS: &[&str] = &["c", "cpp"];

/// Result of a closure computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryClosure {
    /// The deduplicated directly-referenced libraries, in input order.
    pub main: Vec<PathBuf>,
    /// Libraries discovered only through other libraries' headers, in
    /// discovery order.
    pub auxiliary: Vec<PathBuf>,
}

impl LibraryClosure {
    /// Main and auxiliary libraries together, main first.
    pub fn all(&self) -> Vec<PathBuf> {
        self.main.iter().chain(self.auxiliary.iter()).cloned().collect()
    }
}

/// Computes the transitive library set for one sketch.
pub struct LibraryResolver<P> {
    probe: P,
    libraries_root: PathBuf,
    core_include_dirs: Vec<PathBuf>,
}

impl<P: DependencyProbe> LibraryResolver<P> {
    /// Create a resolver.
    ///
    /// `core_include_dirs` are the board's core/variant directories; they are
    /// passed to every probe but never count as libraries themselves.
    pub fn new(
        probe: P,
        libraries_root: impl Into<PathBuf>,
        core_include_dirs: Vec<PathBuf>,
    ) -> Self {
        Self { probe, libraries_root: libraries_root.into(), core_include_dirs }
    }

    /// Compute the closure over `main_libraries`.
    ///
    /// A failed probe for one source file is logged and skipped; the rest of
    /// the closure proceeds without it.
    pub async fn resolve(
        &self,
        main_libraries: &[PathBuf],
    ) -> Result<LibraryClosure, BoardwalkError> {
        let mut known: Vec<PathBuf> = Vec::new();
        for library in main_libraries {
            if !known.contains(library) {
                known.push(library.clone());
            }
        }
        let main = known.clone();
        let mut auxiliary = Vec::new();

        // Worklist with an explicit cursor: appends during iteration extend
        // the loop bound, so newly found libraries are probed too.
        let mut cursor = 0;
        while cursor < known.len() {
            let library = known[cursor].clone();
            cursor += 1;

            for source_file in library_sources(&library) {
                let include_dirs = self.include_dirs(&known);
                let paths = match self.probe.probe(&source_file, &include_dirs).await {
                    Ok(paths) => paths,
                    Err(e) => {
                        warn!("skipping '{}': {e}", source_file.display());
                        continue;
                    }
                };
                for path in paths {
                    let Some(library_dir) = self.containing_library(&path) else { continue };
                    if !known.contains(&library_dir) {
                        debug!("discovered auxiliary library {}", library_dir.display());
                        known.push(library_dir.clone());
                        auxiliary.push(library_dir);
                    }
                }
            }
        }

        Ok(LibraryClosure { main, auxiliary })
    }

    // Core/variant dirs first, then every known library and its utility/
    // subdirectory when present.
    fn include_dirs(&self, known: &[PathBuf]) -> Vec<PathBuf> {
        let mut dirs = self.core_include_dirs.clone();
        for library in known {
            dirs.push(library.clone());
            let utility = library.join("utility");
            if utility.is_dir() {
                dirs.push(utility);
            }
        }
        dirs
    }

    // Map a dependency path to the top-level library directory containing it,
    // or None when the path is outside the libraries root.
    fn containing_library(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.libraries_root).ok()?;
        let top = relative.components().next()?;
        Some(self.libraries_root.join(top))
    }
}

fn library_sources(library: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(library)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| LIBRARY_SOURCE_EXTENSIONS.contains(&ext))
        })
        .collect();
    sources.sort();
    sources
}
