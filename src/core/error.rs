//! Error types for the import pipeline.
//!
//! [`BoardwalkError`] enumerates the failure modes of platform parsing,
//! sketch preprocessing and library dependency resolution. The CLI layer
//! wraps errors in [`ErrorContext`] to attach a suggestion before display.

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for boardwalk operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BoardwalkError {
    /// A key that the caller asserted to be present has no binding anywhere
    /// in the scope chain. Plain lookups return `None` instead.
    #[error("configuration key '{key}' is not defined for '{scope}'")]
    ConfigurationNotFound {
        /// The key that was looked up.
        key: String,
        /// Human-readable description of the scope the lookup started at.
        scope: String,
    },

    /// The sketch preprocessor (or another required external tool) exited
    /// with a nonzero status. Fatal to the whole import.
    #[error("external tool '{tool}' failed with exit code {code}")]
    ExternalToolFailure {
        /// Name of the tool that failed.
        tool: String,
        /// Exit code, or -1 when the process was killed by a signal.
        code: i32,
    },

    /// A single per-file compiler dependency probe failed. The resolver
    /// recovers from this locally; it only surfaces when a caller invokes
    /// the probe directly.
    #[error("dependency probe failed for '{}': {reason}", source_file.display())]
    DependencyProbeFailure {
        /// The source file that was being probed.
        source_file: PathBuf,
        /// What went wrong (spawn failure, I/O error, unexpected exit).
        reason: String,
    },

    /// A description file or expected directory is missing or unreadable.
    #[error("malformed input at '{}': {reason}", path.display())]
    MalformedInput {
        /// The offending file or directory.
        path: PathBuf,
        /// What was expected.
        reason: String,
    },

    /// An option selection referenced an undeclared option or an illegal
    /// value.
    #[error("invalid option selection for board '{board}': {reason}")]
    InvalidOptionSelection {
        /// Board id the selection was made for.
        board: String,
        /// What was wrong with the selection.
        reason: String,
    },

    /// No variant directory could be located for a board, not even with the
    /// case-insensitive sibling scan.
    #[error("no variant directory found for board '{board}'")]
    VariantNotFound {
        /// Board id the lookup was performed for.
        board: String,
    },

    /// No `platform.txt` was found under the given root.
    #[error("'{}' does not contain a platform description", path.display())]
    PlatformNotFound {
        /// The directory that was searched.
        path: PathBuf,
    },

    /// A required toolchain binary could not be located.
    #[error("toolchain binary '{tool}' not found")]
    ToolNotFound {
        /// Binary name, e.g. `avr-gcc`.
        tool: String,
    },

    /// The includes cache emitted by the sketch preprocessor could not be
    /// parsed.
    #[error("failed to parse includes cache at '{}'", path.display())]
    IncludesCacheParse {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrapper that pairs an error with an optional suggestion for display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error.
    pub error: anyhow::Error,
    /// Actionable hint shown below the error message.
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without a suggestion.
    pub fn new(error: anyhow::Error) -> Self {
        Self { error, suggestion: None }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print the error (and its chain) to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        for cause in self.error.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".yellow(), cause);
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("  {} {}", "hint:".cyan(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nhint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert an error into an [`ErrorContext`] with a suggestion keyed off the
/// concrete [`BoardwalkError`] variant, when one is in the chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = match error.downcast_ref::<BoardwalkError>() {
        Some(BoardwalkError::PlatformNotFound { .. }) => Some(
            "point --platform at a directory containing platform.txt and boards.txt".to_string(),
        ),
        Some(BoardwalkError::ExternalToolFailure { tool, .. }) => {
            Some(format!("re-run with RUST_LOG=debug to see the {tool} output"))
        }
        Some(BoardwalkError::ToolNotFound { tool }) => {
            Some(format!("install '{tool}' or pass an explicit toolchain directory"))
        }
        Some(BoardwalkError::VariantNotFound { .. }) => {
            Some("check the board's build.variant value against the variants/ directory".to_string())
        }
        _ => None,
    };
    let ctx = ErrorContext::new(error);
    match suggestion {
        Some(s) => ctx.with_suggestion(s),
        None => ctx,
    }
}
