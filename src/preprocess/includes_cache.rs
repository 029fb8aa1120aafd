//! Parser for the preprocessor's `includes.cache` side channel.
//!
//! `arduino-builder -preprocess` leaves behind a JSON array mapping each
//! processed source file to the include it resolved and the library
//! directory that satisfied it. Only the entries with both a source file
//! and an include path name a library; a trailing `/src` segment is
//! stripped so the library root itself is reported.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::BoardwalkError;

#[derive(Debug, Deserialize)]
struct CacheEntry {
    #[serde(rename = "Sourcefile", default)]
    source_file: Option<String>,
    #[serde(rename = "Include", default)]
    _include: Option<String>,
    #[serde(rename = "Includepath", default)]
    include_path: Option<String>,
}

/// Read and parse an `includes.cache` file into main-library directories.
pub fn parse_includes_cache(path: &Path) -> Result<Vec<PathBuf>, BoardwalkError> {
    let text = std::fs::read_to_string(path).map_err(|e| BoardwalkError::MalformedInput {
        path: path.to_path_buf(),
        reason: format!("cannot read includes cache: {e}"),
    })?;
    parse_includes_cache_str(&text).map_err(|source| BoardwalkError::IncludesCacheParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `includes.cache` content into main-library directories, in cache
/// order.
pub fn parse_includes_cache_str(text: &str) -> Result<Vec<PathBuf>, serde_json::Error> {
    let entries: Vec<CacheEntry> = serde_json::from_str(text)?;
    let mut libraries = Vec::new();
    for entry in entries {
        let source_file = entry.source_file.as_deref().unwrap_or("").trim();
        if source_file.is_empty() {
            continue;
        }
        let include_path = entry.include_path.as_deref().unwrap_or("").trim();
        if include_path.is_empty() {
            continue;
        }
        let library = strip_src_suffix(include_path);
        debug!("includes cache names library path {library}");
        libraries.push(PathBuf::from(library));
    }
    Ok(libraries)
}

fn strip_src_suffix(path: &str) -> &str {
    let suffix = format!("{}src", std::path::MAIN_SEPARATOR);
    match path.strip_suffix(&suffix) {
        Some(stripped) => stripped,
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_library_paths_from_cache_entries() {
        let text = r#"[
            {"Sourcefile": "", "Include": "", "Includepath": ""},
            {"Sourcefile": "/tmp/sketch/blink.ino.cpp", "Include": "Servo.h", "Includepath": "/home/u/Arduino/libraries/Servo/src"},
            {"Sourcefile": "/tmp/sketch/blink.ino.cpp", "Include": "Wire.h", "Includepath": "/opt/arduino/libraries/Wire"}
        ]"#;
        let libraries = parse_includes_cache_str(text).unwrap();
        assert_eq!(
            libraries,
            vec![
                PathBuf::from("/home/u/Arduino/libraries/Servo"),
                PathBuf::from("/opt/arduino/libraries/Wire"),
            ]
        );
    }

    #[test]
    fn entries_without_source_file_are_skipped() {
        let text = r#"[{"Sourcefile": "  ", "Includepath": "/somewhere/Lib"}]"#;
        assert!(parse_includes_cache_str(text).unwrap().is_empty());
    }

    #[test]
    fn entries_without_include_path_are_skipped() {
        let text = r#"[{"Sourcefile": "/tmp/a.cpp", "Includepath": ""}]"#;
        assert!(parse_includes_cache_str(text).unwrap().is_empty());
    }

    #[test]
    fn missing_fields_are_tolerated() {
        let text = r#"[{"Include": "Servo.h"}]"#;
        assert!(parse_includes_cache_str(text).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(parse_includes_cache_str("not json").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn src_suffix_is_stripped_only_as_a_path_segment() {
        assert_eq!(strip_src_suffix("/libs/Servo/src"), "/libs/Servo");
        assert_eq!(strip_src_suffix("/libs/libsrc"), "/libs/libsrc");
    }
}
