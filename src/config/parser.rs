//! Parser for vendor description files (`platform.txt`, `boards.txt`).
//!
//! The format is line-oriented `key=value`. `#` starts a comment line, blank
//! lines are skipped, duplicate keys are last-write-wins, and a line with no
//! `=` is treated as a key with an empty value. Declaration order is
//! preserved so option axes can be iterated deterministically later.

use indexmap::IndexMap;
use std::fs;
use std::path::Path;

use crate::core::BoardwalkError;

/// Parse a description file from disk.
///
/// Returns [`BoardwalkError::MalformedInput`] when the file cannot be read;
/// the content itself never fails to parse.
pub fn parse_description_file(path: &Path) -> Result<IndexMap<String, String>, BoardwalkError> {
    let text = fs::read_to_string(path).map_err(|e| BoardwalkError::MalformedInput {
        path: path.to_path_buf(),
        reason: format!("cannot read description file: {e}"),
    })?;
    Ok(parse_description_str(&text))
}

/// Parse description-file content, preserving key declaration order.
pub fn parse_description_str(text: &str) -> IndexMap<String, String> {
    let mut table = IndexMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key, value),
            None => (line, ""),
        };
        table.insert(key.to_string(), value.to_string());
    }
    table
}
