//! Extraction of named file sections from a generated response.
//!
//! A section opens on a line that is exactly `=== File: <path> ===` and runs until
//! the next marker or the end of the text. Lines before the first marker belong to
//! no file and are dropped.

use std::path::{Component, MAIN_SEPARATOR_STR, Path};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=== File: (.+) ===$").expect("marker regex is valid"));

/// One committed file section, in the order it was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Separator-normalized relative path.
    pub path: String,
    pub content: String,
}

/// Return the path named by a marker line, if `line` is one.
pub fn marker_path(line: &str) -> Option<&str> {
    MARKER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|path| !path.is_empty())
}

/// Canonical store key: the normal components of `path` joined with the host
/// separator. `.` segments and repeated separators disappear.
pub fn normalize_path(path: &str) -> String {
    Path::new(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(MAIN_SEPARATOR_STR)
}

/// True when `path` stays inside the project root.
fn is_contained(path: &str) -> bool {
    let path = Path::new(path);
    !path.has_root()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Split a response into file sections.
///
/// Every section is returned in order, so a path that appears twice yields two
/// entries and applying them in order leaves the later content in place.
pub fn parse_response(text: &str) -> Vec<ParsedFile> {
    let mut files = Vec::new();
    let mut current: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(path) = marker_path(line) {
            commit(&mut files, current.take(), &buffer);
            current = Some(path.to_string());
            buffer.clear();
        } else if current.is_some() {
            buffer.push(line);
        }
    }
    commit(&mut files, current.take(), &buffer);

    debug!(sections = files.len(), "parsed response file sections");
    files
}

fn commit(files: &mut Vec<ParsedFile>, path: Option<String>, buffer: &[&str]) {
    let Some(path) = path else {
        return;
    };
    let key = normalize_path(&path);
    if !is_contained(&path) || key.is_empty() {
        warn!(path = %path, "dropping file section outside project root");
        return;
    }
    files.push(ParsedFile {
        path: key,
        content: buffer.join("\n"),
    });
}
