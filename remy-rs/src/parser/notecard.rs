//! Notecard file scanning.
//!
//! A line `NOTECARD label [label ...]` starts a card. The card's content runs
//! to the next start line or the end of the file.

use crate::error::{RemyError, Result};
use crate::notecard::Notecard;
use glob::glob;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static START_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^NOTECARD[ \t]+([-_0-9a-zA-Z]+(?:[ \t]+[-_0-9a-zA-Z]+)*)[ \t]*(?:\r?\n)?$")
        .unwrap()
});

/// Split file text into notecards. Text before the first start line is ignored.
pub fn parse_notecards(text: &str, source: &Path) -> Vec<Notecard> {
    let mut cards = Vec::new();
    let mut current: Option<(Vec<String>, usize)> = None;
    let mut content = String::new();

    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        if let Some(caps) = START_LINE_RE.captures(line) {
            if let Some((labels, start)) = current.take() {
                cards.push(Notecard::new(labels, std::mem::take(&mut content), source, start));
            }
            let labels = caps[1].split_whitespace().map(str::to_string).collect();
            current = Some((labels, line_no));
            content.clear();
        } else if current.is_some() {
            content.push_str(line);
        }
    }

    if let Some((labels, start)) = current {
        cards.push(Notecard::new(labels, content, source, start));
    }

    cards
}

/// Read every notecard in one file.
pub fn scan_file(path: &Path) -> Result<Vec<Notecard>> {
    let text = std::fs::read_to_string(path)?;
    let cards = parse_notecards(&text, path);
    debug!(path = %path.display(), cards = cards.len(), "scanned notecard file");
    Ok(cards)
}

/// Read every notecard under `path`, a file or a directory.
///
/// Directories are walked recursively in path order. Anything below `path`
/// whose name starts with `.` is skipped, as are files that are not valid
/// UTF-8.
pub fn scan_path(path: &Path) -> Result<Vec<Notecard>> {
    if !path.exists() {
        return Err(RemyError::CacheNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return scan_file(path);
    }

    let pattern_str = format!("{}/**/*", glob::Pattern::escape(&path.to_string_lossy()));

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in glob(&pattern_str)? {
        match entry {
            Ok(file) => {
                let Ok(relative) = file.strip_prefix(path) else {
                    continue;
                };
                let hidden = relative
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
                if !hidden && file.is_file() {
                    files.push(file);
                }
            }
            Err(e) => warn!(error = %e, "glob error while scanning notecards"),
        }
    }
    files.sort();

    let mut cards = Vec::new();
    for file in files {
        match scan_file(&file) {
            Ok(found) => cards.extend(found),
            Err(RemyError::Io(e)) if e.kind() == ErrorKind::InvalidData => {
                warn!(path = %file.display(), "skipping file that is not valid UTF-8");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(cards)
}
