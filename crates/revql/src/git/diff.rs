//! Line diffs between two buffers, computed by libgit2.

use crate::error::Result;
use git2::{DiffOptions, Patch};
use std::path::Path;

/// Kind of a line in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Context => "CONTEXT",
            LineKind::Added => "ADDED",
            LineKind::Removed => "REMOVED",
        }
    }

    fn from_origin(origin: char) -> Option<Self> {
        match origin {
            ' ' => Some(LineKind::Context),
            '+' => Some(LineKind::Added),
            '-' => Some(LineKind::Removed),
            // File headers, hunk headers and end-of-file newline markers.
            _ => None,
        }
    }
}

/// One line of a diff, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
}

fn buffer_patch<'b>(old: &'b [u8], new: &'b [u8], path: Option<&Path>) -> Result<Patch<'b>> {
    let mut opts = DiffOptions::new();
    Ok(Patch::from_buffers(old, path, new, path, Some(&mut opts))?)
}

/// Lines of the hunks that turn `old` into `new`, with git's default three
/// lines of context. Binary content yields no lines.
pub fn line_diff(old: &[u8], new: &[u8], path: Option<&Path>) -> Result<Vec<DiffLine>> {
    let patch = buffer_patch(old, new, path)?;
    let mut lines = Vec::new();

    for hunk in 0..patch.num_hunks() {
        for index in 0..patch.num_lines_in_hunk(hunk)? {
            let line = patch.line_in_hunk(hunk, index)?;
            let Some(kind) = LineKind::from_origin(line.origin()) else {
                continue;
            };
            let content = String::from_utf8_lossy(line.content());
            lines.push(DiffLine {
                kind,
                content: content.strip_suffix('\n').unwrap_or(&content).to_string(),
                old_lineno: line.old_lineno(),
                new_lineno: line.new_lineno(),
            });
        }
    }

    Ok(lines)
}

/// Unified diff text turning `old` into `new`.
pub fn unified_diff(old: &[u8], new: &[u8]) -> Result<String> {
    let mut patch = buffer_patch(old, new, None)?;
    let buf = patch.to_buf()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
