//! Repository discovery from an arbitrary starting path.

use crate::error::{Result, RevqlError};
use git2::Repository;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Absolute path of a directory that was opened successfully as a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRoot(PathBuf);

impl RepositoryRoot {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn new_unchecked(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl fmt::Display for RepositoryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for RepositoryRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Finds the repository containing `path`, resolving relative paths against `base`.
///
/// The final path component does not have to exist: addressing a file that is
/// only present in history is normal. The walk first climbs until some entry
/// exists, then climbs again until a level opens as a repository.
pub fn locate(path: &str, base: &Path) -> Result<RepositoryRoot> {
    let absolute = absolutize(base, Path::new(path));

    let mut existing = absolute.as_path();
    while !exists(existing) {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => {
                existing = base;
                break;
            }
        }
    }

    let start = if is_file(existing) {
        existing.parent().unwrap_or(existing)
    } else {
        existing
    };

    // A `.git` directory opens as its own repository; its work tree is the root.
    for dir in start.ancestors().filter(|dir| dir.file_name() != Some(OsStr::new(".git"))) {
        if Repository::open(dir).is_ok() {
            debug!(input = path, root = %dir.display(), "located repository");
            return Ok(RepositoryRoot(dir.to_path_buf()));
        }
    }

    Err(RevqlError::repository_not_found(
        path,
        format!(
            "no git repository at '{}' or any parent directory",
            absolute.display()
        ),
    ))
}

/// Lexically resolves `path` against `base`, folding `.` and `..` without
/// touching the filesystem.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// Probe failures (permissions, I/O) count as "not there".
fn exists(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
