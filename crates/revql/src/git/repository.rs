//! Repository access helpers shared by the providers.

use crate::context::RepositoryRoot;
use crate::error::{Result, RevqlError};
use chrono::DateTime;
use git2::{Commit, DiffOptions, Oid, Repository, Sort};
use std::path::Path;

/// Opens the repository at an already-located root without searching upward.
pub fn open(root: &RepositoryRoot) -> Result<Repository> {
    Repository::open(root.as_path()).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound {
            RevqlError::repository_not_found(&root.to_string(), e.message().to_string())
        } else {
            RevqlError::Git(e)
        }
    })
}

/// Walks history from `start` in topological, newest-first order.
///
/// A commit that cannot be read ends the walk with an error instead of
/// shortening the history.
pub fn walk_commits(
    repo: &Repository,
    start: Oid,
) -> Result<impl Iterator<Item = Result<Commit<'_>>>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(start)?;
    revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;

    Ok(revwalk.map(move |oid| {
        oid.and_then(|oid| repo.find_commit(oid))
            .map_err(RevqlError::from)
    }))
}

/// Returns true when `path` changed in `commit`, matching `git log -- <path>`:
///
/// - root commit: the path exists in its tree
/// - one parent: the diff against it touches the path
/// - merge: the diff against *every* parent touches the path
pub fn file_changed_in_commit(repo: &Repository, commit: &Commit<'_>, path: &str) -> Result<bool> {
    if path.is_empty() {
        return Ok(false);
    }

    let tree = commit.tree()?;
    if commit.parent_count() == 0 {
        return Ok(tree.get_path(Path::new(path)).is_ok());
    }

    let mut opts = DiffOptions::new();
    opts.pathspec(path);

    for parent in commit.parents() {
        let parent_tree = parent.tree()?;
        let diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), Some(&mut opts))?;
        if diff.deltas().len() == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Formats a git timestamp (seconds since epoch) as ISO-8601 UTC.
pub fn format_git_time(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Extension of `path` including the dot, or empty when there is none.
pub fn file_extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => name[pos..].to_string(),
        _ => String::new(),
    }
}
