use super::{int, text, Provider, Session, SqlRow};
use crate::context::ResolvedContext;
use crate::error::Result;
use crate::git::repository::{file_changed_in_commit, format_git_time, walk_commits};
use git2::Commit;
use rusqlite::types::Value;
use serde::Serialize;

/// Commit history reachable from the resolved revision.
///
/// When the address names a file, only commits that changed it are listed.
pub struct LogProvider;

#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub repo_path: String,
    pub commit_hash: String,
    pub author_name: String,
    pub author_email: String,
    pub committer_name: String,
    pub committer_email: String,
    pub author_date: String,
    pub commit_date: String,
    pub message: String,
    pub parent_count: u32,
    pub tree_hash: String,
}

impl LogRow {
    fn from_commit(repo_path: &str, commit: &Commit<'_>) -> Self {
        let author = commit.author();
        let committer = commit.committer();
        Self {
            repo_path: repo_path.to_string(),
            commit_hash: commit.id().to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            author_date: format_git_time(author.when().seconds()),
            commit_date: format_git_time(committer.when().seconds()),
            message: commit.message().unwrap_or("").to_string(),
            parent_count: commit.parent_count() as u32,
            tree_hash: commit.tree_id().to_string(),
        }
    }
}

impl SqlRow for LogRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.repo_path),
            text(&self.commit_hash),
            text(&self.author_name),
            text(&self.author_email),
            text(&self.committer_name),
            text(&self.committer_email),
            text(&self.author_date),
            text(&self.commit_date),
            text(&self.message),
            int(self.parent_count),
            text(&self.tree_hash),
        ]
    }
}

impl Provider for LogProvider {
    type Row = LogRow;
    const NAME: &'static str = "git_log";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<LogRow>> {
        let repo = session.open(&context.repository_root)?;
        let start = context.object_ref.peel_to_commit(repo)?;
        let repo_path = context.repo_path();
        let mut rows = Vec::new();

        for commit in walk_commits(repo, start.id())? {
            let commit = commit?;
            if !context.relative_path.is_empty()
                && !file_changed_in_commit(repo, &commit, &context.relative_path)?
            {
                continue;
            }
            rows.push(LogRow::from_commit(&repo_path, &commit));
        }

        Ok(rows)
    }
}
