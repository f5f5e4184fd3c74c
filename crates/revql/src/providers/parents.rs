use super::{int, text, Provider, Session, SqlRow};
use crate::context::ResolvedContext;
use crate::error::Result;
use crate::git::repository::walk_commits;
use rusqlite::types::Value;
use serde::Serialize;

/// One row per (commit, parent) edge in the history reachable from the revision.
pub struct ParentsProvider;

#[derive(Debug, Clone, Serialize)]
pub struct ParentRow {
    pub repo_path: String,
    pub commit_hash: String,
    pub parent_hash: String,
    pub parent_index: u32,
}

impl SqlRow for ParentRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.repo_path),
            text(&self.commit_hash),
            text(&self.parent_hash),
            int(self.parent_index),
        ]
    }
}

impl Provider for ParentsProvider {
    type Row = ParentRow;
    const NAME: &'static str = "git_parents";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<ParentRow>> {
        let repo = session.open(&context.repository_root)?;
        let start = context.object_ref.peel_to_commit(repo)?;
        let repo_path = context.repo_path();
        let mut rows = Vec::new();

        for commit in walk_commits(repo, start.id())? {
            let commit = commit?;
            let commit_hash = commit.id().to_string();
            for (index, parent_id) in commit.parent_ids().enumerate() {
                rows.push(ParentRow {
                    repo_path: repo_path.clone(),
                    commit_hash: commit_hash.clone(),
                    parent_hash: parent_id.to_string(),
                    parent_index: index as u32,
                });
            }
        }

        Ok(rows)
    }
}
