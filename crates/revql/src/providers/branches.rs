use super::{boolean, text, Provider, Session, SqlRow};
use crate::context::ResolvedContext;
use crate::error::Result;
use git2::BranchType;
use rusqlite::types::Value;
use serde::Serialize;

/// Local and remote branches of the resolved repository.
pub struct BranchesProvider;

#[derive(Debug, Clone, Serialize)]
pub struct BranchRow {
    pub repo_path: String,
    pub branch_name: String,
    pub commit_hash: String,
    pub is_current: bool,
    pub is_remote: bool,
}

impl SqlRow for BranchRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.repo_path),
            text(&self.branch_name),
            text(&self.commit_hash),
            boolean(self.is_current),
            boolean(self.is_remote),
        ]
    }
}

impl Provider for BranchesProvider {
    type Row = BranchRow;
    const NAME: &'static str = "git_branches";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<BranchRow>> {
        let repo = session.open(&context.repository_root)?;
        let repo_path = context.repo_path();
        let mut rows = Vec::new();

        for entry in repo.branches(None)? {
            let (branch, branch_type) = entry?;
            let name = branch.name().ok().flatten().unwrap_or("").to_string();
            // Symbolic branches such as origin/HEAD have no direct target.
            let commit_hash = branch
                .get()
                .resolve()
                .ok()
                .and_then(|r| r.target())
                .map(|oid| oid.to_string())
                .unwrap_or_default();

            rows.push(BranchRow {
                repo_path: repo_path.clone(),
                branch_name: name,
                commit_hash,
                is_current: branch.is_head(),
                is_remote: branch_type == BranchType::Remote,
            });
        }

        Ok(rows)
    }
}
