use super::{boolean, int, opt_text, text, Provider, Session, SqlRow};
use crate::context::{build_address, ResolvedContext};
use crate::error::Result;
use crate::git::repository::{file_extension, format_git_time};
use git2::{ObjectType, Oid, Repository, Tree};
use rusqlite::types::Value;
use serde::Serialize;
use std::path::Path;

/// Recursive listing of the tree at the resolved revision.
///
/// A file path in the address restricts the listing to that entry (and its
/// descendants, for a directory).
pub struct TreeProvider;

#[derive(Debug, Clone, Serialize)]
pub struct TreeRow {
    pub git_uri: String,
    pub repo_path: String,
    pub commit_hash: String,
    /// Tree that contains this entry.
    pub tree_hash: String,
    pub file_path: String,
    pub file_ext: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub blob_hash: Option<String>,
    pub commit_date: String,
    pub mode: i32,
    pub size_bytes: i64,
    pub kind: &'static str,
    pub is_text: bool,
    pub encoding: &'static str,
}

impl SqlRow for TreeRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.git_uri),
            text(&self.repo_path),
            text(&self.commit_hash),
            text(&self.tree_hash),
            text(&self.file_path),
            text(&self.file_ext),
            text(&self.reference),
            opt_text(self.blob_hash.clone()),
            text(&self.commit_date),
            int(self.mode),
            int(self.size_bytes),
            text(self.kind),
            boolean(self.is_text),
            text(self.encoding),
        ]
    }
}

/// Fields shared by every row of one listing.
struct Listing<'a> {
    repo: &'a Repository,
    repo_path: String,
    commit_hash: String,
    commit_date: String,
    reference: String,
}

impl Listing<'_> {
    fn row(&self, containing_tree: Oid, path: &str, mode: i32, kind: &'static str) -> TreeRow {
        TreeRow {
            git_uri: build_address(&self.repo_path, path, &self.commit_hash),
            repo_path: self.repo_path.clone(),
            commit_hash: self.commit_hash.clone(),
            tree_hash: containing_tree.to_string(),
            file_path: path.to_string(),
            file_ext: file_extension(path),
            reference: self.reference.clone(),
            blob_hash: None,
            commit_date: self.commit_date.clone(),
            mode,
            size_bytes: 0,
            kind,
            is_text: false,
            encoding: "unknown",
        }
    }

    fn emit(
        &self,
        out: &mut Vec<TreeRow>,
        containing_tree: Oid,
        path: &str,
        id: Oid,
        kind: Option<ObjectType>,
        mode: i32,
    ) -> Result<()> {
        match kind {
            Some(ObjectType::Blob) => {
                let mut row = self.row(containing_tree, path, mode, "file");
                if let Ok(blob) = self.repo.find_blob(id) {
                    row.size_bytes = blob.size() as i64;
                    row.is_text = !blob.is_binary();
                    row.encoding = if row.is_text { "utf8" } else { "binary" };
                }
                row.blob_hash = Some(id.to_string());
                out.push(row);
            }
            Some(ObjectType::Tree) => {
                out.push(self.row(containing_tree, path, mode, "tree"));
                let subtree = self.repo.find_tree(id)?;
                self.walk(out, &subtree, path)?;
            }
            Some(ObjectType::Commit) => {
                out.push(self.row(containing_tree, path, mode, "submodule"));
            }
            _ => {}
        }
        Ok(())
    }

    fn walk(&self, out: &mut Vec<TreeRow>, tree: &Tree<'_>, base: &str) -> Result<()> {
        for entry in tree.iter() {
            let name = String::from_utf8_lossy(entry.name_bytes());
            let path = if base.is_empty() {
                name.into_owned()
            } else {
                format!("{base}/{name}")
            };
            self.emit(out, tree.id(), &path, entry.id(), entry.kind(), entry.filemode())?;
        }
        Ok(())
    }
}

impl Provider for TreeProvider {
    type Row = TreeRow;
    const NAME: &'static str = "git_tree";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<TreeRow>> {
        let repo = session.open(&context.repository_root)?;
        let commit = context.object_ref.peel_to_commit(repo)?;
        let tree = commit.tree()?;
        let listing = Listing {
            repo,
            repo_path: context.repo_path(),
            commit_hash: commit.id().to_string(),
            commit_date: format_git_time(commit.time().seconds()),
            reference: context.final_revision.clone(),
        };

        let mut rows = Vec::new();
        if context.relative_path.is_empty() {
            listing.walk(&mut rows, &tree, "")?;
            return Ok(rows);
        }

        // A path missing at this revision lists nothing.
        if let Ok(entry) = tree.get_path(Path::new(&context.relative_path)) {
            listing.emit(
                &mut rows,
                tree.id(),
                &context.relative_path,
                entry.id(),
                entry.kind(),
                entry.filemode(),
            )?;
        }
        Ok(rows)
    }
}
