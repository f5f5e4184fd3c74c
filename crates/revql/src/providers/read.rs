use super::{boolean, int, opt_text, text, Provider, Session, SqlRow};
use crate::context::{build_address, ResolvedContext};
use crate::error::{Result, RevqlError};
use crate::git::repository::file_extension;
use git2::ObjectType;
use rusqlite::types::Value;
use serde::Serialize;
use std::path::Path;

/// Content of the file named by the address, at the resolved revision.
#[derive(Debug, Clone, Default)]
pub struct ReadProvider {
    max_bytes: Option<usize>,
}

impl ReadProvider {
    pub fn new(max_bytes: Option<usize>) -> Self {
        Self { max_bytes }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadRow {
    pub git_uri: String,
    pub repo_path: String,
    pub commit_hash: String,
    pub tree_hash: String,
    pub file_path: String,
    pub file_ext: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub blob_hash: String,
    pub mode: i32,
    pub kind: &'static str,
    pub is_text: bool,
    pub encoding: &'static str,
    pub size_bytes: i64,
    pub truncated: bool,
    /// Content, when it is UTF-8 text.
    pub text: Option<String>,
    /// Raw content, when it is not.
    #[serde(skip)]
    pub blob: Option<Vec<u8>>,
}

impl SqlRow for ReadRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.git_uri),
            text(&self.repo_path),
            text(&self.commit_hash),
            text(&self.tree_hash),
            text(&self.file_path),
            text(&self.file_ext),
            text(&self.reference),
            text(&self.blob_hash),
            int(self.mode),
            text(self.kind),
            boolean(self.is_text),
            text(self.encoding),
            int(self.size_bytes),
            boolean(self.truncated),
            opt_text(self.text.clone()),
            self.blob.clone().map(Value::Blob).unwrap_or(Value::Null),
        ]
    }
}

impl Provider for ReadProvider {
    type Row = ReadRow;
    const NAME: &'static str = "git_read";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<ReadRow>> {
        let repo = session.open(&context.repository_root)?;
        let path = context.relative_path.as_str();
        let missing = || RevqlError::FileNotFound {
            path: path.to_string(),
            revision: context.final_revision.clone(),
        };
        if path.is_empty() {
            return Err(missing());
        }

        let commit = context.object_ref.peel_to_commit(repo)?;
        let root_tree = commit.tree()?;
        let entry = root_tree.get_path(Path::new(path)).map_err(|_| missing())?;
        if entry.kind() != Some(ObjectType::Blob) {
            return Err(missing());
        }

        let tree_hash = match path.rsplit_once('/') {
            Some((dir, _)) => root_tree.get_path(Path::new(dir))?.id(),
            None => root_tree.id(),
        };

        let blob = repo.find_blob(entry.id())?;
        let content = blob.content();
        let limit = self.max_bytes.unwrap_or(content.len()).min(content.len());
        let truncated = limit < content.len();
        let bytes = &content[..limit];

        let utf8 = if blob.is_binary() {
            None
        } else {
            match std::str::from_utf8(bytes) {
                Ok(s) => Some(s),
                // Truncation may cut a multi-byte character in half.
                Err(e) if truncated && e.error_len().is_none() => {
                    std::str::from_utf8(&bytes[..e.valid_up_to()]).ok()
                }
                Err(_) => None,
            }
        };
        let is_text = utf8.is_some();

        let repo_path = context.repo_path();
        let commit_hash = commit.id().to_string();

        Ok(vec![ReadRow {
            git_uri: build_address(&repo_path, path, &commit_hash),
            repo_path,
            commit_hash,
            tree_hash: tree_hash.to_string(),
            file_path: path.to_string(),
            file_ext: file_extension(path),
            reference: context.final_revision.clone(),
            blob_hash: blob.id().to_string(),
            mode: entry.filemode(),
            kind: "file",
            is_text,
            encoding: if is_text { "utf8" } else { "binary" },
            size_bytes: content.len() as i64,
            truncated,
            text: utf8.map(str::to_string),
            blob: if is_text { None } else { Some(bytes.to_vec()) },
        }])
    }
}
