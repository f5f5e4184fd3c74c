use super::{int, text, Provider, Session, SqlRow};
use crate::context::{build_address, ResolvedContext, DEFAULT_REVISION};
use crate::error::{Result, RevqlError};
use crate::git::diff::line_diff;
use git2::{ErrorCode, ObjectType, Repository};
use rusqlite::types::Value;
use serde::Serialize;
use std::path::Path;

/// Line diff from the file at the resolved address to a second address.
///
/// Without a second address the file is compared with the same path at
/// `HEAD` of its own repository. A path missing on one side counts as an
/// empty file; missing on both sides is an error.
#[derive(Debug, Clone, Default)]
pub struct DiffProvider {
    against: Option<String>,
}

impl DiffProvider {
    pub fn new(against: Option<String>) -> Self {
        Self { against }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffRow {
    pub git_uri: String,
    pub against_uri: String,
    pub repo_path: String,
    pub file_path: String,
    pub line_type: &'static str,
    pub content: String,
    /// 1-based position of the line within the diff.
    pub line_number: i64,
    pub old_line_number: Option<i64>,
    pub new_line_number: Option<i64>,
}

impl SqlRow for DiffRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.git_uri),
            text(&self.against_uri),
            text(&self.repo_path),
            text(&self.file_path),
            text(self.line_type),
            text(&self.content),
            int(self.line_number),
            self.old_line_number.map(Value::Integer).unwrap_or(Value::Null),
            self.new_line_number.map(Value::Integer).unwrap_or(Value::Null),
        ]
    }
}

/// One side of a diff, read out of its repository.
struct Side {
    uri: String,
    path: String,
    content: Option<Vec<u8>>,
}

fn read_side(repo: &Repository, context: &ResolvedContext) -> Result<Side> {
    let path = context.relative_path.as_str();
    let not_a_file = || RevqlError::FileNotFound {
        path: path.to_string(),
        revision: context.final_revision.clone(),
    };
    if path.is_empty() {
        return Err(not_a_file());
    }

    let commit = context.object_ref.peel_to_commit(repo)?;
    let content = match commit.tree()?.get_path(Path::new(path)) {
        Ok(entry) if entry.kind() == Some(ObjectType::Blob) => {
            Some(repo.find_blob(entry.id())?.content().to_vec())
        }
        Ok(_) => return Err(not_a_file()),
        Err(e) if e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Side {
        uri: build_address(&context.repo_path(), path, &commit.id().to_string()),
        path: path.to_string(),
        content,
    })
}

impl Provider for DiffProvider {
    type Row = DiffRow;
    const NAME: &'static str = "git_diff";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<DiffRow>> {
        // The old side is owned before the second open can evict its handle.
        let old = read_side(session.open(&context.repository_root)?, context)?;

        let against = match &self.against {
            Some(address) => address.clone(),
            None => build_address(&context.repo_path(), &context.relative_path, DEFAULT_REVISION),
        };
        let target = session.resolver().resolve(&against, DEFAULT_REVISION)?;
        let new = read_side(session.open(&target.repository_root)?, &target)?;

        if old.content.is_none() && new.content.is_none() {
            return Err(RevqlError::FileNotFound {
                path: old.path,
                revision: context.final_revision.clone(),
            });
        }

        let lines = line_diff(
            old.content.as_deref().unwrap_or_default(),
            new.content.as_deref().unwrap_or_default(),
            Some(Path::new(&new.path)),
        )?;

        let repo_path = context.repo_path();
        Ok(lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| DiffRow {
                git_uri: old.uri.clone(),
                against_uri: new.uri.clone(),
                repo_path: repo_path.clone(),
                file_path: old.path.clone(),
                line_type: line.kind.as_str(),
                content: line.content,
                line_number: index as i64 + 1,
                old_line_number: line.old_lineno.map(i64::from),
                new_line_number: line.new_lineno.map(i64::from),
            })
            .collect())
    }
}
