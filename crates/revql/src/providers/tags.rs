use super::{boolean, opt_text, text, Provider, Session, SqlRow};
use crate::context::ResolvedContext;
use crate::error::Result;
use crate::git::repository::format_git_time;
use rusqlite::types::Value;
use serde::Serialize;

/// Lightweight and annotated tags of the resolved repository.
pub struct TagsProvider;

#[derive(Debug, Clone, Serialize)]
pub struct TagRow {
    pub repo_path: String,
    pub tag_name: String,
    /// Object the tag ultimately points at (the commit, for the common case).
    pub commit_hash: String,
    /// Id the tag reference points at: the tag object when annotated.
    pub tag_hash: String,
    pub tagger_name: Option<String>,
    pub tagger_date: Option<String>,
    pub message: Option<String>,
    pub is_annotated: bool,
}

impl SqlRow for TagRow {
    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.repo_path),
            text(&self.tag_name),
            text(&self.commit_hash),
            text(&self.tag_hash),
            opt_text(self.tagger_name.clone()),
            opt_text(self.tagger_date.clone()),
            opt_text(self.message.clone()),
            boolean(self.is_annotated),
        ]
    }
}

impl Provider for TagsProvider {
    type Row = TagRow;
    const NAME: &'static str = "git_tags";

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<TagRow>> {
        let repo = session.open(&context.repository_root)?;
        let repo_path = context.repo_path();
        let mut rows = Vec::new();

        let names = repo.tag_names(None)?;
        for name in names.iter().flatten() {
            let Ok(reference) = repo.find_reference(&format!("refs/tags/{name}")) else {
                continue;
            };
            let Some(tag_id) = reference.target() else {
                continue;
            };

            let row = match repo.find_tag(tag_id) {
                Ok(tag) => {
                    let tagger = tag.tagger();
                    TagRow {
                        repo_path: repo_path.clone(),
                        tag_name: name.to_string(),
                        commit_hash: tag
                            .target()
                            .and_then(|target| target.peel_to_commit())
                            .map(|commit| commit.id())
                            .unwrap_or_else(|_| tag.target_id())
                            .to_string(),
                        tag_hash: tag_id.to_string(),
                        tagger_name: tagger.as_ref().map(|s| s.name().unwrap_or("").to_string()),
                        tagger_date: tagger.as_ref().map(|s| format_git_time(s.when().seconds())),
                        message: Some(tag.message().unwrap_or("").to_string()),
                        is_annotated: true,
                    }
                }
                Err(_) => TagRow {
                    repo_path: repo_path.clone(),
                    tag_name: name.to_string(),
                    commit_hash: tag_id.to_string(),
                    tag_hash: tag_id.to_string(),
                    tagger_name: None,
                    tagger_date: None,
                    message: None,
                    is_annotated: false,
                },
            };
            rows.push(row);
        }

        Ok(rows)
    }
}
