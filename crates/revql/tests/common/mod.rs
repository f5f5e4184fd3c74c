//! Shared Git fixtures for the integration tests.

#![allow(dead_code)]

use git2::{Commit, Oid, Repository, Signature, Time};
use revql::ContextResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00";

/// A directory holding two repositories, `repo` and `other`, plus a plain
/// directory `plain` that is not under version control.
pub struct Fixture {
    pub temp: TempDir,
    /// Commits of `repo` in creation order.
    pub commits: Vec<Oid>,
}

impl Fixture {
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.root().join("repo")
    }

    pub fn other_dir(&self) -> PathBuf {
        self.root().join("other")
    }

    /// Resolver whose relative addresses start inside `repo`.
    pub fn resolver(&self) -> ContextResolver {
        ContextResolver::anchored_at(self.repo_dir())
    }

    /// Absolute address of `file` in `repo` at `revision`.
    pub fn address(&self, file: &str, revision: &str) -> String {
        revql::context::build_address(&self.repo_dir().display().to_string(), file, revision)
    }

    pub fn head(&self) -> Oid {
        *self.commits.last().expect("fixture has commits")
    }
}

/// Writes files into a work tree and commits them on top of `HEAD`.
pub struct Committer<'r> {
    repo: &'r Repository,
    clock: i64,
}

impl<'r> Committer<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self {
            repo,
            clock: 1_700_000_000,
        }
    }

    pub fn signature(&self) -> Signature<'static> {
        Signature::new("Test User", "test@example.com", &Time::new(self.clock, 0)).unwrap()
    }

    pub fn commit(&mut self, files: &[(&str, &[u8])], message: &str) -> Oid {
        let workdir = self.repo.workdir().unwrap().to_path_buf();
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = workdir.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        self.clock += 60;
        let sig = self.signature();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }
}

/// Initializes a repository whose `HEAD` points at `main`.
pub fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    repo
}

/// Builds the standard fixture:
///
/// `repo` (on `main`):
/// 1. "Initial commit": README.md, data/sales.csv   (tag v0.1, lightweight)
/// 2. "Add config": config/app.json, bin/logo.png   (branch feature)
/// 3. "Update sales": data/sales.csv                (tag v1.0, annotated)
///
/// `other` (on `main`): cfg.json
pub fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();

    let repo = init_repo(&temp.path().join("repo"));
    let mut committer = Committer::new(&repo);
    let first = committer.commit(
        &[
            ("README.md", b"# Test Repo\n"),
            ("data/sales.csv", b"region,amount\nnorth,10\n"),
        ],
        "Initial commit",
    );
    let second = committer.commit(
        &[
            ("config/app.json", br#"{"name":"app"}"#),
            ("bin/logo.png", PNG_BYTES),
        ],
        "Add config",
    );
    let third = committer.commit(
        &[("data/sales.csv", b"region,amount\nnorth,10\nsouth,20\n")],
        "Update sales",
    );

    repo.branch("feature", &repo.find_commit(second).unwrap(), false)
        .unwrap();
    repo.tag_lightweight("v0.1", &repo.find_object(first, None).unwrap(), false)
        .unwrap();
    repo.tag(
        "v1.0",
        &repo.find_object(third, None).unwrap(),
        &committer.signature(),
        "Release 1.0",
        false,
    )
    .unwrap();

    let other = init_repo(&temp.path().join("other"));
    Committer::new(&other).commit(&[("cfg.json", b"{}\n")], "Other initial");

    fs::create_dir_all(temp.path().join("plain")).unwrap();

    Fixture {
        temp,
        commits: vec![first, second, third],
    }
}
