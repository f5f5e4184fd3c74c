//! Turns an address into a validated [`ResolvedContext`].

use super::address::{normalize_path, ParsedAddress, DEFAULT_REVISION};
use super::locator::{absolutize, locate, RepositoryRoot};
use crate::error::{Result, RevqlError};
use git2::{Commit, Object, ObjectType, Oid, Repository};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Identity of a resolved revision.
///
/// Holds only the object id and kind, so it stays valid after the repository
/// session that produced it is gone. Look it up again in any handle onto the
/// same repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRef {
    id: Oid,
    kind: Option<ObjectType>,
}

impl ObjectRef {
    fn from_object(object: &Object<'_>) -> Self {
        Self {
            id: object.id(),
            kind: object.kind(),
        }
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    pub fn kind(&self) -> Option<ObjectType> {
        self.kind
    }

    pub fn lookup<'r>(&self, repo: &'r Repository) -> Result<Object<'r>> {
        Ok(repo.find_object(self.id, self.kind)?)
    }

    pub fn peel_to_commit<'r>(&self, repo: &'r Repository) -> Result<Commit<'r>> {
        Ok(self.lookup(repo)?.peel_to_commit()?)
    }
}

/// Result of resolving one address.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedContext {
    pub object_ref: ObjectRef,
    pub repository_root: RepositoryRoot,
    /// Path inside the repository; never contains a `..` segment.
    pub relative_path: String,
    pub final_revision: String,
}

impl ResolvedContext {
    /// Root rendered for output columns.
    pub fn repo_path(&self) -> String {
        self.repository_root.to_string()
    }
}

/// Printable summary used by the `resolve` command.
#[derive(Debug, Serialize)]
pub struct ResolvedSummary {
    pub repository_root: String,
    pub relative_path: String,
    pub revision: String,
    pub object_id: String,
    pub object_kind: String,
}

impl From<&ResolvedContext> for ResolvedSummary {
    fn from(ctx: &ResolvedContext) -> Self {
        Self {
            repository_root: ctx.repo_path(),
            relative_path: ctx.relative_path.clone(),
            revision: ctx.final_revision.clone(),
            object_id: ctx.object_ref.id().to_string(),
            object_kind: ctx
                .object_ref
                .kind()
                .map(|k| k.str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Stateless address resolver.
///
/// Holds no cache and no mutable state, so one instance can be shared by any
/// number of threads. Each call opens its own short-lived repository session
/// to validate the revision.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    base_dir: Option<PathBuf>,
}

static GLOBAL: ContextResolver = ContextResolver { base_dir: None };

impl ContextResolver {
    /// Process-wide resolver that interprets relative paths against the
    /// current working directory at call time.
    pub fn global() -> &'static ContextResolver {
        &GLOBAL
    }

    /// Resolver that interprets relative paths against a fixed directory.
    pub fn anchored_at(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Resolves `address`, falling back to `fallback_revision` when it does
    /// not embed one.
    pub fn resolve(&self, address: &str, fallback_revision: &str) -> Result<ResolvedContext> {
        let parsed = ParsedAddress::parse(address, fallback_revision)?;
        self.resolve_parsed(address, parsed)
    }

    /// Resolves `address` with an optional explicitly requested revision.
    ///
    /// An explicit revision replaces the default; it conflicts with a
    /// different revision embedded in the address.
    pub fn resolve_with_revision(
        &self,
        address: &str,
        explicit_revision: Option<&str>,
    ) -> Result<ResolvedContext> {
        let explicit = explicit_revision.filter(|r| !r.is_empty());
        let parsed = ParsedAddress::parse(address, explicit.unwrap_or(DEFAULT_REVISION))?;

        if let Some(explicit) = explicit {
            if parsed.embedded_revision && parsed.revision != explicit {
                return Err(RevqlError::address(
                    address,
                    format!(
                        "conflicting revision: address carries '@{}' but '{}' was requested",
                        parsed.revision, explicit
                    ),
                ));
            }
        }

        self.resolve_parsed(address, parsed)
    }

    fn resolve_parsed(&self, address: &str, parsed: ParsedAddress) -> Result<ResolvedContext> {
        let base = self.base_dir(address)?;
        let root = locate(&parsed.repository_path_hint, &base)?;
        let relative_path = relative_path(&parsed.repository_path_hint, &base, &root)?;
        let object_ref = resolve_revision(&root, &parsed.revision)?;

        debug!(
            address,
            root = %root,
            path = %relative_path,
            revision = %parsed.revision,
            "resolved address"
        );

        Ok(ResolvedContext {
            object_ref,
            repository_root: root,
            relative_path,
            final_revision: parsed.revision,
        })
    }

    fn base_dir(&self, address: &str) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::current_dir().map_err(|e| {
                RevqlError::repository_not_found(
                    address,
                    format!("cannot read current directory: {e}"),
                )
            }),
        }
    }
}

/// Splits the root off the path hint and normalizes what remains.
///
/// The root prefix is the shortest run of leading segments whose absolute
/// form is the root; `..` is allowed there but not in the remainder.
fn relative_path(hint: &str, base: &Path, root: &RepositoryRoot) -> Result<String> {
    let cuts = std::iter::once(0)
        .chain(hint.match_indices('/').map(|(i, _)| i))
        .chain(std::iter::once(hint.len()));

    for cut in cuts {
        let prefix = match &hint[..cut] {
            "" if hint.starts_with('/') => "/",
            prefix => prefix,
        };
        if absolutize(base, Path::new(prefix)) == root.as_path() {
            return normalize_path(&hint[cut..]);
        }
    }

    // The root was found from the base directory rather than the hint.
    let absolute = absolutize(base, Path::new(hint));
    match absolute.strip_prefix(root.as_path()) {
        Ok(rest) => normalize_path(&rest.to_string_lossy()),
        Err(_) => Ok(String::new()),
    }
}

/// Opens the repository for the duration of one lookup and returns the
/// detached identity of `revision`.
fn resolve_revision(root: &RepositoryRoot, revision: &str) -> Result<ObjectRef> {
    let repo = Repository::open(root.as_path()).map_err(|e| {
        RevqlError::repository_not_found(&root.to_string(), e.message().to_string())
    })?;

    let object = repo
        .revparse_single(revision)
        .map_err(|e| RevqlError::RevisionNotFound {
            revision: revision.to_string(),
            repository: root.to_string(),
            detail: e.message().to_string(),
        })?;

    Ok(ObjectRef::from_object(&object))
}
