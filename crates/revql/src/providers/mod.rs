//! Query functions over a resolved repository context.
//!
//! Every provider extracts rows for one resolved address. The same provider
//! backs both the single-address table (`git_log`) and its streaming
//! counterpart (`git_log_each`), see [`crate::stream`].

mod branches;
mod diff;
mod log;
mod parents;
mod read;
mod tags;
mod tree;

pub use branches::{BranchRow, BranchesProvider};
pub use diff::{DiffProvider, DiffRow};
pub use log::{LogProvider, LogRow};
pub use parents::{ParentRow, ParentsProvider};
pub use read::{ReadProvider, ReadRow};
pub use tags::{TagRow, TagsProvider};
pub use tree::{TreeProvider, TreeRow};

use crate::context::{ContextResolver, RepositoryRoot, ResolvedContext};
use crate::error::Result;
use crate::git::HandleCache;
use git2::Repository;
use rusqlite::types::Value;

/// A row that can be inserted into a SQLite table, column by column.
pub trait SqlRow {
    fn values(&self) -> Vec<Value>;
}

/// Repository access for one extraction: the resolver for any further
/// address, and the handle cache of the execution unit running it.
pub struct Session<'a> {
    resolver: &'a ContextResolver,
    cache: &'a mut HandleCache,
}

impl<'a> Session<'a> {
    pub fn new(resolver: &'a ContextResolver, cache: &'a mut HandleCache) -> Self {
        Self { resolver, cache }
    }

    pub fn resolver(&self) -> &ContextResolver {
        self.resolver
    }

    /// Handle for `root`, reusing the cached one when the root matches.
    pub fn open(&mut self, root: &RepositoryRoot) -> Result<&Repository> {
        self.cache.get_or_open(root)
    }
}

/// Extracts the rows of one query function for one resolved address.
pub trait Provider: Sync {
    type Row: SqlRow + Send;

    /// Table name of the single-address form.
    const NAME: &'static str;

    fn extract(&self, session: &mut Session<'_>, context: &ResolvedContext) -> Result<Vec<Self::Row>>;
}

/// Runs `provider` for a single address.
///
/// Any failure is fatal and reported as `<function>: <detail>`.
pub fn query<P: Provider>(
    provider: &P,
    resolver: &ContextResolver,
    address: &str,
    revision: Option<&str>,
) -> Result<Vec<P::Row>> {
    let run = || {
        let context = resolver.resolve_with_revision(address, revision)?;
        let mut cache = HandleCache::new();
        provider.extract(&mut Session::new(resolver, &mut cache), &context)
    };
    run().map_err(|e| e.in_function(P::NAME))
}

fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

fn opt_text(s: Option<String>) -> Value {
    s.map(Value::Text).unwrap_or(Value::Null)
}

fn int(n: impl Into<i64>) -> Value {
    Value::Integer(n.into())
}

fn boolean(b: bool) -> Value {
    Value::Integer(i64::from(b))
}
