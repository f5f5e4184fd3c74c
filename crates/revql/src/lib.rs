//! # revql
//!
//! Query files, history, branches and tags of Git repositories using SQL.
//!
//! Every query names its data by *address*: `git://<path>@<revision>` or a
//! bare filesystem path. An address is resolved to a repository root, a path
//! inside that repository and a validated revision, see
//! [`context::ContextResolver`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use revql::{EngineConfig, QuerySource, Result, SqlEngine};
//!
//! fn main() -> Result<()> {
//!     let mut engine = SqlEngine::new(EngineConfig::default())?;
//!     let query = "SELECT file_path, size_bytes FROM git_tree WHERE kind = 'file'";
//!
//!     engine.load_tables_for_query(query, &QuerySource::new("git://.@HEAD"))?;
//!     let result = engine.execute(query)?;
//!
//!     println!("Found {} files", result.row_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Available Tables
//!
//! - `git_log`, `git_parents`: history reachable from the revision
//! - `git_branches`, `git_tags`: references
//! - `git_tree`, `git_read`: tree listing and file content at the revision
//! - `git_diff`: line diff from the file at the address to a second address
//!
//! Each table has a streaming `*_each` form that runs once per address of an
//! input query, skipping addresses that do not resolve. See [`TABLES`].

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod providers;
pub mod sql;
pub mod stream;

pub use cli::{Args, Command, OutputFormat};
pub use config::EngineConfig;
pub use context::{ContextResolver, ResolvedContext};
pub use error::{Result, RevqlError};
pub use git::HandleCache;
pub use sql::{QueryResult, QuerySource, SqlEngine, TableInfo, TABLES};
pub use stream::{InputRow, StepResult, StreamingOperator};
