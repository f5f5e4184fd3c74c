//! Command-line interface definitions.

pub mod output;

use crate::config::{EngineConfig, DEFAULT_CHUNK_SIZE};
use clap::{Parser, Subcommand, ValueEnum};

const AFTER_HELP: &str = r#"ADDRESSES:
  git://<path>@<revision>   e.g. git://data/sales.csv@HEAD, git://../other@main
  <path>                    bare path, revision from --ref (default HEAD)

TABLES:
  git_log, git_parents, git_branches, git_tags, git_tree, git_read, git_diff
  Each has a *_each form that reads addresses from --input.

EXAMPLES:
  revql "SELECT commit_hash, message FROM git_log LIMIT 5"
  revql -r git://.@v1.0 "SELECT file_path, size_bytes FROM git_tree WHERE kind = 'file'"
  revql -r git://README.md@HEAD "SELECT text FROM git_read"
  revql -i "SELECT git_uri FROM git_tree WHERE file_ext = '.md'" \
        "SELECT file_path, length(text) FROM git_read_each"
  revql -r git://data/sales.csv@v0.1 "SELECT line_type, content FROM git_diff"
  revql -r git://a.txt@HEAD --against git://b.txt@HEAD "SELECT * FROM git_diff"
  revql resolve git://src/main.rs@HEAD~3"#;

/// Query files, history, branches and tags of Git repositories with SQL.
#[derive(Parser, Debug)]
#[command(name = "revql")]
#[command(version, about, after_help = AFTER_HELP)]
pub struct Args {
    /// SQL query to execute
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Address the single-address tables read from
    #[arg(short, long, env = "REVQL_REPO", default_value = ".", global = true)]
    pub repo: String,

    /// Revision to use when an address does not embed one
    #[arg(long = "ref", value_name = "REVISION", global = true)]
    pub revision: Option<String>,

    /// SQL query whose rows (address[, revision]) feed the *_each tables
    #[arg(short, long, value_name = "SQL")]
    pub input: Option<String>,

    /// Address the git_diff tables compare against (default: same path at HEAD)
    #[arg(long, value_name = "ADDRESS")]
    pub against: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Worker threads for the *_each tables
    #[arg(long, env = "REVQL_THREADS")]
    pub threads: Option<usize>,

    /// Rows per streaming step
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Truncate git_read content to this many bytes
    #[arg(long)]
    pub max_bytes: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_threads(self.threads.unwrap_or_else(EngineConfig::default_threads))
            .with_max_bytes(self.max_bytes)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available tables
    Tables,

    /// Show the columns of a table
    Schema {
        /// Table name
        table: String,
    },

    /// Resolve an address and print its repository root, path and revision
    Resolve {
        /// Address to resolve
        address: String,
    },

    /// Build an address from its parts
    Uri {
        /// Repository path
        repo: String,
        /// File path inside the repository
        file: String,
        /// Revision
        #[arg(default_value = "HEAD")]
        revision: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Jsonl,
    Csv,
}
