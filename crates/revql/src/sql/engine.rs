//! SQL query engine over addressed Git repositories.

use crate::config::EngineConfig;
use crate::context::{build_address, ContextResolver, DEFAULT_REVISION};
use crate::error::{Result, RevqlError};
use crate::git::diff::unified_diff;
use crate::providers::{
    self, BranchesProvider, DiffProvider, LogProvider, ParentsProvider, Provider, ReadProvider, SqlRow,
    TagsProvider, TreeProvider,
};
use crate::sql::schema::{get_table_info, TableInfo, TABLES};
use crate::stream::{self, InputRow};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Where the rows of a query's tables come from.
#[derive(Debug, Clone)]
pub struct QuerySource {
    /// Address used by the single-address tables.
    pub address: String,
    /// Explicit revision; rows of an input query may carry their own.
    pub revision: Option<String>,
    /// Query whose rows feed the `*_each` tables: first column address,
    /// optional second column revision.
    pub input: Option<String>,
    /// Second address the diff tables compare against.
    pub against: Option<String>,
}

impl QuerySource {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            revision: None,
            input: None,
            against: None,
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_input(mut self, input: Option<String>) -> Self {
        self.input = input;
        self
    }

    pub fn with_against(mut self, against: Option<String>) -> Self {
        self.against = against;
        self
    }
}

/// The SQL query engine.
///
/// `SqlEngine` keeps an in-memory SQLite database. Tables are materialized
/// lazily, only when a query references them.
///
/// # Example
///
/// ```no_run
/// use revql::{EngineConfig, QuerySource, SqlEngine};
///
/// let mut engine = SqlEngine::new(EngineConfig::default())?;
/// let query = "SELECT commit_hash, message FROM git_log LIMIT 10";
/// engine.load_tables_for_query(query, &QuerySource::new("git://.@HEAD"))?;
///
/// let result = engine.execute(query)?;
/// println!("{} commits", result.row_count());
/// # Ok::<(), revql::RevqlError>(())
/// ```
pub struct SqlEngine {
    conn: Connection,
    resolver: ContextResolver,
    config: EngineConfig,
    loaded_tables: HashSet<String>,
}

impl SqlEngine {
    /// Creates an engine that resolves relative addresses against the
    /// current directory.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_resolver(config, ContextResolver::default())
    }

    pub fn with_resolver(config: EngineConfig, resolver: ContextResolver) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.create_scalar_function(
            "git_uri",
            3,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let repo: Option<String> = ctx.get(0)?;
                let file: Option<String> = ctx.get(1)?;
                let revision: Option<String> = ctx.get(2)?;
                Ok(repo.map(|repo| {
                    build_address(
                        &repo,
                        file.as_deref().unwrap_or(""),
                        revision.as_deref().unwrap_or(DEFAULT_REVISION),
                    )
                }))
            },
        )?;
        conn.create_scalar_function(
            "diff_text",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let old: Option<String> = ctx.get(0)?;
                let new: Option<String> = ctx.get(1)?;
                unified_diff(
                    old.unwrap_or_default().as_bytes(),
                    new.unwrap_or_default().as_bytes(),
                )
                .map_err(|e| rusqlite::Error::UserFunctionError(e.to_string().into()))
            },
        )?;

        Ok(Self {
            conn,
            resolver,
            config,
            loaded_tables: HashSet::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Table names referenced in a SQL query.
    pub fn extract_table_names(query: &str) -> BTreeSet<String> {
        TABLES
            .iter()
            .filter(|table| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(table.name));
                Regex::new(&pattern).is_ok_and(|re| re.is_match(query))
            })
            .map(|table| table.name.to_string())
            .collect()
    }

    /// Materializes one table. Loaded tables are kept; loading twice is a no-op.
    pub fn load_table(&mut self, table_name: &str, source: &QuerySource) -> Result<()> {
        if self.loaded_tables.contains(table_name) {
            return Ok(());
        }

        let table = get_table_info(table_name)
            .ok_or_else(|| RevqlError::TableNotFound(table_name.to_string()))?;

        let input_rows = if table.streaming {
            let input = source
                .input
                .as_deref()
                .ok_or_else(|| RevqlError::MissingInput(table.name.to_string()))?;
            // The input query may itself read single-address tables.
            let upstream = QuerySource {
                input: None,
                ..source.clone()
            };
            self.load_tables_for_query(input, &upstream)?;
            self.input_rows(input)?
        } else {
            Vec::new()
        };

        match table.name.trim_end_matches("_each") {
            "git_log" => self.populate(table, &LogProvider, source, &input_rows)?,
            "git_parents" => self.populate(table, &ParentsProvider, source, &input_rows)?,
            "git_branches" => self.populate(table, &BranchesProvider, source, &input_rows)?,
            "git_tags" => self.populate(table, &TagsProvider, source, &input_rows)?,
            "git_tree" => self.populate(table, &TreeProvider, source, &input_rows)?,
            "git_read" => {
                let provider = ReadProvider::new(self.config.max_bytes);
                self.populate(table, &provider, source, &input_rows)?
            }
            "git_diff" => {
                let provider = DiffProvider::new(source.against.clone());
                self.populate(table, &provider, source, &input_rows)?
            }
            _ => return Err(RevqlError::TableNotFound(table_name.to_string())),
        }

        self.loaded_tables.insert(table.name.to_string());
        Ok(())
    }

    /// Materializes every table referenced in `query`.
    pub fn load_tables_for_query(&mut self, query: &str, source: &QuerySource) -> Result<()> {
        for table in Self::extract_table_names(query) {
            self.load_table(&table, source)?;
        }
        Ok(())
    }

    /// Executes a SQL query and returns the results.
    ///
    /// Any SQLite feature is available: JOINs, CTEs, window functions and
    /// aggregations.
    pub fn execute(&self, query: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(query)?;

        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map([], |row| Ok(row_to_values(row, column_names.len())))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(QueryResult {
            columns: column_names,
            rows,
        })
    }

    fn input_rows(&self, input: &str) -> Result<Vec<InputRow>> {
        let mut stmt = self.conn.prepare(input)?;
        let with_revision = stmt.column_count() > 1;
        let rows = stmt
            .query_map([], |row| {
                Ok(InputRow {
                    address: text_of(row, 0),
                    revision: if with_revision { text_of(row, 1) } else { None },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "collected input addresses");
        Ok(rows)
    }

    fn populate<P: Provider>(
        &self,
        table: &TableInfo,
        provider: &P,
        source: &QuerySource,
        input_rows: &[InputRow],
    ) -> Result<()> {
        self.conn.execute(table.create_sql, [])?;

        let rows = if table.streaming {
            stream::run_partitioned(
                provider,
                &self.resolver,
                input_rows,
                source.revision.as_deref(),
                &self.config,
            )?
        } else {
            providers::query(
                provider,
                &self.resolver,
                &source.address,
                source.revision.as_deref(),
            )?
        };

        insert_rows(&self.conn, table, &rows)?;
        debug!(table = table.name, rows = rows.len(), "loaded table");
        Ok(())
    }
}

fn insert_rows<R: SqlRow>(conn: &Connection, table: &TableInfo, rows: &[R]) -> Result<()> {
    let placeholders = vec!["?"; table.columns.len()].join(", ");
    let sql = format!("INSERT INTO {} VALUES ({})", table.name, placeholders);

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for row in rows {
            stmt.execute(params_from_iter(row.values()))?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Text of column `idx`; numbers are rendered, NULL and blobs are absent.
fn text_of(row: &Row, idx: usize) -> Option<String> {
    match row.get_ref(idx).ok()? {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn row_to_values(row: &Row, col_count: usize) -> Vec<Value> {
    (0..col_count)
        .map(|i| match row.get_ref(i) {
            Ok(ValueRef::Integer(n)) => Value::Number(n.into()),
            Ok(ValueRef::Real(f)) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            Ok(ValueRef::Text(t)) => Value::String(String::from_utf8_lossy(t).into_owned()),
            // Blobs are rendered as lowercase hex.
            Ok(ValueRef::Blob(b)) => Value::String(b.iter().map(|byte| format!("{byte:02x}")).collect()),
            Ok(ValueRef::Null) | Err(_) => Value::Null,
        })
        .collect()
}

/// The result of a SQL query execution.
#[derive(Debug)]
pub struct QueryResult {
    /// Column names from the query.
    pub columns: Vec<String>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Returns true if the result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Converts the result to a JSON array of objects.
    ///
    /// Each row becomes a JSON object with column names as keys.
    pub fn to_json_array(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (i, col) in self.columns.iter().enumerate() {
                    obj.insert(col.clone(), row.get(i).cloned().unwrap_or(Value::Null));
                }
                Value::Object(obj)
            })
            .collect()
    }
}
