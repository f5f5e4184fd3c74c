mod engine;
mod schema;

pub use engine::{QueryResult, QuerySource, SqlEngine};
pub use schema::{get_table_info, ColumnInfo, TableInfo, TABLES};
