//! Table definitions for the query functions.

/// Description of one queryable table.
#[derive(Debug, Clone, Copy)]
pub struct TableInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub create_sql: &'static str,
    pub columns: &'static [ColumnInfo],
    /// True for the streaming `*_each` form, fed by an input query.
    pub streaming: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub description: &'static str,
}

const fn col(name: &'static str, sql_type: &'static str, description: &'static str) -> ColumnInfo {
    ColumnInfo {
        name,
        sql_type,
        description,
    }
}

const LOG_COLUMNS: &[ColumnInfo] = &[
    col("repo_path", "TEXT", "Repository root"),
    col("commit_hash", "TEXT", "Full commit SHA"),
    col("author_name", "TEXT", "Author name"),
    col("author_email", "TEXT", "Author email"),
    col("committer_name", "TEXT", "Committer name"),
    col("committer_email", "TEXT", "Committer email"),
    col("author_date", "TEXT", "Author timestamp (UTC, ISO 8601)"),
    col("commit_date", "TEXT", "Commit timestamp (UTC, ISO 8601)"),
    col("message", "TEXT", "Full commit message"),
    col("parent_count", "INTEGER", "Number of parents"),
    col("tree_hash", "TEXT", "Root tree SHA"),
];

const PARENTS_COLUMNS: &[ColumnInfo] = &[
    col("repo_path", "TEXT", "Repository root"),
    col("commit_hash", "TEXT", "Child commit SHA"),
    col("parent_hash", "TEXT", "Parent commit SHA"),
    col("parent_index", "INTEGER", "Position among the parents (0 = first)"),
];

const BRANCHES_COLUMNS: &[ColumnInfo] = &[
    col("repo_path", "TEXT", "Repository root"),
    col("branch_name", "TEXT", "Branch name"),
    col("commit_hash", "TEXT", "Commit the branch points at"),
    col("is_current", "INTEGER", "1 if checked out"),
    col("is_remote", "INTEGER", "1 for remote-tracking branches"),
];

const TAGS_COLUMNS: &[ColumnInfo] = &[
    col("repo_path", "TEXT", "Repository root"),
    col("tag_name", "TEXT", "Tag name"),
    col("commit_hash", "TEXT", "Commit the tag resolves to"),
    col("tag_hash", "TEXT", "Tag object SHA (commit SHA when lightweight)"),
    col("tagger_name", "TEXT", "Tagger name (annotated only)"),
    col("tagger_date", "TEXT", "Tag timestamp (annotated only)"),
    col("message", "TEXT", "Tag message (annotated only)"),
    col("is_annotated", "INTEGER", "1 for annotated tags"),
];

const TREE_COLUMNS: &[ColumnInfo] = &[
    col("git_uri", "TEXT", "Address of this entry at the commit"),
    col("repo_path", "TEXT", "Repository root"),
    col("commit_hash", "TEXT", "Commit SHA"),
    col("tree_hash", "TEXT", "SHA of the tree containing the entry"),
    col("file_path", "TEXT", "Path inside the repository"),
    col("file_ext", "TEXT", "Extension with the leading dot, e.g. .rs"),
    col("ref", "TEXT", "Revision the address resolved from"),
    col("blob_hash", "TEXT", "Blob SHA (files only)"),
    col("commit_date", "TEXT", "Commit timestamp"),
    col("mode", "INTEGER", "File mode"),
    col("size_bytes", "INTEGER", "Blob size in bytes"),
    col("kind", "TEXT", "file, tree or submodule"),
    col("is_text", "INTEGER", "1 if the blob looks like text"),
    col("encoding", "TEXT", "utf8, binary or unknown"),
];

const READ_COLUMNS: &[ColumnInfo] = &[
    col("git_uri", "TEXT", "Address of the file at the commit"),
    col("repo_path", "TEXT", "Repository root"),
    col("commit_hash", "TEXT", "Commit SHA"),
    col("tree_hash", "TEXT", "SHA of the tree containing the file"),
    col("file_path", "TEXT", "Path inside the repository"),
    col("file_ext", "TEXT", "Extension with the leading dot, e.g. .rs"),
    col("ref", "TEXT", "Revision the address resolved from"),
    col("blob_hash", "TEXT", "Blob SHA"),
    col("mode", "INTEGER", "File mode"),
    col("kind", "TEXT", "Always file"),
    col("is_text", "INTEGER", "1 if the content is UTF-8 text"),
    col("encoding", "TEXT", "utf8 or binary"),
    col("size_bytes", "INTEGER", "Full blob size in bytes"),
    col("truncated", "INTEGER", "1 if cut at max_bytes"),
    col("text", "TEXT", "Content, for text files"),
    col("blob", "BLOB", "Content, for binary files"),
];

/// Every table revql can materialize.
const DIFF_COLUMNS: &[ColumnInfo] = &[
    col("git_uri", "TEXT", "Address of the old side, pinned to its commit"),
    col("against_uri", "TEXT", "Address of the new side, pinned to its commit"),
    col("repo_path", "TEXT", "Repository root of the old side"),
    col("file_path", "TEXT", "Path of the old side inside its repository"),
    col("line_type", "TEXT", "CONTEXT, ADDED or REMOVED"),
    col("content", "TEXT", "Line content without the newline"),
    col("line_number", "INTEGER", "1-based position of the line in the diff"),
    col("old_line_number", "INTEGER", "Line number in the old side, if present there"),
    col("new_line_number", "INTEGER", "Line number in the new side, if present there"),
];

pub static TABLES: &[TableInfo] = &[
    TableInfo {
        name: "git_log",
        description: "Commit history from the --repo address",
        create_sql: "CREATE TABLE git_log (repo_path TEXT, commit_hash TEXT, author_name TEXT, author_email TEXT, committer_name TEXT, committer_email TEXT, author_date TEXT, commit_date TEXT, message TEXT, parent_count INTEGER, tree_hash TEXT)",
        columns: LOG_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_log_each",
        description: "Commit history for every address of the --input query",
        create_sql: "CREATE TABLE git_log_each (repo_path TEXT, commit_hash TEXT, author_name TEXT, author_email TEXT, committer_name TEXT, committer_email TEXT, author_date TEXT, commit_date TEXT, message TEXT, parent_count INTEGER, tree_hash TEXT)",
        columns: LOG_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_parents",
        description: "Commit to parent edges from the --repo address",
        create_sql: "CREATE TABLE git_parents (repo_path TEXT, commit_hash TEXT, parent_hash TEXT, parent_index INTEGER)",
        columns: PARENTS_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_parents_each",
        description: "Commit to parent edges for every address of the --input query",
        create_sql: "CREATE TABLE git_parents_each (repo_path TEXT, commit_hash TEXT, parent_hash TEXT, parent_index INTEGER)",
        columns: PARENTS_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_branches",
        description: "Local and remote branches of the --repo repository",
        create_sql: "CREATE TABLE git_branches (repo_path TEXT, branch_name TEXT, commit_hash TEXT, is_current INTEGER, is_remote INTEGER)",
        columns: BRANCHES_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_branches_each",
        description: "Branches for every address of the --input query",
        create_sql: "CREATE TABLE git_branches_each (repo_path TEXT, branch_name TEXT, commit_hash TEXT, is_current INTEGER, is_remote INTEGER)",
        columns: BRANCHES_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_tags",
        description: "Tags of the --repo repository",
        create_sql: "CREATE TABLE git_tags (repo_path TEXT, tag_name TEXT, commit_hash TEXT, tag_hash TEXT, tagger_name TEXT, tagger_date TEXT, message TEXT, is_annotated INTEGER)",
        columns: TAGS_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_tags_each",
        description: "Tags for every address of the --input query",
        create_sql: "CREATE TABLE git_tags_each (repo_path TEXT, tag_name TEXT, commit_hash TEXT, tag_hash TEXT, tagger_name TEXT, tagger_date TEXT, message TEXT, is_annotated INTEGER)",
        columns: TAGS_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_tree",
        description: "Recursive tree listing at the --repo address",
        create_sql: "CREATE TABLE git_tree (git_uri TEXT, repo_path TEXT, commit_hash TEXT, tree_hash TEXT, file_path TEXT, file_ext TEXT, ref TEXT, blob_hash TEXT, commit_date TEXT, mode INTEGER, size_bytes INTEGER, kind TEXT, is_text INTEGER, encoding TEXT)",
        columns: TREE_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_tree_each",
        description: "Tree listing for every address of the --input query",
        create_sql: "CREATE TABLE git_tree_each (git_uri TEXT, repo_path TEXT, commit_hash TEXT, tree_hash TEXT, file_path TEXT, file_ext TEXT, ref TEXT, blob_hash TEXT, commit_date TEXT, mode INTEGER, size_bytes INTEGER, kind TEXT, is_text INTEGER, encoding TEXT)",
        columns: TREE_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_read",
        description: "Content of the file named by the --repo address",
        create_sql: "CREATE TABLE git_read (git_uri TEXT, repo_path TEXT, commit_hash TEXT, tree_hash TEXT, file_path TEXT, file_ext TEXT, ref TEXT, blob_hash TEXT, mode INTEGER, kind TEXT, is_text INTEGER, encoding TEXT, size_bytes INTEGER, truncated INTEGER, text TEXT, blob BLOB)",
        columns: READ_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_read_each",
        description: "File content for every address of the --input query",
        create_sql: "CREATE TABLE git_read_each (git_uri TEXT, repo_path TEXT, commit_hash TEXT, tree_hash TEXT, file_path TEXT, file_ext TEXT, ref TEXT, blob_hash TEXT, mode INTEGER, kind TEXT, is_text INTEGER, encoding TEXT, size_bytes INTEGER, truncated INTEGER, text TEXT, blob BLOB)",
        columns: READ_COLUMNS,
        streaming: true,
    },
    TableInfo {
        name: "git_diff",
        description: "Line diff from the --repo address to --against (default: same path at HEAD)",
        create_sql: "CREATE TABLE git_diff (git_uri TEXT, against_uri TEXT, repo_path TEXT, file_path TEXT, line_type TEXT, content TEXT, line_number INTEGER, old_line_number INTEGER, new_line_number INTEGER)",
        columns: DIFF_COLUMNS,
        streaming: false,
    },
    TableInfo {
        name: "git_diff_each",
        description: "Line diff to --against for every address of the --input query",
        create_sql: "CREATE TABLE git_diff_each (git_uri TEXT, against_uri TEXT, repo_path TEXT, file_path TEXT, line_type TEXT, content TEXT, line_number INTEGER, old_line_number INTEGER, new_line_number INTEGER)",
        columns: DIFF_COLUMNS,
        streaming: true,
    },
];

/// Looks up a table by name.
pub fn get_table_info(name: &str) -> Option<&'static TableInfo> {
    TABLES.iter().find(|t| t.name == name)
}
