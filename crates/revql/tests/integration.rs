//! Integration tests for the revql library API.

mod common;

use common::{fixture, PNG_BYTES};
use git2::{ObjectType, Repository};
use revql::providers::{
    self, BranchesProvider, DiffProvider, LogProvider, ParentsProvider, ReadProvider, TagsProvider,
    TreeProvider,
};
use revql::sql::QuerySource;
use revql::{EngineConfig, InputRow, RevqlError, SqlEngine, StreamingOperator, TABLES};
use serde_json::Value;

fn engine(fx: &common::Fixture) -> SqlEngine {
    SqlEngine::with_resolver(EngineConfig::default().with_threads(2), fx.resolver()).unwrap()
}

fn inside_repository(path: &std::path::Path) -> bool {
    Repository::discover(path).is_ok()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_file_in_current_repository() {
    let fx = fixture();
    let ctx = fx.resolver().resolve("git://data/sales.csv@HEAD", "HEAD").unwrap();

    assert_eq!(ctx.repository_root.as_path(), fx.repo_dir());
    assert_eq!(ctx.relative_path, "data/sales.csv");
    assert_eq!(ctx.final_revision, "HEAD");
    assert_eq!(ctx.object_ref.id(), fx.head());
    assert_eq!(ctx.object_ref.kind(), Some(ObjectType::Commit));
}

#[test]
fn test_resolve_sibling_repository() {
    let fx = fixture();
    let ctx = fx
        .resolver()
        .resolve("git://../other/cfg.json@main", "HEAD")
        .unwrap();

    assert_eq!(ctx.repository_root.as_path(), fx.other_dir());
    assert_eq!(ctx.relative_path, "cfg.json");
    assert_eq!(ctx.final_revision, "main");
}

#[test]
fn test_resolve_unknown_revision() {
    let fx = fixture();
    let err = fx
        .resolver()
        .resolve("git://.@bogus-ref-xyz", "HEAD")
        .unwrap_err();

    match err {
        RevqlError::RevisionNotFound { revision, .. } => assert_eq!(revision, "bogus-ref-xyz"),
        other => panic!("expected RevisionNotFound, got {other:?}"),
    }
}

#[test]
fn test_resolve_rejects_parent_segment_inside_repository() {
    let fx = fixture();
    let err = fx
        .resolver()
        .resolve("git://data/../README.md@HEAD", "HEAD")
        .unwrap_err();
    assert!(matches!(err, RevqlError::PathSecurity { .. }), "{err:?}");
}

#[test]
fn test_resolve_outside_any_repository() {
    let fx = fixture();
    if inside_repository(fx.root()) {
        return;
    }
    let err = fx.resolver().resolve("git://../plain@HEAD", "HEAD").unwrap_err();
    assert!(matches!(err, RevqlError::RepositoryNotFound { .. }), "{err:?}");
}

#[test]
fn test_resolve_fallback_revision() {
    let fx = fixture();
    let resolver = fx.resolver();

    let ctx = resolver.resolve("git://README.md@", "feature").unwrap();
    assert_eq!(ctx.final_revision, "feature");
    assert_eq!(ctx.object_ref.id(), fx.commits[1]);

    let ctx = resolver.resolve("README.md", "v0.1").unwrap();
    assert_eq!(ctx.final_revision, "v0.1");
    assert_eq!(ctx.object_ref.id(), fx.commits[0]);
}

#[test]
fn test_resolve_keeps_annotated_tag_object() {
    let fx = fixture();
    let ctx = fx.resolver().resolve("git://.@v1.0", "HEAD").unwrap();
    assert_eq!(ctx.object_ref.kind(), Some(ObjectType::Tag));

    let repo = Repository::open(fx.repo_dir()).unwrap();
    assert_eq!(ctx.object_ref.peel_to_commit(&repo).unwrap().id(), fx.head());
}

#[test]
fn test_resolve_absolute_address() {
    let fx = fixture();
    let address = fx.address("config/app.json", "feature");
    let ctx = revql::ContextResolver::global().resolve(&address, "HEAD").unwrap();

    assert_eq!(ctx.repository_root.as_path(), fx.repo_dir());
    assert_eq!(ctx.relative_path, "config/app.json");
}

#[test]
fn test_explicit_revision_conflicts_with_embedded() {
    let fx = fixture();
    let resolver = fx.resolver();

    let err = resolver
        .resolve_with_revision("git://README.md@main", Some("feature"))
        .unwrap_err();
    assert!(matches!(err, RevqlError::AddressParse { .. }));

    let ctx = resolver
        .resolve_with_revision("git://README.md@main", Some("main"))
        .unwrap();
    assert_eq!(ctx.final_revision, "main");

    let ctx = resolver.resolve_with_revision("README.md", Some("feature")).unwrap();
    assert_eq!(ctx.final_revision, "feature");
}

#[test]
fn test_resolve_path_inside_git_dir_uses_work_tree_root() {
    let fx = fixture();
    let ctx = fx.resolver().resolve("git://.git/config@HEAD", "HEAD").unwrap();
    let plain = fx.resolver().resolve("git://README.md@HEAD", "HEAD").unwrap();

    assert_eq!(ctx.repository_root, plain.repository_root);
    assert_eq!(ctx.repo_path(), plain.repo_path());
    assert_eq!(ctx.relative_path, ".git/config");
}

// ---------------------------------------------------------------------------
// Single-address query functions
// ---------------------------------------------------------------------------

#[test]
fn test_log_whole_repository() {
    let fx = fixture();
    let rows = providers::query(&LogProvider, &fx.resolver(), "git://.@HEAD", None).unwrap();

    let messages: Vec<&str> = rows.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, vec!["Update sales", "Add config", "Initial commit"]);
    assert_eq!(rows[0].parent_count, 1);
    assert_eq!(rows[2].parent_count, 0);
    assert_eq!(rows[0].author_name, "Test User");
}

#[test]
fn test_log_filtered_by_file() {
    let fx = fixture();
    let rows =
        providers::query(&LogProvider, &fx.resolver(), "git://data/sales.csv@HEAD", None).unwrap();

    let hashes: Vec<String> = rows.iter().map(|r| r.commit_hash.clone()).collect();
    assert_eq!(
        hashes,
        vec![fx.commits[2].to_string(), fx.commits[0].to_string()]
    );
}

#[test]
fn test_log_from_older_revision() {
    let fx = fixture();
    let rows = providers::query(&LogProvider, &fx.resolver(), "git://.@feature", None).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_parents() {
    let fx = fixture();
    let rows = providers::query(&ParentsProvider, &fx.resolver(), ".", None).unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.parent_index == 0));
    assert!(rows
        .iter()
        .any(|r| r.commit_hash == fx.commits[1].to_string()
            && r.parent_hash == fx.commits[0].to_string()));
}

#[test]
fn test_branches() {
    let fx = fixture();
    let rows = providers::query(&BranchesProvider, &fx.resolver(), ".", None).unwrap();

    let main = rows.iter().find(|r| r.branch_name == "main").unwrap();
    assert!(main.is_current);
    assert!(!main.is_remote);
    assert_eq!(main.commit_hash, fx.head().to_string());

    let feature = rows.iter().find(|r| r.branch_name == "feature").unwrap();
    assert!(!feature.is_current);
    assert_eq!(feature.commit_hash, fx.commits[1].to_string());
}

#[test]
fn test_tags() {
    let fx = fixture();
    let rows = providers::query(&TagsProvider, &fx.resolver(), ".", None).unwrap();
    assert_eq!(rows.len(), 2);

    let light = rows.iter().find(|r| r.tag_name == "v0.1").unwrap();
    assert!(!light.is_annotated);
    assert_eq!(light.commit_hash, fx.commits[0].to_string());
    assert_eq!(light.tag_hash, light.commit_hash);
    assert!(light.tagger_name.is_none());

    let annotated = rows.iter().find(|r| r.tag_name == "v1.0").unwrap();
    assert!(annotated.is_annotated);
    assert_eq!(annotated.commit_hash, fx.head().to_string());
    assert_ne!(annotated.tag_hash, annotated.commit_hash);
    assert_eq!(annotated.tagger_name.as_deref(), Some("Test User"));
    assert!(annotated.message.as_deref().unwrap().contains("Release 1.0"));
}

#[test]
fn test_tree_full_listing() {
    let fx = fixture();
    let rows = providers::query(&TreeProvider, &fx.resolver(), "git://.@HEAD", None).unwrap();

    let mut paths: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.file_path.as_str(), r.kind))
        .collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            ("README.md", "file"),
            ("bin", "tree"),
            ("bin/logo.png", "file"),
            ("config", "tree"),
            ("config/app.json", "file"),
            ("data", "tree"),
            ("data/sales.csv", "file"),
        ]
    );

    let logo = rows.iter().find(|r| r.file_path == "bin/logo.png").unwrap();
    assert!(!logo.is_text);
    assert_eq!(logo.encoding, "binary");
    assert_eq!(logo.size_bytes, PNG_BYTES.len() as i64);
    assert_eq!(logo.file_ext, ".png");
    assert_eq!(logo.reference, "HEAD");

    let readme = rows.iter().find(|r| r.file_path == "README.md").unwrap();
    assert!(readme.is_text);
    assert_eq!(readme.encoding, "utf8");
    assert!(readme.git_uri.ends_with(&format!("/repo/README.md@{}", fx.head())));
}

#[test]
fn test_tree_restricted_to_subdirectory() {
    let fx = fixture();
    let rows = providers::query(&TreeProvider, &fx.resolver(), "git://data@HEAD", None).unwrap();
    let paths: Vec<&str> = rows.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(paths, vec!["data", "data/sales.csv"]);
}

#[test]
fn test_tree_at_older_revision() {
    let fx = fixture();
    let rows = providers::query(&TreeProvider, &fx.resolver(), "git://.@v0.1", None).unwrap();
    assert!(rows.iter().all(|r| !r.file_path.starts_with("config")));
    assert!(rows.iter().all(|r| r.reference == "v0.1"));
}

#[test]
fn test_read_text_at_revisions() {
    let fx = fixture();
    let resolver = fx.resolver();
    let provider = ReadProvider::default();

    let head = providers::query(&provider, &resolver, "git://data/sales.csv@HEAD", None).unwrap();
    assert_eq!(head.len(), 1);
    assert_eq!(head[0].text.as_deref(), Some("region,amount\nnorth,10\nsouth,20\n"));
    assert!(head[0].blob.is_none());
    assert!(!head[0].truncated);

    let old = providers::query(&provider, &resolver, "git://data/sales.csv@HEAD~2", None).unwrap();
    assert_eq!(old[0].text.as_deref(), Some("region,amount\nnorth,10\n"));
    assert_eq!(old[0].commit_hash, fx.commits[0].to_string());
}

#[test]
fn test_read_binary() {
    let fx = fixture();
    let rows = providers::query(
        &ReadProvider::default(),
        &fx.resolver(),
        "git://bin/logo.png@HEAD",
        None,
    )
    .unwrap();
    assert!(!rows[0].is_text);
    assert!(rows[0].text.is_none());
    assert_eq!(rows[0].blob.as_deref(), Some(PNG_BYTES));
}

#[test]
fn test_read_truncates_to_max_bytes() {
    let fx = fixture();
    let rows = providers::query(
        &ReadProvider::new(Some(6)),
        &fx.resolver(),
        "git://data/sales.csv@HEAD",
        None,
    )
    .unwrap();
    assert!(rows[0].truncated);
    assert_eq!(rows[0].text.as_deref(), Some("region"));
    assert_eq!(rows[0].size_bytes, 32);
}

#[test]
fn test_single_form_errors_are_fatal_and_prefixed() {
    let fx = fixture();
    let resolver = fx.resolver();

    let err = providers::query(&ReadProvider::default(), &resolver, "git://.@bogus-ref-xyz", None)
        .unwrap_err();
    assert!(err.to_string().starts_with("git_read: "), "{err}");
    assert!(err.is_resolution());

    let err = providers::query(&ReadProvider::default(), &resolver, "git://missing.txt@HEAD", None)
        .unwrap_err();
    assert!(err.to_string().starts_with("git_read: File 'missing.txt'"), "{err}");
    assert!(!err.is_resolution());

    let err = providers::query(&LogProvider, &resolver, "", None).unwrap_err();
    assert!(err.to_string().starts_with("git_log: "), "{err}");
}

#[test]
fn test_diff_against_head_by_default() {
    let fx = fixture();
    let rows = providers::query(
        &DiffProvider::default(),
        &fx.resolver(),
        "git://data/sales.csv@v0.1",
        None,
    )
    .unwrap();

    let lines: Vec<(&str, &str, i64)> = rows
        .iter()
        .map(|r| (r.line_type, r.content.as_str(), r.line_number))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("CONTEXT", "region,amount", 1),
            ("CONTEXT", "north,10", 2),
            ("ADDED", "south,20", 3),
        ]
    );
    assert_eq!(rows[2].old_line_number, None);
    assert_eq!(rows[2].new_line_number, Some(3));
    assert_eq!(rows[0].git_uri, fx.address("data/sales.csv", &fx.commits[0].to_string()));
    assert_eq!(rows[0].against_uri, fx.address("data/sales.csv", &fx.head().to_string()));
}

#[test]
fn test_diff_file_added_after_revision() {
    let fx = fixture();
    let rows = providers::query(
        &DiffProvider::default(),
        &fx.resolver(),
        "git://config/app.json@v0.1",
        None,
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].line_type, "ADDED");
    assert_eq!(rows[0].content, r#"{"name":"app"}"#);
}

#[test]
fn test_diff_against_address_in_other_repository() {
    let fx = fixture();
    let provider = DiffProvider::new(Some("git://../other/cfg.json@main".into()));
    let rows = providers::query(&provider, &fx.resolver(), "git://README.md@HEAD", None).unwrap();

    let lines: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.line_type, r.content.as_str()))
        .collect();
    assert_eq!(lines, vec![("REMOVED", "# Test Repo"), ("ADDED", "{}")]);
    assert!(rows[0].against_uri.contains("/other/cfg.json@"), "{}", rows[0].against_uri);
    assert_eq!(rows[0].repo_path, fx.repo_dir().display().to_string());
}

#[test]
fn test_diff_missing_on_both_sides_is_fatal() {
    let fx = fixture();
    let err = providers::query(
        &DiffProvider::default(),
        &fx.resolver(),
        "git://nowhere.txt@HEAD",
        None,
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("git_diff: "), "{err}");
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[test]
fn test_streaming_skips_unresolvable_rows() {
    let fx = fixture();
    let resolver = fx.resolver();
    let provider = ReadProvider::default();
    let input = vec![
        InputRow::new("git://README.md@HEAD"),
        InputRow::new("git://.@bogus-ref-xyz"),
        InputRow::new("git://data/sales.csv@HEAD~2"),
        InputRow::new("git://data/../README.md@HEAD"),
        InputRow::new("git://../other/cfg.json@main"),
        InputRow::new("ftp://example.com/x@HEAD"),
    ];

    let mut operator = StreamingOperator::new(&provider, &resolver, None);
    let rows = operator.run(&input, 4);

    let paths: Vec<&str> = rows.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(paths, vec!["README.md", "data/sales.csv", "cfg.json"]);
    assert_eq!(operator.skipped(), 3);
}

#[test]
fn test_streaming_matches_single_form() {
    let fx = fixture();
    let resolver = fx.resolver();
    let single = providers::query(&TreeProvider, &resolver, "git://.@HEAD", None).unwrap();

    let input = vec![InputRow::new("git://.@HEAD")];
    let mut operator = StreamingOperator::new(&TreeProvider, &resolver, None);
    let streamed = operator.run(&input, 3);

    let single: Vec<&str> = single.iter().map(|r| r.file_path.as_str()).collect();
    let streamed: Vec<&str> = streamed.iter().map(|r| r.file_path.as_str()).collect();
    assert_eq!(single, streamed);
}

// ---------------------------------------------------------------------------
// SQL engine
// ---------------------------------------------------------------------------

#[test]
fn test_tables_list() {
    assert_eq!(TABLES.len(), 14);
}

#[test]
fn test_engine_single_table() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT message FROM git_log ORDER BY commit_date";
    engine
        .load_tables_for_query(query, &QuerySource::new("."))
        .unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.columns, vec!["message"]);
    assert_eq!(result.rows[0][0], Value::String("Initial commit".into()));
    assert_eq!(result.row_count(), 3);
}

#[test]
fn test_engine_revision_from_source() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT COUNT(*) FROM git_tree WHERE kind = 'file'";
    engine
        .load_tables_for_query(query, &QuerySource::new(".").with_revision(Some("v0.1".into())))
        .unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.rows[0][0], Value::from(2));
}

#[test]
fn test_engine_join_log_and_parents() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT l.message FROM git_log l JOIN git_parents p ON l.commit_hash = p.parent_hash \
                 ORDER BY l.commit_date";
    engine
        .load_tables_for_query(query, &QuerySource::new("."))
        .unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[0][0], Value::String("Initial commit".into()));
}

#[test]
fn test_engine_single_table_error_is_fatal() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let err = engine
        .load_tables_for_query(
            "SELECT * FROM git_log",
            &QuerySource::new("git://.@bogus-ref-xyz"),
        )
        .unwrap_err();
    assert!(err.to_string().starts_with("git_log: Revision 'bogus-ref-xyz'"), "{err}");
}

#[test]
fn test_engine_streaming_from_values() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT file_path, ref FROM git_read_each";
    let input = "VALUES ('git://README.md@HEAD', NULL), ('data/sales.csv', 'v0.1'), \
                 ('git://nowhere.txt@HEAD', NULL), ('git://.@bogus-ref-xyz', NULL), (NULL, NULL)";
    engine
        .load_tables_for_query(query, &QuerySource::new(".").with_input(Some(input.into())))
        .unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[0][0], Value::String("README.md".into()));
    assert_eq!(result.rows[1][0], Value::String("data/sales.csv".into()));
    assert_eq!(result.rows[1][1], Value::String("v0.1".into()));
}

#[test]
fn test_engine_streaming_fed_by_single_table() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT file_path, is_text FROM git_read_each ORDER BY file_path";
    let input = "SELECT git_uri FROM git_tree WHERE kind = 'file'";
    engine
        .load_tables_for_query(query, &QuerySource::new(".").with_input(Some(input.into())))
        .unwrap();

    let result = engine.execute(query).unwrap();
    let paths: Vec<&str> = result
        .rows
        .iter()
        .filter_map(|row| row[0].as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["README.md", "bin/logo.png", "config/app.json", "data/sales.csv"]
    );
    assert_eq!(result.rows[1][1], Value::from(0));
}

#[test]
fn test_engine_streaming_requires_input() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let err = engine
        .load_tables_for_query("SELECT * FROM git_tags_each", &QuerySource::new("."))
        .unwrap_err();
    assert!(matches!(err, RevqlError::MissingInput(_)));
}

#[test]
fn test_engine_streaming_preserves_input_order_across_partitions() {
    let fx = fixture();
    let mut engine =
        SqlEngine::with_resolver(EngineConfig::default().with_threads(4).with_chunk_size(1), fx.resolver())
            .unwrap();
    let query = "SELECT repo_path FROM git_branches_each WHERE branch_name = 'main'";
    let input = "VALUES ('.'), ('../other'), ('.'), ('../other'), ('.'), ('../other'), ('.')";
    engine
        .load_tables_for_query(query, &QuerySource::new(".").with_input(Some(input.into())))
        .unwrap();

    let result = engine.execute(query).unwrap();
    let roots: Vec<&str> = result
        .rows
        .iter()
        .map(|row| {
            if row[0].as_str().unwrap().ends_with("other") {
                "other"
            } else {
                "repo"
            }
        })
        .collect();
    assert_eq!(roots, vec!["repo", "other", "repo", "other", "repo", "other", "repo"]);
}

#[test]
fn test_engine_diff_single_and_streaming() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let single = "SELECT line_type, content FROM git_diff WHERE line_type <> 'CONTEXT'";
    engine
        .load_tables_for_query(single, &QuerySource::new("git://data/sales.csv@HEAD~2"))
        .unwrap();
    let result = engine.execute(single).unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0][1], Value::String("south,20".into()));

    let streaming = "SELECT file_path, line_type, content FROM git_diff_each ORDER BY file_path, line_number";
    let input = "VALUES ('git://data/sales.csv@v0.1'), ('git://README.md@HEAD'), \
                 ('git://nowhere.txt@HEAD'), ('git://.@bogus-ref-xyz'), ('git://config/app.json@v0.1')";
    engine
        .load_tables_for_query(streaming, &QuerySource::new(".").with_input(Some(input.into())))
        .unwrap();
    let result = engine.execute(streaming).unwrap();
    let paths: Vec<&str> = result.rows.iter().filter_map(|row| row[0].as_str()).collect();
    assert_eq!(
        paths,
        vec!["config/app.json", "data/sales.csv", "data/sales.csv", "data/sales.csv"]
    );
    assert_eq!(result.rows[3][2], Value::String("south,20".into()));
}

#[test]
fn test_engine_diff_against_source_address() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT line_type, content FROM git_diff ORDER BY line_number";
    let source = QuerySource::new("git://data/sales.csv@HEAD")
        .with_against(Some("git://data/sales.csv@v0.1".into()));
    engine.load_tables_for_query(query, &source).unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.rows[2][0], Value::String("REMOVED".into()));
    assert_eq!(result.rows[2][1], Value::String("south,20".into()));
}

#[test]
fn test_engine_git_uri_round_trip() {
    let fx = fixture();
    let mut engine = engine(&fx);
    let query = "SELECT r.text FROM git_read_each r";
    let input = format!(
        "SELECT git_uri('{}', 'config/app.json', 'feature')",
        fx.repo_dir().display()
    );
    engine
        .load_tables_for_query(query, &QuerySource::new(".").with_input(Some(input)))
        .unwrap();

    let result = engine.execute(query).unwrap();
    assert_eq!(result.rows[0][0], Value::String(r#"{"name":"app"}"#.into()));
}
