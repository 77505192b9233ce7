//! End-to-end tests: source files through parsing, attachment, symbols,
//! validation and completion.

mod common;

use common::*;
use indoc::indoc;
use rehearse::analysis::{
    analyze, completion_context, Analyzer, AnalyzerConfig, CompletionKind, FsResolver,
};
use rehearse::ast::{Position, TestOrGroup};
use rehearse::symbols::{PatternAnalyzer, SymbolExtractor};

fn analyze_fixture(name: &str) -> rehearse::analysis::AnalyzedFile {
    let path = fixture_path(name);
    let source = load_fixture(name);
    Analyzer::default()
        .with_resolver(FsResolver::new())
        .analyze(Some(&path), &source)
}

#[test]
fn e2e_fixtures_analyze_without_panicking() {
    let fixtures = all_fixtures();
    assert!(fixtures.len() >= 3, "No .rh fixtures found");

    for path in &fixtures {
        let source = std::fs::read_to_string(path).unwrap();
        let file = Analyzer::default().analyze(Some(path), &source);
        assert!(
            file.suite.is_some() || file.recovery_suite.is_some(),
            "{} produced no tree",
            path.display()
        );
        if let Some(suite) = &file.suite {
            assert_span_containment(suite);
        }
    }
}

#[test]
fn e2e_clean_suite_with_imports() {
    let file = analyze_fixture("users.rh");
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);

    let symbols = &file.symbols;
    let db = symbols.import("db").unwrap();
    assert!(db.resolved.is_some());
    assert!(db.exports("CountUsers"));

    let get_user = symbols.query("GetUser").unwrap();
    assert_eq!(get_user.params, vec!["id"]);
    assert_eq!(get_user.returns, vec!["name", "age"]);

    let paths: Vec<_> = symbols.tests.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec!["GetUser/returns the name", "GetUser/missing/unknown id", "ListUsers/sorted"]
    );
}

#[test]
fn e2e_comments_are_attached() {
    let file = analyze_fixture("users.rh");
    let suite = file.suite.as_ref().unwrap();
    assert_eq!(
        suite.imports[0].comments.leading,
        vec!["Fixtures shared by every user test".to_string()]
    );

    let TestOrGroup::Test(test) = &suite.scopes[0].items[0] else {
        panic!("expected a test");
    };
    let name = &test.statements[1];
    assert_eq!(name.key_path(), "name");
    assert_eq!(name.comments.trailing.as_deref(), Some("seeded above"));
    assert!(name.comments.leading.is_empty());
}

#[test]
fn e2e_broken_suite_still_completes() {
    let file = analyze_fixture("broken.rh");
    assert!(file.suite.is_none());
    assert!(file.parse_error.is_some());
    assert!(file.recovery_suite.is_some());
    assert!(file.symbols.query("GetUser").is_some());
    assert!(file.symbols.test("GetUser/fine").is_some());
    assert!(file.has_errors());

    // `setup db.|`
    let ctx = completion_context(&file, Position::at(6, 14)).unwrap();
    assert_eq!(ctx.kind, CompletionKind::Function);
    assert_eq!(ctx.module_alias.as_deref(), Some("db"));
    assert!(ctx.in_test);
    assert_eq!(ctx.query_scope.as_deref(), Some("GetUser"));
    assert!(file.symbols.import("db").unwrap().exports("Seed"));
}

#[test]
fn e2e_no_context_in_clean_document() {
    let file = analyze_fixture("users.rh");
    // After `age: 30`
    assert!(completion_context(&file, Position::at(15, 12)).is_none());
}

#[test]
fn partial_tree_keeps_import_alias() {
    let (suite, _) = assert_recovers("import foo \"./x\"\nquery Bad `");
    assert_eq!(suite.imports[0].alias(), Some("foo"));

    let file = analyze(None, "import foo \"./x\"\nquery Bad `");
    assert!(file.symbols.is_alias("foo"));
}

#[test]
fn text_fallback_is_stateless() {
    let extractor = SymbolExtractor::new(&PatternAnalyzer);
    let first = extractor.extract_from_source("query A `MATCH $id`");
    let second = extractor.extract_from_source("query A `MATCH $id`");
    assert_eq!(first, second);
    assert_eq!(first.query("A").unwrap().params, vec!["id"]);
    assert!(first.query("A").unwrap().span.is_none());

    // With recovery off a broken document has no tree at all
    let config = AnalyzerConfig::default().with_recovery(false);
    let file = Analyzer::new(config).analyze(None, "query A `MATCH $id`\n}\n");
    assert!(file.best_suite().is_none());
    assert_eq!(file.symbols.query("A").unwrap().params, vec!["id"]);
}

#[test]
fn trailing_comment_never_leads() {
    let file = analyze(None, "query Q `X` // hi");
    let suite = file.suite.as_ref().unwrap();
    let query = &suite.queries[0];
    assert_eq!(query.comments.trailing.as_deref(), Some("hi"));
    assert!(query.comments.leading.is_empty());
}

#[test]
fn leading_comment_goes_to_closest_node() {
    let file = analyze(None, "// C\nimport a \"./a\"\nimport b \"./b\"\n");
    let suite = file.suite.as_ref().unwrap();
    assert_eq!(suite.imports[0].comments.leading, vec!["C".to_string()]);
    assert!(suite.imports[1].comments.is_empty());
}

#[test]
fn shared_analyzer_across_threads() {
    let source = load_fixture("users.rh");
    let analyzer = Analyzer::default();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| analyzer.analyze(None, &source)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for file in &results {
        assert_eq!(file.symbols, results[0].symbols);
    }
}

#[test]
fn analyzed_file_serializes_to_json() {
    let source = indoc! {r#"
        import db "./db.rh"
        query Q `MATCH (n) RETURN n`
        Q {
          test "t" {
            setup db.Get(
          }
        }
    "#};
    let file = analyze(None, source);
    let json = serde_json::to_value(&file).unwrap();
    assert_eq!(json["diagnostics"][0]["code"], "parse-error");
    assert_eq!(json["diagnostics"][0]["severity"], "error");

    let ctx = completion_context(&file, Position::at(5, 17)).unwrap();
    let json = serde_json::to_value(&ctx).unwrap();
    assert_eq!(json["kind"], "function");
    assert_eq!(json["prefix"], "Get");
}
