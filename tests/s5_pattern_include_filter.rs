//! S5 (spec.md §8): the regex pattern filter is scoped to files the semantic
//! search already returned, and the `include` glob excludes files outside
//! `src/` even when their semantic score is higher.

mod common;

use semcode::indexer::{index_full, IndexOptions};
use semcode::search::{search, SearchParams};

const WITH_TOKEN: &str = "export function authenticate(token: string) {\n    return verifyJwt(token);\n}\n";
const WITHOUT_TOKEN: &str = "export function authenticate(credential: string) {\n    return checkCredential(credential);\n}\n";

#[test]
fn pattern_and_include_narrow_results_to_matching_src_files() {
    let repo = common::scratch_repo(&[
        ("src/auth.ts", WITH_TOKEN),
        ("tests/auth.test.ts", WITH_TOKEN),
        ("src/other.ts", WITHOUT_TOKEN),
    ]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let params = SearchParams {
        query: "auth".to_string(),
        pattern: Some("token|jwt".to_string()),
        include: Some("src/**/*.ts".to_string()),
        limit: 10,
        ..SearchParams::default()
    };
    let output = search(&ctx, &params).unwrap();

    assert!(!output.results.is_empty());
    for r in &output.results {
        assert!(r.file.starts_with("src/"), "unexpected file outside src/: {}", r.file);
        assert_eq!(r.file, "src/auth.ts");
    }
}

#[test]
fn pattern_with_no_candidates_returns_empty_not_error() {
    let repo = common::scratch_repo(&[("src/auth.ts", WITH_TOKEN)]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let params = SearchParams {
        query: "auth".to_string(),
        pattern: Some("nonexistent_pattern_xyz".to_string()),
        ..SearchParams::default()
    };
    let output = search(&ctx, &params).unwrap();
    assert_eq!(output.matches, 0);
}
