//! Testable properties (spec.md §8): invariants, round-trip/idempotence, and
//! boundary behaviors not already covered by the S1-S6 scenario tests.

mod common;

use semcode::chunk::content_hash;
use semcode::indexer::{delete_index, index_full, index_incremental, stats, verify_index, IndexOptions};
use semcode::search::{search, SearchParams};
use semcode::vector_store::VectorStore;

#[test]
fn empty_repository_indexes_cleanly_with_zero_chunks() {
    let repo = common::scratch_repo(&[]);
    let ctx = common::build_context(repo.path());

    let summary = index_full(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.files, 0);
    assert_eq!(summary.chunks, 0);

    let index_stats = stats(&ctx).unwrap();
    assert_eq!(index_stats.chunk_count, 0);

    let report = verify_index(&ctx).unwrap();
    assert_eq!(report.changed, 0);
    assert_eq!(report.missing, 0);
    assert_eq!(report.removed, 0);
}

#[test]
fn fresh_full_index_verifies_clean() {
    let repo = common::scratch_repo(&[("a.rs", "pub fn one() -> i32 { 1 }\n")]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let report = verify_index(&ctx).unwrap();
    assert_eq!(report.changed, 0);
    assert_eq!(report.missing, 0);
    assert_eq!(report.removed, 0);
}

#[test]
fn every_stored_chunk_embedding_matches_index_dimension() {
    let repo = common::scratch_repo(&[
        ("a.rs", "pub fn one() -> i32 { 1 }\n"),
        ("b.py", "def two():\n    return 2\n"),
    ]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let index_stats = stats(&ctx).unwrap();
    let chunks = ctx.store.iterate_chunks(None).unwrap();
    assert!(!chunks.is_empty());
    for chunk in chunks {
        assert_eq!(chunk.embedding.len(), index_stats.embed_dim);
    }
}

#[test]
fn content_hash_is_stable_across_calls() {
    let text = "pub fn stable() -> bool { true }\n";
    assert_eq!(content_hash(text), content_hash(text));
    assert_eq!(content_hash("a\r\nb"), content_hash("a\nb"));
}

#[test]
fn delete_then_full_index_satisfies_invariants() {
    let repo = common::scratch_repo(&[("a.rs", "pub fn one() -> i32 { 1 }\n")]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();
    delete_index(&ctx).unwrap();

    let summary = index_full(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.files, 1);
    let report = verify_index(&ctx).unwrap();
    assert_eq!(report.changed, 0);
    assert_eq!(report.missing, 0);
}

#[test]
fn reindexing_unrelated_file_does_not_change_existing_results() {
    let repo = common::scratch_repo(&[(
        "a.ts",
        "export async function loadUser(id: string) {\n    return { id };\n}\n",
    )]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let params = SearchParams {
        query: "load user".to_string(),
        ..SearchParams::default()
    };
    let before = search(&ctx, &params).unwrap();

    std::fs::write(repo.path().join("unrelated.ts"), "export function noop() {}\n").unwrap();
    index_incremental(&ctx, &IndexOptions::default()).unwrap();

    let after = search(&ctx, &params).unwrap();
    assert_eq!(before.results.len(), after.results.len());
    assert_eq!(before.results[0].file, after.results[0].file);
    assert_eq!(before.results[0].symbol_name, after.results[0].symbol_name);
}

#[test]
fn query_matching_nothing_returns_zero_matches_not_error() {
    let repo = common::scratch_repo(&[("a.rs", "pub fn one() -> i32 { 1 }\n")]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let output = search(
        &ctx,
        &SearchParams {
            query: "zzz_totally_unrelated_query_zzz".to_string(),
            min_score: 0.99,
            ..SearchParams::default()
        },
    )
    .unwrap();
    assert_eq!(output.matches, 0);
}

#[test]
fn search_respects_limit_and_max_per_file() {
    let content = |i: usize| {
        format!(
            "export function handlerNumber{i}(request: string) {{\n    return request;\n}}\n"
        )
    };
    let files: Vec<(String, String)> = (0..5).map(|i| (format!("src/h{i}.ts"), content(i))).collect();
    let file_refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let repo = common::scratch_repo(&file_refs);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let output = search(
        &ctx,
        &SearchParams {
            query: "handler request".to_string(),
            limit: 3,
            max_per_file: 1,
            ..SearchParams::default()
        },
    )
    .unwrap();

    assert!(output.results.len() <= 3);
    let mut seen = std::collections::HashSet::new();
    for r in &output.results {
        assert!(seen.insert(r.file.clone()), "file {} exceeded maxPerFile", r.file);
    }
}
