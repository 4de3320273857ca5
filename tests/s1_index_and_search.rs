//! S1 (spec.md §8): a single exported async function is indexed as one chunk
//! and is retrievable by a natural-language query plus structural filters.

mod common;

use semcode::chunk::SymbolType;
use semcode::indexer::{index_full, stats, IndexOptions};
use semcode::search::{search, SearchParams};

#[test]
fn indexes_one_function_and_finds_it_by_query_and_filters() {
    let repo = common::scratch_repo(&[(
        "a.ts",
        "export async function loadUser(id: string) {\n    return { id };\n}\n",
    )]);
    let ctx = common::build_context(repo.path());

    let summary = index_full(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.errors, 0);

    let index_stats = stats(&ctx).unwrap();
    assert_eq!(index_stats.chunk_count, 1);
    assert_eq!(index_stats.file_count, 1);

    let params = SearchParams {
        query: "load user".to_string(),
        symbol_type: Some(SymbolType::Function),
        is_async: Some(true),
        ..SearchParams::default()
    };
    let output = search(&ctx, &params).unwrap();
    assert_eq!(output.matches, 1);
    let result = &output.results[0];
    assert_eq!(result.file, "a.ts");
    assert_eq!(result.symbol_name.as_deref(), Some("loadUser"));
    assert!(result.semantic_score > 0.0);
}
