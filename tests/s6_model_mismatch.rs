//! S6 (spec.md §8): searching with an embedder whose `modelId` differs from
//! the one the index was built with fails with `ModelMismatch`.

mod common;

use semcode::error::SearchCodeError;
use semcode::indexer::{index_full, IndexOptions};
use semcode::search::{search, SearchParams};

#[test]
fn search_with_different_model_id_fails_with_model_mismatch() {
    let repo = common::scratch_repo(&[("a.ts", "export function ping() { return 1; }\n")]);
    let build_ctx = common::build_context_with_model(repo.path(), "model-a");
    index_full(&build_ctx, &IndexOptions::default()).unwrap();

    let query_ctx = common::build_context_with_model(repo.path(), "model-b");
    let err = search(
        &query_ctx,
        &SearchParams {
            query: "ping".to_string(),
            ..SearchParams::default()
        },
    )
    .unwrap_err();

    match err {
        SearchCodeError::ModelMismatch { indexed, current, .. } => {
            assert_eq!(indexed, "model-a");
            assert_eq!(current, "model-b");
        }
        other => panic!("expected ModelMismatch, got {other:?}"),
    }
}

#[test]
fn incremental_reindex_with_different_model_id_fails_with_model_mismatch() {
    let repo = common::scratch_repo(&[("a.ts", "export function ping() { return 1; }\n")]);
    let build_ctx = common::build_context_with_model(repo.path(), "model-a");
    index_full(&build_ctx, &IndexOptions::default()).unwrap();

    let other_ctx = common::build_context_with_model(repo.path(), "model-b");
    let err = semcode::indexer::index_incremental(&other_ctx, &IndexOptions::default()).unwrap_err();
    assert!(matches!(err, SearchCodeError::ModelMismatch { .. }));
}
