//! S2 (spec.md §8): modifying a file is picked up by `verifyIndex` and
//! resolved by `indexIncremental`.

mod common;

use semcode::indexer::{index_full, index_incremental, verify_index, IndexOptions};

#[test]
fn verify_then_incremental_reindex_clears_drift() {
    let repo = common::scratch_repo(&[(
        "a.ts",
        "export async function loadUser(id: string) {\n    return { id };\n}\n",
    )]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    std::fs::write(
        repo.path().join("a.ts"),
        "export async function loadUser(id: string) {\n    return { id, loaded: true };\n}\n",
    )
    .unwrap();

    let report = verify_index(&ctx).unwrap();
    assert_eq!(report.changed, 1);
    assert_eq!(report.missing, 0);
    assert_eq!(report.removed, 0);

    let summary = index_incremental(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.files, 1);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.removed, 0);

    let report_after = verify_index(&ctx).unwrap();
    assert_eq!(report_after.changed, 0);
    assert_eq!(report_after.missing, 0);
    assert_eq!(report_after.removed, 0);
}

#[test]
fn reindexing_an_unchanged_tree_is_a_no_op() {
    let repo = common::scratch_repo(&[("a.ts", "export function noop() {}\n")]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let summary = index_incremental(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.files, 0);
    assert_eq!(summary.chunks, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.removed, 0);
}
