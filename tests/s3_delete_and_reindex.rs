//! S3 (spec.md §8): deleting a file is reflected in the next incremental run
//! and its chunks stop being searchable.

mod common;

use semcode::indexer::{index_full, index_incremental, IndexOptions};
use semcode::search::{search, SearchParams};

#[test]
fn deleted_file_is_removed_from_index_and_search() {
    let repo = common::scratch_repo(&[(
        "a.ts",
        "export async function loadUser(id: string) {\n    return { id };\n}\n",
    )]);
    let ctx = common::build_context(repo.path());
    index_full(&ctx, &IndexOptions::default()).unwrap();

    std::fs::remove_file(repo.path().join("a.ts")).unwrap();

    let summary = index_incremental(&ctx, &IndexOptions::default()).unwrap();
    assert_eq!(summary.removed, 1);

    let output = search(
        &ctx,
        &SearchParams {
            query: "load user".to_string(),
            ..SearchParams::default()
        },
    )
    .unwrap();
    assert_eq!(output.matches, 0);
}
