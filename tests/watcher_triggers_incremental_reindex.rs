//! IndexWatcher (spec §4.7): a filesystem change is coalesced into a single
//! `indexIncremental` run within one tick of the configured interval.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use semcode::indexer::{index_full, IndexOptions};
use semcode::watcher::IndexWatcher;

#[tokio::test]
async fn file_change_triggers_one_coalesced_reindex() {
    let repo = common::scratch_repo(&[("a.rs", "pub fn one() -> i32 { 1 }\n")]);
    let ctx = Arc::new(common::build_context(repo.path()));
    index_full(&ctx, &IndexOptions::default()).unwrap();

    let reindex_count = Arc::new(AtomicUsize::new(0));
    let counter = reindex_count.clone();
    let watcher = IndexWatcher::start(
        ctx.clone(),
        100,
        move |_summary| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        |_err| {},
    )
    .unwrap();

    std::fs::write(repo.path().join("b.rs"), "pub fn two() -> i32 { 2 }\n").unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    watcher.stop().await;

    assert!(reindex_count.load(Ordering::SeqCst) >= 1);
}
