//! IndexWatcher: rate-limited, coalesced `index_incremental` trigger (spec §4.7).

use std::sync::Arc;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::context::Context;
use crate::error::{Result, SearchCodeError};
use crate::indexer::{index_incremental, IncrementalSummary, IndexOptions};

/// Handle returned by `IndexWatcher::start`. `stop()` returns only after any
/// in-flight `index_incremental` run has finished (spec §4.7).
pub struct IndexWatcher {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
    // Kept alive for the watcher's lifetime; dropping it stops filesystem
    // notifications.
    _fs_watcher: RecommendedWatcher,
}

impl IndexWatcher {
    /// Observes `ctx.root` and triggers at most one coalesced
    /// `index_incremental()` per `interval_ms` (spec §4.7, §9 "bounded queue
    /// plus a rate-limited scheduler owning one worker").
    pub fn start<FOk, FErr>(ctx: Arc<Context>, interval_ms: u64, on_index: FOk, on_error: FErr) -> Result<Self>
    where
        FOk: Fn(IncrementalSummary) + Send + 'static,
        FErr: Fn(SearchCodeError) + Send + 'static,
    {
        let (fs_tx, mut fs_rx) = mpsc::unbounded_channel::<()>();
        let mut fs_watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if res.is_ok() {
                let _ = fs_tx.send(());
            }
        })
        .map_err(|e| SearchCodeError::StoreError(format!("watcher init failed: {e}")))?;
        fs_watcher
            .watch(&ctx.root, RecursiveMode::Recursive)
            .map_err(|e| SearchCodeError::StoreError(format!("watch failed: {e}")))?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut dirty = false;
            let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    maybe_event = fs_rx.recv() => {
                        match maybe_event {
                            Some(()) => dirty = true,
                            None => break,
                        }
                    }
                    _ = ticker.tick() => {
                        if !dirty {
                            continue;
                        }
                        dirty = false;
                        let run_ctx = ctx.clone();
                        let result = tokio::task::spawn_blocking(move || {
                            index_incremental(&run_ctx, &IndexOptions::default())
                        })
                        .await;
                        match result {
                            Ok(Ok(summary)) => on_index(summary),
                            Ok(Err(e)) => on_error(e),
                            Err(join_err) => on_error(SearchCodeError::StoreError(join_err.to_string())),
                        }
                    }
                }
            }
        });

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            _fs_watcher: fs_watcher,
        })
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
