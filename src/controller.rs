use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::action::Action;
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::renderer::ItemRenderer;
use crate::types::{Cursor, Page};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    pub cursor: Cursor,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerOptions {
    /// Remember one trigger seen while loading and replay it afterwards.
    pub coalesce_triggers: bool,
    /// Drop triggers for this long after a failed fetch. Zero disables.
    pub failure_cooldown: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    Dropped,
    Deferred,
    CoolingDown,
}

/// Owns the pagination cursor and the single-flight guard. A trigger starts
/// at most one fetch on a spawned task; its result comes back through the
/// action channel and is applied by [`FeedController::on_page_fetched`].
/// Until then further triggers are dropped, or deferred when coalescing.
pub struct FeedController {
    state: FeedState,
    fetcher: Arc<dyn PageFetcher>,
    options: ControllerOptions,
    pending: bool,
    last_failure: Option<Instant>,
    fetch_count: u64,
    rendered_count: usize,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl FeedController {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        options: ControllerOptions,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            state: FeedState::default(),
            fetcher,
            options,
            pending: false,
            last_failure: None,
            fetch_count: 0,
            rendered_count: 0,
            action_tx,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.state.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Fetches accepted so far, successful or not.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered_count
    }

    /// Handle a "near end" signal.
    pub fn on_trigger(&mut self) -> TriggerOutcome {
        if self.state.loading {
            if self.options.coalesce_triggers {
                self.pending = true;
                tracing::debug!("trigger deferred while loading");
                return TriggerOutcome::Deferred;
            }
            tracing::debug!("trigger dropped while loading");
            return TriggerOutcome::Dropped;
        }

        if let Some(failed_at) = self.last_failure {
            if failed_at.elapsed() < self.options.failure_cooldown {
                tracing::debug!("trigger dropped during failure cooldown");
                return TriggerOutcome::CoolingDown;
            }
        }

        self.state.loading = true;
        self.fetch_count += 1;
        self.spawn_fetch(self.state.cursor.clone());
        TriggerOutcome::Started
    }

    /// Apply the result of the in-flight fetch. Items are handed to the
    /// renderer in page order and the cursor moves to the last item's id.
    /// On failure nothing changes except that the guard is released.
    ///
    /// Returns the number of items rendered, or the fetch error.
    pub fn on_page_fetched(
        &mut self,
        result: Result<Page>,
        renderer: &mut dyn ItemRenderer,
    ) -> Result<usize> {
        if !self.state.loading {
            tracing::warn!("page result arrived with no fetch in flight; ignoring");
            return Ok(0);
        }
        self.state.loading = false;

        let outcome = match result {
            Ok(page) => {
                let next = page.next_cursor();
                let count = page.len();
                for item in page.into_items() {
                    renderer.render(item);
                }
                tracing::debug!(from = %self.state.cursor, to = %next, count, "page applied");
                self.state.cursor = next;
                self.rendered_count += count;
                self.last_failure = None;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(cursor = %self.state.cursor, error = %e, "page fetch failed");
                self.last_failure = Some(Instant::now());
                Err(e)
            }
        };

        if std::mem::take(&mut self.pending) {
            self.on_trigger();
        }

        outcome
    }

    fn spawn_fetch(&self, cursor: Cursor) {
        let tx = self.action_tx.clone();
        let fetcher = Arc::clone(&self.fetcher);
        tracing::debug!(fetcher = fetcher.name(), cursor = %cursor, "fetching page");
        tokio::spawn(async move {
            let result = fetcher.fetch(&cursor).await;
            tx.send(Action::PageFetched(result)).ok();
        });
    }
}
