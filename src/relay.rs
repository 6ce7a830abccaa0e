//! Orchestrator — the sweep loop: fetch → filter → reserve → transform →
//! deliver, on a jittered timer, one sweep at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::config::ReserveOrder;
use crate::delivery::retry::{RetryDecision, RetryPolicy};
use crate::delivery::sink::MessageSink;
use crate::error::{SendError, StoreError};
use crate::media::MediaFetcher;
use crate::source::fetcher::PostSource;
use crate::source::model::Post;
use crate::store::traits::DedupStore;
use crate::transform::{UnitLimits, build_unit, clean_html};

/// Collaborators the relay drives.
pub struct RelayDeps {
    pub source: Arc<dyn PostSource>,
    pub store: Arc<dyn DedupStore>,
    pub sink: Arc<dyn MessageSink>,
    pub media: MediaFetcher,
}

/// The forwarding pipeline.
pub struct Relay {
    deps: RelayDeps,
    policy: RetryPolicy,
    limits: UnitLimits,
    reserve_order: ReserveOrder,
    shutdown: watch::Receiver<bool>,
    /// Guarantees at most one sweep runs at a time; an overlapping trigger
    /// is skipped, never queued.
    sweep_lock: Mutex<()>,
}

impl Relay {
    pub fn new(
        deps: RelayDeps,
        policy: RetryPolicy,
        reserve_order: ReserveOrder,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            deps,
            policy,
            limits: UnitLimits::default(),
            reserve_order,
            shutdown,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Run the sweep loop until the shutdown signal fires. An in-flight
    /// sweep finishes its current item before the loop exits.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "Relay loop started");
        let mut shutdown = self.shutdown.clone();

        loop {
            if let Err(e) = self.sweep().await {
                error!(error = %e, "Sweep aborted: dedup store unavailable");
            }

            // Jitter desynchronizes the tick from sink-side rate windows.
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(1_000..5_000));
            tokio::select! {
                _ = tokio::time::sleep(interval + jitter) => {}
                _ = shutdown.changed() => {
                    info!("Relay loop stopping");
                    return;
                }
            }
        }
    }

    /// One full sweep. Returns `Err` only when the dedup store fails —
    /// delivery must never proceed without a working dedup record.
    pub async fn sweep(&self) -> Result<(), StoreError> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            debug!("Sweep already in progress; skipping tick");
            return Ok(());
        };

        let posts = match self.deps.source.fetch().await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(error = %e, "Feed fetch failed; retrying next sweep");
                return Ok(());
            }
        };
        if posts.is_empty() {
            debug!("Feed is empty");
            return Ok(());
        }

        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        let unsent = self.deps.store.filter_unsent(&ids).await?;
        if unsent.is_empty() {
            debug!(seen = ids.len(), "No new posts");
            return Ok(());
        }

        // Keep the first occurrence per id, then deliver in ascending id
        // order to preserve source chronology.
        let mut pending: HashSet<u64> = unsent.into_iter().collect();
        let mut candidates: Vec<&Post> = posts.iter().filter(|p| pending.remove(&p.id)).collect();
        candidates.sort_by_key(|p| p.id);

        info!(count = candidates.len(), "New posts to forward");

        if self.reserve_order == ReserveOrder::BeforeSend {
            let candidate_ids: Vec<u64> = candidates.iter().map(|p| p.id).collect();
            self.deps.store.reserve(&candidate_ids).await?;
        }

        for post in candidates {
            if *self.shutdown.borrow() {
                info!("Shutdown requested; stopping sweep early");
                break;
            }

            match self.deliver_post(post).await {
                Ok(()) => {
                    if self.reserve_order == ReserveOrder::AfterSend {
                        self.deps.store.reserve(&[post.id]).await?;
                    }
                    info!(post_id = post.id, "Post forwarded");
                }
                Err(e) => {
                    // Logged and skipped; the sweep continues with the
                    // remaining posts.
                    warn!(post_id = post.id, error = %e, "Delivery abandoned for this sweep");
                }
            }
        }

        Ok(())
    }

    /// Transform and deliver one post: media batches first (the first batch
    /// carries the caption), then any remaining text chunks.
    async fn deliver_post(&self, post: &Post) -> Result<(), SendError> {
        let cleaned = clean_html(&post.raw_body);
        let media = self.deps.media.collect_media(post).await;
        let unit = build_unit(post, &cleaned, media, &self.limits);

        for (i, batch) in unit.batches.iter().enumerate() {
            let caption = if i == 0 { unit.caption.as_deref() } else { None };
            self.send_with_retry(|| self.deps.sink.send_media_batch(batch, caption))
                .await?;
        }

        for message in &unit.messages {
            self.send_with_retry(|| self.deps.sink.send_text(message))
                .await?;
        }

        Ok(())
    }

    /// Bounded retry loop around one sink call, driven by the policy.
    async fn send_with_retry<F, Fut>(&self, mut op: F) -> Result<(), SendError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), SendError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            let err = match op().await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            match self.policy.decide(&err, attempt) {
                RetryDecision::Wait(delay) => {
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err,
                        "Send failed; retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Abandon => return Err(err),
            }
        }
    }
}
