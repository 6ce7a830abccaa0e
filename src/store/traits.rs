//! `DedupStore` trait — the single source of truth for "has this post
//! been forwarded". The pipeline never relies on in-process memory alone;
//! the store must survive restarts.

use async_trait::async_trait;

use crate::error::StoreError;

/// Backend-agnostic dedup store.
///
/// Invariant: once `reserve` succeeds for an id, every subsequent
/// `filter_unsent` call excludes that id, including across restarts.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Return the subset of `ids` NOT already recorded, in a single
    /// round trip.
    async fn filter_unsent(&self, ids: &[u64]) -> Result<Vec<u64>, StoreError>;

    /// Record `ids` as forwarded. Idempotent: ids already present are
    /// treated as success, not error.
    async fn reserve(&self, ids: &[u64]) -> Result<(), StoreError>;
}
