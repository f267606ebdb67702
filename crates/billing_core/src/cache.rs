//! Cached "total sum" aggregate over subscription prices.
//!
//! # Responsibility
//! - Memoize the sum of all subscription prices.
//! - Drop the memoized value when subscriptions are saved, deleted or
//!   repriced.
//!
//! # Invariants
//! - A miss always recomputes from storage; a hit never touches storage.
//! - The cache never panics on a poisoned lock; it recovers the inner value.

use crate::model::subscription::Subscription;
use crate::repo::{RepoResult, SubscriptionRepository};
use crate::signals::{PostDeleteListener, PostSaveListener};
use log::debug;
use std::sync::{Mutex, MutexGuard};

pub const TOTAL_SUM_CACHE_KEY: &str = "price_cache";

#[derive(Debug, Default)]
pub struct TotalSumCache {
    value: Mutex<Option<u64>>,
}

impl TotalSumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached total, computing it from `repo` on a miss.
    pub fn total_sum<R: SubscriptionRepository + ?Sized>(&self, repo: &R) -> RepoResult<u64> {
        let mut slot = self.slot();
        if let Some(total) = *slot {
            return Ok(total);
        }

        let total = repo.total_price_sum()?;
        *slot = Some(total);
        debug!("event=cache_fill module=cache status=ok key={TOTAL_SUM_CACHE_KEY} total={total}");
        Ok(total)
    }

    pub fn cached(&self) -> Option<u64> {
        *self.slot()
    }

    pub fn invalidate(&self) {
        if self.slot().take().is_some() {
            debug!("event=cache_invalidate module=cache status=ok key={TOTAL_SUM_CACHE_KEY}");
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<u64>> {
        self.value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Post-delete hook: a deleted subscription makes the cached total stale.
pub fn delete_cache_total_sum(cache: &TotalSumCache, subscription: &Subscription) {
    debug!(
        "event=subscription_delete module=cache status=ok subscription_id={}",
        subscription.id().unwrap_or_default()
    );
    cache.invalidate();
}

/// Post-save hook: a saved subscription may carry a different price.
pub fn save_cache_total_sum(cache: &TotalSumCache, subscription: &Subscription, created: bool) {
    debug!(
        "event=subscription_save module=cache status=ok subscription_id={} created={}",
        subscription.id().unwrap_or_default(),
        created
    );
    cache.invalidate();
}

impl PostSaveListener for TotalSumCache {
    fn listener_id(&self) -> &'static str {
        "save_cache_total_sum"
    }

    fn on_post_save(&self, subscription: &Subscription, created: bool) {
        save_cache_total_sum(self, subscription, created);
    }
}

impl PostDeleteListener for TotalSumCache {
    fn listener_id(&self) -> &'static str {
        "delete_cache_total_sum"
    }

    fn on_post_delete(&self, subscription: &Subscription) {
        delete_cache_total_sum(self, subscription);
    }
}
