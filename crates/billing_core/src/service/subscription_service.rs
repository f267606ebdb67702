//! Subscription use-case service.
//!
//! # Responsibility
//! - Persist subscriptions and schedule the initial price computation.
//! - Emit the post-save signal after every write and the post-delete signal
//!   after a subscription is removed.
//!
//! # Invariants
//! - Exactly one `SetPrice` task per newly created subscription; updates of
//!   existing subscriptions enqueue nothing.
//! - The post-save signal fires once per successful save, before any task
//!   is scheduled, so listeners see it even when enqueueing fails.
//! - The post-delete signal fires once per successful delete and never for
//!   a failed one.

use crate::model::subscription::{Subscription, SubscriptionDetail};
use crate::model::SubscriptionId;
use crate::repo::{RepoResult, SubscriptionListQuery, SubscriptionRepository};
use crate::service::BillingResult;
use crate::signals::SignalBus;
use crate::tasks::{RecalcTask, TaskQueue};
use log::info;

pub struct SubscriptionService<R, Q> {
    repo: R,
    queue: Q,
    signals: SignalBus,
}

impl<R, Q> SubscriptionService<R, Q>
where
    R: SubscriptionRepository,
    Q: TaskQueue,
{
    pub fn new(repo: R, queue: Q, signals: SignalBus) -> Self {
        Self {
            repo,
            queue,
            signals,
        }
    }

    /// Inserts or updates `subscription`.
    ///
    /// A subscription without an id before the call counts as created and
    /// gets its price scheduled. An update writes every column, `price`
    /// included, so post-save listeners are told in both cases.
    pub fn save_subscription(
        &self,
        subscription: &mut Subscription,
    ) -> BillingResult<SubscriptionId> {
        let creating = subscription.is_new();
        let id = match subscription.id() {
            Some(id) => {
                self.repo.update_subscription(subscription)?;
                id
            }
            None => self.repo.create_subscription(subscription)?,
        };

        self.signals.send_post_save(subscription, creating);

        if creating {
            self.queue.enqueue(RecalcTask::SetPrice(id))?;
        }

        info!(
            "event=subscription_save module=service status=ok subscription_id={id} created={creating} listeners={}",
            self.signals.post_save_listeners()
        );
        Ok(id)
    }

    pub fn get_subscription(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>> {
        self.repo.get_subscription(id)
    }

    pub fn list_subscriptions(
        &self,
        query: &SubscriptionListQuery,
    ) -> RepoResult<Vec<Subscription>> {
        self.repo.list_subscriptions(query)
    }

    pub fn list_subscription_details(
        &self,
        query: &SubscriptionListQuery,
    ) -> RepoResult<Vec<SubscriptionDetail>> {
        self.repo.list_subscription_details(query)
    }

    /// Deletes one subscription and notifies post-delete listeners with the
    /// removed record.
    pub fn delete_subscription(&self, id: SubscriptionId) -> RepoResult<Subscription> {
        let deleted = self.repo.delete_subscription(id)?;
        self.signals.send_post_delete(&deleted);
        info!(
            "event=subscription_delete module=service status=ok subscription_id={id} listeners={}",
            self.signals.post_delete_listeners()
        );
        Ok(deleted)
    }
}
