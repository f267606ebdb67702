//! Catalog use-case service: services and plans.
//!
//! # Responsibility
//! - Persist services and plans.
//! - Fan out recalculation tasks to dependent subscriptions when a
//!   price-relevant field changed since load.
//!
//! # Invariants
//! - Tasks are enqueued only after the row is persisted.
//! - Changed `Service::full_price` -> one `SetPrice` per subscription.
//! - Changed `Plan::discount_percent` -> one `SetPrice` and one `SetComment`
//!   per subscription.
//! - Unchanged fields enqueue nothing.
//! - The tracked baseline is refreshed only after every enqueue succeeded.

use crate::model::catalog::{Plan, Service};
use crate::model::{PlanId, ServiceId};
use crate::repo::{PlanRepository, RepoResult, ServiceRepository, SubscriptionRepository};
use crate::service::BillingResult;
use crate::tasks::{RecalcTask, TaskQueue};
use log::info;
use std::time::Instant;

/// Service/plan use-cases with change propagation.
pub struct CatalogService<R, Q> {
    repo: R,
    queue: Q,
}

impl<R, Q> CatalogService<R, Q>
where
    R: ServiceRepository + PlanRepository + SubscriptionRepository,
    Q: TaskQueue,
{
    pub fn new(repo: R, queue: Q) -> Self {
        Self { repo, queue }
    }

    /// Inserts or updates `service`, then schedules price recalculation for
    /// its subscriptions when `full_price` changed.
    ///
    /// "Changed" compares against the value from the last load or successful
    /// save of this instance, so the baseline moves with every save. Saving
    /// the same instance twice after one edit schedules work once, and
    /// reverting to an earlier price schedules it again.
    ///
    /// # Errors
    /// - `BillingError::Repo` when validation or persistence fails; nothing
    ///   is enqueued in that case.
    /// - `BillingError::Queue` when scheduling fails after the row was saved.
    pub fn save_service(&self, service: &mut Service) -> BillingResult<ServiceId> {
        let started_at = Instant::now();
        let id = match service.id() {
            Some(id) => {
                self.repo.update_service(service)?;
                id
            }
            None => self.repo.create_service(service)?,
        };

        let changed = service.full_price_changed();
        let mut enqueued = 0usize;
        if changed {
            for subscription_id in self.repo.subscription_ids_for_service(id)? {
                self.queue.enqueue(RecalcTask::SetPrice(subscription_id))?;
                enqueued += 1;
            }
        }
        service.mark_saved();

        info!(
            "event=service_save module=service status=ok service_id={} full_price_changed={} tasks_enqueued={} duration_ms={}",
            id,
            changed,
            enqueued,
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    pub fn get_service(&self, id: ServiceId) -> RepoResult<Option<Service>> {
        self.repo.get_service(id)
    }

    pub fn list_services(&self) -> RepoResult<Vec<Service>> {
        self.repo.list_services()
    }

    /// Deletes a service that no subscription references.
    pub fn delete_service(&self, id: ServiceId) -> RepoResult<()> {
        self.repo.delete_service(id)
    }

    /// Inserts or updates `plan`, then schedules price and comment
    /// recalculation for its subscriptions when `discount_percent` changed.
    /// The baseline is refreshed per save, as in [`Self::save_service`].
    ///
    /// # Errors
    /// - `BillingError::Repo` when the discount is outside `0..=100` (checked
    ///   before any SQL runs) or persistence fails.
    /// - `BillingError::Queue` when scheduling fails after the row was saved.
    pub fn save_plan(&self, plan: &mut Plan) -> BillingResult<PlanId> {
        let started_at = Instant::now();
        let id = match plan.id() {
            Some(id) => {
                self.repo.update_plan(plan)?;
                id
            }
            None => self.repo.create_plan(plan)?,
        };

        let changed = plan.discount_percent_changed();
        let mut enqueued = 0usize;
        if changed {
            for subscription_id in self.repo.subscription_ids_for_plan(id)? {
                self.queue.enqueue(RecalcTask::SetPrice(subscription_id))?;
                self.queue.enqueue(RecalcTask::SetComment(subscription_id))?;
                enqueued += 2;
            }
        }
        plan.mark_saved();

        info!(
            "event=plan_save module=service status=ok plan_id={} discount_changed={} tasks_enqueued={} duration_ms={}",
            id,
            changed,
            enqueued,
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    pub fn get_plan(&self, id: PlanId) -> RepoResult<Option<Plan>> {
        self.repo.get_plan(id)
    }

    pub fn list_plans(&self) -> RepoResult<Vec<Plan>> {
        self.repo.list_plans()
    }

    /// Deletes a plan that no subscription references.
    pub fn delete_plan(&self, id: PlanId) -> RepoResult<()> {
        self.repo.delete_plan(id)
    }
}
