//! Core billing model for services, plans and subscriptions.
//!
//! Saves propagate price-relevant changes to dependent subscriptions through
//! a background task queue; subscription saves and deletes notify listeners
//! through signals.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod signals;
pub mod tasks;

pub use cache::{delete_cache_total_sum, save_cache_total_sum, TotalSumCache};
pub use config::BillingConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catalog::{discounted_price, Plan, PlanType, Service};
pub use model::client::Client;
pub use model::subscription::{Subscription, SubscriptionDetail};
pub use model::{ClientId, ModelValidationError, PlanId, ServiceId, SubscriptionId};
pub use repo::{
    ClientRepository, EntityKind, PlanRepository, RepoError, RepoResult, ServiceRepository,
    SqliteBillingRepository, SubscriptionListQuery, SubscriptionRepository,
};
pub use service::catalog_service::CatalogService;
pub use service::subscription_service::SubscriptionService;
pub use service::{BillingError, BillingResult};
pub use signals::{PostDeleteListener, PostSaveListener, SignalBus};
pub use tasks::{
    task_channel, ChannelTaskQueue, DrainReport, RecalcTask, TaskError, TaskQueue,
    TaskQueueError, TaskWorker,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
