//! Billing domain model: clients, services, plans and subscriptions.
//!
//! # Responsibility
//! - Define canonical records used by repositories and services.
//! - Own field-level validation so writes fail before reaching SQL.
//! - Remember load-time values of fields whose change fans out work.
//!
//! # Invariants
//! - An entity without an id has never been persisted.
//! - `Plan::discount_percent` stays within `0..=100`.

pub mod catalog;
pub mod client;
pub mod subscription;
mod validation;

pub use validation::ModelValidationError;

pub type ClientId = i64;
pub type ServiceId = i64;
pub type PlanId = i64;
pub type SubscriptionId = i64;
