//! Billing use-case services.
//!
//! # Responsibility
//! - Wrap repository writes with their reactive side effects:
//!   recalculation tasks on save, post-delete signals on delete.
//! - Keep callers decoupled from storage and queue details.

pub mod catalog_service;
mod error;
pub mod subscription_service;

pub use error::{BillingError, BillingResult};
