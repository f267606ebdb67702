//! Subscription record linking a client to a service under a plan.

use super::catalog::PlanType;
use super::validation::require_max_chars;
use super::{ClientId, ModelValidationError, PlanId, ServiceId, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const COMMENT_MAX_CHARS: usize = 50;

/// Join entity: one client, one service, one plan.
///
/// `price` starts at 0 and is filled in asynchronously by the price task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    id: Option<SubscriptionId>,
    pub client_id: ClientId,
    pub service_id: ServiceId,
    pub plan_id: PlanId,
    pub price: u32,
    pub comment: String,
}

impl Subscription {
    pub fn new(client_id: ClientId, service_id: ServiceId, plan_id: PlanId) -> Self {
        Self {
            id: None,
            client_id,
            service_id,
            plan_id,
            price: 0,
            comment: String::new(),
        }
    }

    pub(crate) fn from_storage(
        id: SubscriptionId,
        client_id: ClientId,
        service_id: ServiceId,
        plan_id: PlanId,
        price: u32,
        comment: String,
    ) -> Self {
        Self {
            id: Some(id),
            client_id,
            service_id,
            plan_id,
            price,
            comment,
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// True until the first successful save assigns an id.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub(crate) fn assign_id(&mut self, id: SubscriptionId) {
        self.id = Some(id);
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_max_chars("comment", &self.comment, COMMENT_MAX_CHARS)
    }
}

/// Joined read model used for listings and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionDetail {
    pub id: SubscriptionId,
    pub client_name: String,
    pub service_name: String,
    pub plan_type: PlanType,
    pub price: u32,
    pub comment: String,
}

impl Display for SubscriptionDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Client: {} | Service: {}",
            self.client_name, self.service_name
        )
    }
}

/// Everything the recalculation tasks need about one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingInputs {
    pub full_price: u32,
    pub plan_type: PlanType,
    pub discount_percent: u32,
}

#[cfg(test)]
mod tests {
    use super::{PlanType, Subscription, SubscriptionDetail};

    #[test]
    fn new_subscription_has_defaults() {
        let subscription = Subscription::new(1, 2, 3);
        assert!(subscription.is_new());
        assert_eq!(subscription.price, 0);
        assert!(subscription.comment.is_empty());
    }

    #[test]
    fn comment_is_limited() {
        let mut subscription = Subscription::new(1, 2, 3);
        subscription.comment = "c".repeat(51);
        assert!(subscription.validate().is_err());
        subscription.comment = "c".repeat(50);
        assert!(subscription.validate().is_ok());
    }

    #[test]
    fn detail_display_names_client_and_service() {
        let detail = SubscriptionDetail {
            id: 1,
            client_name: "Acme".to_string(),
            service_name: "Hosting".to_string(),
            plan_type: PlanType::Full,
            price: 0,
            comment: String::new(),
        };
        assert_eq!(detail.to_string(), "Client: Acme | Service: Hosting");
    }
}
