//! Catalog records: services and pricing plans.
//!
//! # Responsibility
//! - Define `Service` and `Plan` along with their validation rules.
//! - Track the load-time value of the fields that drive recalculation
//!   (`Service::full_price`, `Plan::discount_percent`).
//! - Provide the pure pricing rule applied by recalculation tasks.
//!
//! # Invariants
//! - The tracked value equals the persisted value right after a load or a
//!   successful save.
//! - `discount_percent <= 100`, so `discounted_price <= full_price`.

use super::validation::{require_max_chars, require_non_empty};
use super::{ModelValidationError, PlanId, ServiceId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SERVICE_NAME_MAX_CHARS: usize = 50;
pub const DISCOUNT_PERCENT_MAX: u32 = 100;

/// Billable offering with a list price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    id: Option<ServiceId>,
    pub name: String,
    pub full_price: u32,
    #[serde(skip)]
    loaded_full_price: u32,
}

impl Service {
    pub fn new(name: impl Into<String>, full_price: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            full_price,
            loaded_full_price: full_price,
        }
    }

    pub(crate) fn from_storage(id: ServiceId, name: String, full_price: u32) -> Self {
        Self {
            id: Some(id),
            name,
            full_price,
            loaded_full_price: full_price,
        }
    }

    pub fn id(&self) -> Option<ServiceId> {
        self.id
    }

    /// Returns whether `full_price` differs from the value seen at load time.
    pub fn full_price_changed(&self) -> bool {
        self.full_price != self.loaded_full_price
    }

    pub(crate) fn assign_id(&mut self, id: ServiceId) {
        self.id = Some(id);
    }

    /// Accepts the current `full_price` as the persisted baseline.
    pub(crate) fn mark_saved(&mut self) {
        self.loaded_full_price = self.full_price;
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("name", &self.name)?;
        require_max_chars("name", &self.name, SERVICE_NAME_MAX_CHARS)
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Pricing policy applied to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// No discount expected.
    Full,
    Student,
    Discount,
}

impl PlanType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Student => "student",
            Self::Discount => "discount",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full" => Some(Self::Full),
            "student" => Some(Self::Student),
            "discount" => Some(Self::Discount),
            _ => None,
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discount policy shared by many subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    id: Option<PlanId>,
    pub plan_type: PlanType,
    pub discount_percent: u32,
    #[serde(skip)]
    loaded_discount_percent: u32,
}

impl Plan {
    /// Creates an unsaved plan with `discount_percent = 0`.
    pub fn new(plan_type: PlanType) -> Self {
        Self::with_discount(plan_type, 0)
    }

    pub fn with_discount(plan_type: PlanType, discount_percent: u32) -> Self {
        Self {
            id: None,
            plan_type,
            discount_percent,
            loaded_discount_percent: discount_percent,
        }
    }

    pub(crate) fn from_storage(id: PlanId, plan_type: PlanType, discount_percent: u32) -> Self {
        Self {
            id: Some(id),
            plan_type,
            discount_percent,
            loaded_discount_percent: discount_percent,
        }
    }

    pub fn id(&self) -> Option<PlanId> {
        self.id
    }

    /// Returns whether `discount_percent` differs from the value seen at load time.
    pub fn discount_percent_changed(&self) -> bool {
        self.discount_percent != self.loaded_discount_percent
    }

    pub(crate) fn assign_id(&mut self, id: PlanId) {
        self.id = Some(id);
    }

    pub(crate) fn mark_saved(&mut self) {
        self.loaded_discount_percent = self.discount_percent;
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.discount_percent > DISCOUNT_PERCENT_MAX {
            return Err(ModelValidationError::DiscountOutOfRange(
                self.discount_percent,
            ));
        }
        Ok(())
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.plan_type, f)
    }
}

/// Applies a percentage discount to a list price, rounding down.
///
/// Discounts above 100 are clamped so the result never underflows.
pub fn discounted_price(full_price: u32, discount_percent: u32) -> u32 {
    let kept_percent = u64::from(DISCOUNT_PERCENT_MAX - discount_percent.min(DISCOUNT_PERCENT_MAX));
    let price = u64::from(full_price) * kept_percent / u64::from(DISCOUNT_PERCENT_MAX);
    // price <= full_price, so the narrowing cannot fail.
    u32::try_from(price).unwrap_or(full_price)
}

#[cfg(test)]
mod tests {
    use super::{discounted_price, Plan, PlanType, Service};
    use crate::model::ModelValidationError;

    #[test]
    fn discounted_price_rounds_down() {
        assert_eq!(discounted_price(1000, 0), 1000);
        assert_eq!(discounted_price(1000, 15), 850);
        assert_eq!(discounted_price(999, 50), 499);
        assert_eq!(discounted_price(1000, 100), 0);
    }

    #[test]
    fn discounted_price_handles_large_prices_and_clamps_discount() {
        assert_eq!(discounted_price(u32::MAX, 0), u32::MAX);
        assert_eq!(discounted_price(500, 250), 0);
    }

    #[test]
    fn service_tracks_full_price_changes_until_saved() {
        let mut service = Service::new("hosting", 100);
        assert!(!service.full_price_changed());

        service.full_price = 120;
        assert!(service.full_price_changed());

        service.mark_saved();
        assert!(!service.full_price_changed());

        service.full_price = 100;
        assert!(service.full_price_changed());
    }

    #[test]
    fn setting_same_value_is_not_a_change() {
        let mut plan = Plan::from_storage(7, PlanType::Student, 20);
        plan.discount_percent = 20;
        assert!(!plan.discount_percent_changed());
    }

    #[test]
    fn plan_validation_enforces_discount_bounds() {
        assert!(Plan::with_discount(PlanType::Discount, 0).validate().is_ok());
        assert!(Plan::with_discount(PlanType::Discount, 100).validate().is_ok());
        assert_eq!(
            Plan::with_discount(PlanType::Discount, 101).validate(),
            Err(ModelValidationError::DiscountOutOfRange(101))
        );
    }

    #[test]
    fn service_validation_checks_name() {
        assert!(matches!(
            Service::new("  ", 10).validate(),
            Err(ModelValidationError::EmptyField("name"))
        ));
        assert!(matches!(
            Service::new("x".repeat(51), 10).validate(),
            Err(ModelValidationError::FieldTooLong { field: "name", .. })
        ));
    }

    #[test]
    fn plan_type_roundtrips_through_storage_text() {
        for plan_type in [PlanType::Full, PlanType::Student, PlanType::Discount] {
            assert_eq!(PlanType::parse(plan_type.as_str()), Some(plan_type));
        }
        assert_eq!(PlanType::parse("vip"), None);
    }
}
