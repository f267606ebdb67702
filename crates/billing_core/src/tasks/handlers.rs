//! Task bodies for subscription price and comment recalculation.
//!
//! # Invariants
//! - `set_price` writes `discounted_price(full_price, discount_percent)`.
//! - `set_price` invalidates the cached total sum after writing.
//! - A task for a deleted subscription fails with `SubscriptionNotFound`.

use crate::cache::TotalSumCache;
use crate::model::catalog::discounted_price;
use crate::model::subscription::{PricingInputs, COMMENT_MAX_CHARS};
use crate::model::SubscriptionId;
use crate::repo::{EntityKind, RepoError, SubscriptionRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TaskError {
    SubscriptionNotFound(SubscriptionId),
    Repo(RepoError),
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubscriptionNotFound(id) => write!(f, "subscription not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::SubscriptionNotFound(_) => None,
        }
    }
}

impl From<RepoError> for TaskError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: EntityKind::Subscription,
                id,
            } => Self::SubscriptionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Recomputes and stores the price of one subscription.
///
/// Returns the price that was written.
pub fn set_price<R: SubscriptionRepository + ?Sized>(
    repo: &R,
    cache: &TotalSumCache,
    subscription_id: SubscriptionId,
) -> Result<u32, TaskError> {
    let inputs = load_inputs(repo, subscription_id)?;
    let price = discounted_price(inputs.full_price, inputs.discount_percent);
    repo.set_subscription_price(subscription_id, price)?;
    cache.invalidate();
    Ok(price)
}

/// Rewrites the comment of one subscription from its current plan.
///
/// Returns the comment that was written.
pub fn set_comment<R: SubscriptionRepository + ?Sized>(
    repo: &R,
    subscription_id: SubscriptionId,
) -> Result<String, TaskError> {
    let inputs = load_inputs(repo, subscription_id)?;
    let comment = plan_comment(&inputs);
    repo.set_subscription_comment(subscription_id, &comment)?;
    Ok(comment)
}

fn load_inputs<R: SubscriptionRepository + ?Sized>(
    repo: &R,
    subscription_id: SubscriptionId,
) -> Result<PricingInputs, TaskError> {
    repo.pricing_inputs(subscription_id)?
        .ok_or(TaskError::SubscriptionNotFound(subscription_id))
}

fn plan_comment(inputs: &PricingInputs) -> String {
    format!(
        "{} plan, {}% off",
        inputs.plan_type, inputs.discount_percent
    )
    .chars()
    .take(COMMENT_MAX_CHARS)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::plan_comment;
    use crate::model::catalog::PlanType;
    use crate::model::subscription::PricingInputs;

    #[test]
    fn plan_comment_mentions_plan_and_discount() {
        let inputs = PricingInputs {
            full_price: 500,
            plan_type: PlanType::Student,
            discount_percent: 30,
        };
        assert_eq!(plan_comment(&inputs), "student plan, 30% off");
    }
}
