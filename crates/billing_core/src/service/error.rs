use crate::repo::RepoError;
use crate::tasks::TaskQueueError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BillingResult<T> = Result<T, BillingError>;

/// Service-level error for billing use-cases.
#[derive(Debug)]
pub enum BillingError {
    /// Validation, lookup, protection or storage failure.
    Repo(RepoError),
    /// The row was saved but follow-up work could not be scheduled.
    Queue(TaskQueueError),
}

impl Display for BillingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Queue(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BillingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Queue(err) => Some(err),
        }
    }
}

impl From<RepoError> for BillingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TaskQueueError> for BillingError {
    fn from(value: TaskQueueError) -> Self {
        Self::Queue(value)
    }
}
