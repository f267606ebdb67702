//! Background recalculation tasks.
//!
//! # Responsibility
//! - Define the task invocation contract (`set_price`, `set_comment`).
//! - Abstract the queue behind `TaskQueue` so saves only enqueue.
//! - Execute queued tasks against storage through `TaskWorker`.
//!
//! # Invariants
//! - Enqueue is fire-and-forget: it never waits for task execution.
//! - Task failures are logged by the worker and never reach the saver.
//! - No ordering is promised between tasks.

use crate::model::SubscriptionId;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod channel;
pub mod handlers;
mod worker;

pub use channel::{task_channel, ChannelTaskQueue};
pub use handlers::{set_comment, set_price, TaskError};
pub use worker::{DrainReport, TaskWorker};

/// One unit of recalculation work, keyed by subscription primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecalcTask {
    SetPrice(SubscriptionId),
    SetComment(SubscriptionId),
}

impl RecalcTask {
    pub fn name(self) -> &'static str {
        match self {
            Self::SetPrice(_) => "set_price",
            Self::SetComment(_) => "set_comment",
        }
    }

    pub fn subscription_id(self) -> SubscriptionId {
        match self {
            Self::SetPrice(id) | Self::SetComment(id) => id,
        }
    }
}

impl Display for RecalcTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.subscription_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskQueueError {
    /// Nobody is consuming the queue anymore.
    Closed(RecalcTask),
}

impl Display for TaskQueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed(task) => write!(f, "task queue is closed; dropped {task}"),
        }
    }
}

impl Error for TaskQueueError {}

/// Sink for recalculation tasks.
pub trait TaskQueue {
    /// Schedules `task` without waiting for it to run.
    fn enqueue(&self, task: RecalcTask) -> Result<(), TaskQueueError>;
}
