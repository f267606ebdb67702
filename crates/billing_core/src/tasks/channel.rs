//! In-process task queue backed by `std::sync::mpsc`.

use super::{RecalcTask, TaskQueue, TaskQueueError};
use log::{debug, warn};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Producer side of the in-process queue. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct ChannelTaskQueue {
    sender: Sender<RecalcTask>,
}

/// Creates a connected queue/receiver pair.
///
/// The receiver is normally handed to `TaskWorker::new`.
pub fn task_channel() -> (ChannelTaskQueue, Receiver<RecalcTask>) {
    let (sender, receiver) = channel();
    (ChannelTaskQueue { sender }, receiver)
}

impl TaskQueue for ChannelTaskQueue {
    fn enqueue(&self, task: RecalcTask) -> Result<(), TaskQueueError> {
        match self.sender.send(task) {
            Ok(()) => {
                debug!(
                    "event=task_enqueue module=tasks status=ok task={} subscription_id={}",
                    task.name(),
                    task.subscription_id()
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    "event=task_enqueue module=tasks status=error task={} subscription_id={} error_code=queue_closed",
                    task.name(),
                    task.subscription_id()
                );
                Err(TaskQueueError::Closed(task))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::task_channel;
    use crate::tasks::{RecalcTask, TaskQueue, TaskQueueError};

    #[test]
    fn enqueued_tasks_reach_receiver() {
        let (queue, receiver) = task_channel();
        queue.enqueue(RecalcTask::SetPrice(4)).unwrap();
        queue.clone().enqueue(RecalcTask::SetComment(4)).unwrap();

        let received: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            received,
            vec![RecalcTask::SetPrice(4), RecalcTask::SetComment(4)]
        );
    }

    #[test]
    fn enqueue_fails_once_receiver_is_dropped() {
        let (queue, receiver) = task_channel();
        drop(receiver);

        let err = queue.enqueue(RecalcTask::SetPrice(9)).unwrap_err();
        assert_eq!(err, TaskQueueError::Closed(RecalcTask::SetPrice(9)));
    }
}
