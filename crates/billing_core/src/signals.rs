//! Post-save and post-delete signal bus for subscriptions.
//!
//! # Responsibility
//! - Decouple save and deletion side effects from the writing code path.
//! - Deliver the saved or removed `Subscription` to every connected listener.
//!
//! # Invariants
//! - Listeners run synchronously, in connection order, once per write.
//! - Signals fire only after the row was written or is gone.

use crate::model::subscription::Subscription;
use std::sync::Arc;

/// Receiver of post-delete notifications.
pub trait PostDeleteListener: Send + Sync {
    /// Stable id used in log events.
    fn listener_id(&self) -> &'static str;
    fn on_post_delete(&self, subscription: &Subscription);
}

/// Receiver of post-save notifications.
pub trait PostSaveListener: Send + Sync {
    /// Stable id used in log events.
    fn listener_id(&self) -> &'static str;
    /// `created` is true when the save inserted a new row.
    fn on_post_save(&self, subscription: &Subscription, created: bool);
}

#[derive(Clone, Default)]
pub struct SignalBus {
    post_save: Vec<Arc<dyn PostSaveListener>>,
    post_delete: Vec<Arc<dyn PostDeleteListener>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_post_save(&mut self, listener: Arc<dyn PostSaveListener>) {
        self.post_save.push(listener);
    }

    pub fn post_save_listeners(&self) -> usize {
        self.post_save.len()
    }

    pub(crate) fn send_post_save(&self, subscription: &Subscription, created: bool) {
        for listener in &self.post_save {
            log::debug!(
                "event=signal_post_save module=signals status=ok listener={} subscription_id={} created={}",
                listener.listener_id(),
                subscription.id().unwrap_or_default(),
                created
            );
            listener.on_post_save(subscription, created);
        }
    }

    pub fn connect_post_delete(&mut self, listener: Arc<dyn PostDeleteListener>) {
        self.post_delete.push(listener);
    }

    pub fn post_delete_listeners(&self) -> usize {
        self.post_delete.len()
    }

    pub(crate) fn send_post_delete(&self, subscription: &Subscription) {
        for listener in &self.post_delete {
            log::debug!(
                "event=signal_post_delete module=signals status=ok listener={} subscription_id={}",
                listener.listener_id(),
                subscription.id().unwrap_or_default()
            );
            listener.on_post_delete(subscription);
        }
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("post_save", &self.post_save.len())
            .field("post_delete", &self.post_delete.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{PostDeleteListener, PostSaveListener, SignalBus};
    use crate::model::subscription::Subscription;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    #[derive(Default)]
    struct SaveRecorder {
        created: AtomicUsize,
        updated: AtomicUsize,
    }

    impl PostSaveListener for SaveRecorder {
        fn listener_id(&self) -> &'static str {
            "save_recorder"
        }

        fn on_post_save(&self, _subscription: &Subscription, created: bool) {
            let slot = if created { &self.created } else { &self.updated };
            slot.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl PostDeleteListener for Counter {
        fn listener_id(&self) -> &'static str {
            "counter"
        }

        fn on_post_delete(&self, _subscription: &Subscription) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn every_listener_sees_each_signal() {
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let mut bus = SignalBus::new();
        bus.connect_post_delete(first.clone());
        bus.connect_post_delete(second.clone());

        bus.send_post_delete(&Subscription::new(1, 1, 1));

        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn post_save_reports_whether_row_was_created() {
        let recorder = Arc::new(SaveRecorder::default());
        let mut bus = SignalBus::new();
        bus.connect_post_save(recorder.clone());

        let subscription = Subscription::new(1, 1, 1);
        bus.send_post_save(&subscription, true);
        bus.send_post_save(&subscription, false);
        bus.send_post_save(&subscription, false);

        assert_eq!(recorder.created.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.updated.load(Ordering::SeqCst), 2);
        assert_eq!(bus.post_delete_listeners(), 0);
    }
}
