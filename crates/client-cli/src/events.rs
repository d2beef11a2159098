//! Typed application events.
//!
//! Components never call each other directly; they publish an [`AppEvent`]
//! and whoever cares (usually the shell) reacts to it.

use shared::{Booking, User};
use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A request was rejected with 401; stored credentials are already gone
    AuthError,
    LoginSucceeded(User),
    /// Credentials were cleared on purpose; start over
    LoggedOut,
    OpenLogin,
    OpenProfile,
    OpenAdmin,
    BookingSucceeded(Booking),
    /// The credential file was changed by another process
    StorageChanged,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: AppEvent) {
        tracing::debug!("event: {:?}", event);
        // nobody listening is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(AppEvent::OpenLogin);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_events_in_order() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(AppEvent::AuthError);
        bus.publish(AppEvent::OpenProfile);

        assert_eq!(first.recv().await.unwrap(), AppEvent::AuthError);
        assert_eq!(first.recv().await.unwrap(), AppEvent::OpenProfile);
        assert_eq!(second.recv().await.unwrap(), AppEvent::AuthError);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(AppEvent::OpenAdmin);
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
