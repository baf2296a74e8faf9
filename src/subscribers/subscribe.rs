//! # Subscriber trait
//!
//! A [`Subscribe`] implementation receives every event of a run, after the fact.
//! Cars publish `UnitEntered`/`UnitExited` while they hold the deck lock, so the
//! bus never waits on a subscriber: each one gets its own bounded queue and
//! worker in the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! A subscriber that falls behind loses events (reported as `SubscriberOverflow`)
//! rather than slowing the ferry down. Size the queue with
//! [`Subscribe::queue_capacity`].

use async_trait::async_trait;

use crate::events::Event;

/// Receives simulation events.
///
/// Runs on its own worker task. Printing or writing a file here is fine; the
/// cars and the controller never wait for it.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this subscriber.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
