//! # Event subscribers.
//!
//! ```text
//! Ferry / Car / Supervisor ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                              │
//!                                                              ▼
//!                                                        SubscriberSet
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter   custom     ...
//! ```
//!
//! - [`Subscribe`] trait for custom handlers
//! - [`SubscriberSet`] bounded per-subscriber queues, panic isolation
//! - [`LogWriter`] the `[Clock : x.xx] ...` log stream

mod log;
mod set;
mod subscribe;

pub use log::{LogWriter, Stream};
pub use set::SubscriberSet;
pub(crate) use set::panic_message;
pub use subscribe::Subscribe;
