//! Runtime core: configuration, orchestration and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (built through
//! [`SupervisorBuilder`]), which runs the ferry, spawns the cars and shuts
//! everything down, plus the [`Config`] and [`Clock`] it runs with.
//!
//! Internal modules:
//! - [`supervisor`]: drives the run, supervises car tasks, reaps them within the grace period;
//! - [`builder`]: validates the config and wires the bus and subscribers;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`clock`]: time origin shared by the deadline and the log stamps;
//! - [`config`]: run settings and their validation.

mod builder;
mod clock;
mod config;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use clock::Clock;
pub use config::Config;
pub use supervisor::Supervisor;
