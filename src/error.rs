//! Error types used by the ferry runtime and the car tasks.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the supervisor or the ferry controller.
//!   These are fatal to the whole simulation.
//! - [`TaskError`]: errors raised by an individual car task. These terminate
//!   only the offending car and never cross task boundaries.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::time::Duration;
use thiserror::Error;

use crate::ferry::{Phase, Signal};

/// # Errors produced by the ferry runtime.
///
/// The controller is a singleton with no replacement, so anything that stops it
/// from signalling or waiting reliably ends the simulation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration rejected before any task started.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// The ferry controller could not continue its cycle.
    #[error("ferry controller failed while {phase}: {reason}")]
    Controller {
        /// Phase the controller was in when it failed.
        phase: Phase,
        /// The underlying failure.
        reason: String,
    },

    /// Shutdown grace period was exceeded; some cars were still running and had to be aborted.
    #[error("shutdown timeout {grace:?} exceeded; {stuck} car task(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of car tasks that did not finish in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ferryvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::Controller { .. } => "runtime_controller_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
            RuntimeError::Controller { phase, reason } => {
                format!("controller failed in {phase}: {reason}")
            }
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck cars={stuck}")
            }
        }
    }
}

/// # Errors produced by a car task.
///
/// A car that hits one of these logs it and stops. The ferry and the other
/// cars carry on.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// A permit signal was closed while the car waited on it.
    #[error("signal {signal} closed")]
    Signal {
        /// The signal that failed.
        signal: Signal,
    },

    /// The deck lock was poisoned by a panicking holder.
    #[error("deck lock poisoned")]
    Poisoned,

    /// The deck rejected a mutation that would break its invariants.
    #[error("protocol violation: {error}")]
    Protocol {
        /// The underlying error message.
        error: String,
    },

    /// The car task panicked; the panic was caught at the task boundary.
    #[error("car panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },

    /// The simulation shut down before the car got a boarding permit.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ferryvisor::TaskError;
    ///
    /// assert_eq!(TaskError::Poisoned.as_label(), "task_poisoned");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Signal { .. } => "task_signal_closed",
            TaskError::Poisoned => "task_poisoned",
            TaskError::Protocol { .. } => "task_protocol",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Signal { signal } => format!("signal closed: {signal}"),
            TaskError::Poisoned => "deck lock poisoned".to_string(),
            TaskError::Protocol { error } => format!("protocol: {error}"),
            TaskError::Panicked { info } => format!("panicked: {info}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the car simply missed the ferry rather than failing.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = RuntimeError::Controller {
            phase: Phase::Loading,
            reason: "boom".into(),
        };
        assert_eq!(err.as_label(), "runtime_controller_failed");
        assert_eq!(
            err.to_string(),
            "ferry controller failed while loading: boom"
        );

        let err = TaskError::Signal {
            signal: Signal::UnboardSignal,
        };
        assert_eq!(err.as_label(), "task_signal_closed");
        assert_eq!(err.as_message(), "signal closed: unboard_signal");
    }

    #[test]
    fn only_canceled_is_graceful() {
        assert!(TaskError::Canceled.is_canceled());
        assert!(!TaskError::Poisoned.is_canceled());
    }
}
