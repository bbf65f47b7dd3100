//! Error types used by the setvisor runtime.
//!
//! - [`ConfigError`] rejects a configuration before a session starts.
//! - [`SessionError`] reports failures of the lifecycle itself (grace exceeded, worker panic).
//!
//! The game protocol never fails: rejected toggles, stale selections and racy
//! removals are ordinary outcomes reported as events. Both types provide
//! `as_label` / `as_message` helpers for logging.

use std::time::Duration;
use thiserror::Error;

use crate::board::ParticipantId;

/// # Invalid session configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The table has no slots.
    #[error("table_size must be at least 1")]
    ZeroTableSize,

    /// The deck configured for the session cannot fill a selection.
    #[error("deck has {deck} cards; at least {needed} are required")]
    DeckTooSmall {
        /// Cards in the configured deck.
        deck: usize,
        /// Minimum number of cards.
        needed: usize,
    },

    /// Players would have no room for key presses.
    #[error("inbox_capacity must be at least 1")]
    ZeroInboxCapacity,

    /// Deck size exceeds what the feature encoding can express.
    #[error("deck_size {deck} exceeds {max} distinct cards for the configured features")]
    FeatureMismatch {
        /// Configured deck size.
        deck: usize,
        /// Cards expressible with `feature_size ^ feature_count`.
        max: u64,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use setvisor::ConfigError;
    ///
    /// assert_eq!(ConfigError::ZeroTableSize.as_label(), "config_zero_table_size");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroTableSize => "config_zero_table_size",
            ConfigError::DeckTooSmall { .. } => "config_deck_too_small",
            ConfigError::ZeroInboxCapacity => "config_zero_inbox_capacity",
            ConfigError::FeatureMismatch { .. } => "config_feature_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by a running session.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SessionError {
    /// After a termination request, the workers did not stop within the grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Players whose workers were still alive.
        stuck: Vec<ParticipantId>,
    },

    /// A worker task panicked.
    #[error("worker '{worker}' panicked")]
    WorkerPanicked {
        /// Name of the worker ("dealer", "player-3", ...).
        worker: String,
    },
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use setvisor::SessionError;
    /// use std::time::Duration;
    ///
    /// let err = SessionError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "session_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::GraceExceeded { .. } => "session_grace_exceeded",
            SessionError::WorkerPanicked { .. } => "session_worker_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SessionError::GraceExceeded { grace, stuck } => {
                let ids: Vec<usize> = stuck.iter().map(|p| p.0).collect();
                format!("grace exceeded after {grace:?}; stuck players={ids:?}")
            }
            SessionError::WorkerPanicked { worker } => format!("panic in {worker}"),
        }
    }
}
