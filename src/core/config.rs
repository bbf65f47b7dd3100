//! # Session configuration.
//!
//! Provides [`Config`] centralized settings for a game session.
//!
//! ## Sentinel values
//! - `turn_timeout_ms > 0` → countdown turns, reshuffle when the countdown runs out
//! - `turn_timeout_ms = 0` → open-ended turns; the display shows time since the last deal
//! - `turn_timeout_ms < 0` → untimed; no display, the dealer only wakes on submissions
//!
//! Use [`Config::turn_mode`] instead of comparing `turn_timeout_ms` by hand.

use std::time::Duration;

use crate::board::MAX_MARKERS;
use crate::error::ConfigError;

/// Decoded turn timing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnMode {
    /// Reshuffle after the given turn length.
    Countdown(Duration),
    /// Never reshuffle on time; display elapsed time since the last deal.
    Elapsed,
    /// Never reshuffle on time; no timing display at all.
    Untimed,
}

impl TurnMode {
    /// Whether the dealer polls on a fixed interval in this mode.
    #[inline]
    pub fn polls(&self) -> bool {
        !matches!(self, TurnMode::Untimed)
    }
}

/// Configuration for one game session.
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of slots on the table.
    pub table_size: usize,
    /// Number of cards in the full deck (card ids `0..deck_size`).
    pub deck_size: usize,
    /// Values per card feature (for [`FeatureRules`](crate::FeatureRules)).
    pub feature_size: u32,
    /// Features per card (for [`FeatureRules`](crate::FeatureRules)).
    pub feature_count: u32,

    /// Players fed through [`ActionSender`](crate::ActionSender) (ids `0..human_players`).
    pub human_players: usize,
    /// Players driven by a random key presser (ids after the human ones).
    pub computer_players: usize,

    /// Turn length in milliseconds; see [`TurnMode`] for the sign convention.
    pub turn_timeout_ms: i64,
    /// Countdown values below this threshold are flagged as warnings.
    pub turn_timeout_warning: Duration,
    /// Freeze after a legal combination.
    pub point_freeze: Duration,
    /// Freeze after an illegal combination.
    pub penalty_freeze: Duration,
    /// Delay before each card placement or removal by the dealer.
    pub table_delay: Duration,
    /// Publish a `Hint` event for every legal combination after each deal.
    pub hints: bool,

    /// Capacity of each player's key press inbox.
    pub inbox_capacity: usize,
    /// Dealer tick while a timed turn is running.
    pub poll_interval: Duration,
    /// Upper bound of the freeze display refresh.
    pub freeze_refresh: Duration,

    /// Maximum time to wait for all workers after a termination request.
    pub grace: Duration,
    /// Capacity of the event bus ring buffer (min 1; clamped by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Decodes `turn_timeout_ms`.
    #[inline]
    pub fn turn_mode(&self) -> TurnMode {
        match self.turn_timeout_ms {
            ms if ms > 0 => TurnMode::Countdown(Duration::from_millis(ms as u64)),
            0 => TurnMode::Elapsed,
            _ => TurnMode::Untimed,
        }
    }

    /// Total number of players.
    #[inline]
    pub fn players(&self) -> usize {
        self.human_players + self.computer_players
    }

    /// Interval between freeze display refreshes: the refresh cap, or the
    /// shorter freeze when that is smaller. Never zero.
    #[inline]
    pub fn freeze_refresh_interval(&self) -> Duration {
        self.freeze_refresh
            .min(self.point_freeze)
            .min(self.penalty_freeze)
            .max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the settings that would make a session meaningless.
    ///
    /// `deck` is the number of cards the session will actually deal.
    pub fn validate(&self, deck: usize) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::ZeroTableSize);
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::ZeroInboxCapacity);
        }
        if deck < MAX_MARKERS {
            return Err(ConfigError::DeckTooSmall {
                deck,
                needed: MAX_MARKERS,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - 12 slots, 81 cards (4 features × 3 values)
    /// - 2 computer players, no human players
    /// - 60s countdown turns, warning under 5s
    /// - 1s point freeze, 3s penalty freeze, no table delay, no hints
    /// - inbox of 3 presses, 100ms dealer tick, 100ms freeze refresh cap
    /// - 5s grace, bus capacity 1024
    fn default() -> Self {
        Self {
            table_size: 12,
            deck_size: 81,
            feature_size: 3,
            feature_count: 4,
            human_players: 0,
            computer_players: 2,
            turn_timeout_ms: 60_000,
            turn_timeout_warning: Duration::from_secs(5),
            point_freeze: Duration::from_secs(1),
            penalty_freeze: Duration::from_secs(3),
            table_delay: Duration::ZERO,
            hints: false,
            inbox_capacity: 3,
            poll_interval: Duration::from_millis(100),
            freeze_refresh: Duration::from_millis(100),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_mode_follows_sign() {
        let mut cfg = Config::default();
        assert_eq!(cfg.turn_mode(), TurnMode::Countdown(Duration::from_secs(60)));
        cfg.turn_timeout_ms = 0;
        assert_eq!(cfg.turn_mode(), TurnMode::Elapsed);
        cfg.turn_timeout_ms = -1;
        assert_eq!(cfg.turn_mode(), TurnMode::Untimed);
        assert!(!cfg.turn_mode().polls());
    }

    #[test]
    fn freeze_refresh_uses_shortest_window() {
        let mut cfg = Config::default();
        assert_eq!(cfg.freeze_refresh_interval(), Duration::from_millis(100));
        cfg.point_freeze = Duration::from_millis(40);
        assert_eq!(cfg.freeze_refresh_interval(), Duration::from_millis(40));
        cfg.point_freeze = Duration::ZERO;
        assert_eq!(cfg.freeze_refresh_interval(), Duration::from_millis(1));
    }

    #[test]
    fn validate_rejects_degenerate_tables() {
        let mut cfg = Config::default();
        assert_eq!(cfg.validate(81), Ok(()));
        assert_eq!(
            cfg.validate(2),
            Err(ConfigError::DeckTooSmall { deck: 2, needed: 3 })
        );
        cfg.inbox_capacity = 0;
        assert_eq!(cfg.validate(81), Err(ConfigError::ZeroInboxCapacity));
        cfg.table_size = 0;
        assert_eq!(cfg.validate(81), Err(ConfigError::ZeroTableSize));
    }
}
