//! # Per-player standing: score, freeze window, liveness.
//!
//! ## Rules
//! - `score` and `frozen_until` are written only by the dealer, and always before it
//!   releases the player's pending selection; the release channel orders the write
//!   before the player's next read.
//! - `score` never decreases.
//! - `alive` is written only by the player's own worker.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::board::ParticipantId;

/// Shared state of one player.
#[derive(Debug)]
pub struct Standing {
    id: ParticipantId,
    human: bool,
    score: AtomicU32,
    frozen_until: Mutex<Option<Instant>>,
    alive: AtomicBool,
}

impl Standing {
    pub fn new(id: ParticipantId, human: bool) -> Self {
        Self {
            id,
            human,
            score: AtomicU32::new(0),
            frozen_until: Mutex::new(None),
            alive: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    #[inline]
    pub fn is_human(&self) -> bool {
        self.human
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score.load(Ordering::Acquire)
    }

    /// Adds one point and freezes the player for `freeze`; returns the new score.
    pub(crate) fn award_point(&self, freeze: Duration) -> u32 {
        let score = self.score.fetch_add(1, Ordering::AcqRel) + 1;
        self.freeze(freeze);
        score
    }

    /// Freezes the player for `freeze` without touching the score.
    pub(crate) fn penalize(&self, freeze: Duration) {
        self.freeze(freeze);
    }

    fn freeze(&self, d: Duration) {
        let mut g = self.frozen_until.lock().unwrap_or_else(PoisonError::into_inner);
        *g = Some(Instant::now() + d);
    }

    /// Remaining freeze at `now`, if any.
    pub fn frozen_for(&self, now: Instant) -> Option<Duration> {
        let g = self.frozen_until.lock().unwrap_or_else(PoisonError::into_inner);
        g.and_then(|until| until.checked_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }
}
