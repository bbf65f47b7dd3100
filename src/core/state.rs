//! # Session phase shared by every worker.
//!
//! ```text
//!   Reshuffling ──► Running ──► Reshuffling ──► ... ──► Finished ──► Terminated
//!        ▲                           │
//!        └───────────────────────────┘
//! ```
//!
//! Read without touching the board lock: players consult it before each toggle,
//! the dealer writes it around every deal and collection. `Terminated` is final.

use std::sync::atomic::{AtomicU8, Ordering};

/// Observable phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Players may toggle markers.
    Running = 0,
    /// Dealer is clearing or dealing; toggles are dropped.
    Reshuffling = 1,
    /// Winners announced, workers being torn down.
    Finished = 2,
    /// Every worker has exited.
    Terminated = 3,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Phase::Running,
            1 => Phase::Reshuffling,
            2 => Phase::Finished,
            _ => Phase::Terminated,
        }
    }
}

/// Atomic holder of the current [`Phase`].
#[derive(Debug)]
pub struct SessionState {
    phase: AtomicU8,
}

impl SessionState {
    /// Sessions start out reshuffling: nothing is dealt yet.
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Reshuffling as u8),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_reshuffling(&self) -> bool {
        self.phase() == Phase::Reshuffling
    }

    /// Moves to `next`. Returns `false` (and changes nothing) once terminated.
    pub fn set(&self, next: Phase) -> bool {
        self.phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur != Phase::Terminated as u8).then_some(next as u8)
            })
            .is_ok()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
