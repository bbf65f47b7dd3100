//! # Events emitted by the board, the dealer and the players.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Render events**: what a display needs to mirror the table (cards, markers,
//!   countdown, scores, freezes, winners)
//! - **Protocol events**: selection handoff, evaluation verdicts, reshuffles, hints
//! - **Lifecycle events**: worker start/stop, shutdown and grace outcome
//!
//! The [`Event`] struct carries optional metadata set through `with_*` builders.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Board events are published under the board lock, so their `seq` order is the
//! mutation order.
//!
//! ## Example
//! ```rust
//! use setvisor::{CardId, Event, EventKind, Slot};
//!
//! let ev = Event::new(EventKind::CardPlaced)
//!     .with_card(CardId(7))
//!     .with_slot(Slot(3));
//!
//! assert_eq!(ev.kind, EventKind::CardPlaced);
//! assert_eq!(ev.slot, Some(Slot(3)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::board::{CardId, ParticipantId, Slot};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Render events ===
    /// A card was put on the table.
    ///
    /// Sets: `card`, `slot`
    CardPlaced,

    /// A card was taken off the table.
    ///
    /// Sets: `slot`
    CardRemoved,

    /// A player placed a marker.
    ///
    /// Sets: `participant`, `slot`
    MarkerPlaced,

    /// A marker disappeared (taken back, or cleared with its card).
    ///
    /// Sets: `participant`, `slot`
    MarkerRemoved,

    /// Turn countdown refresh.
    ///
    /// Sets: `millis` (remaining, clamped at 0), `warning`
    Countdown,

    /// Time since the last deal (open-ended turn mode).
    ///
    /// Sets: `millis`
    Elapsed,

    /// Player score changed.
    ///
    /// Sets: `participant`, `value`
    Score,

    /// Player freeze display refresh (`millis = 0` means unfrozen).
    ///
    /// Sets: `participant`, `millis`
    Freeze,

    /// Game over.
    ///
    /// Sets: `winners`, `value` (winning score)
    Winners,

    // === Protocol events ===
    /// A player deposited a complete selection into the mailbox.
    ///
    /// Sets: `participant`
    SelectionSubmitted,

    /// Selection was a legal combination; cards removed, point granted.
    ///
    /// Sets: `participant`, `slots`
    SelectionAccepted,

    /// Selection was not a legal combination; penalty freeze granted.
    ///
    /// Sets: `participant`
    SelectionPenalized,

    /// Selection no longer had the full number of cards by evaluation time.
    ///
    /// Sets: `participant`, `value` (cards found)
    SelectionDiscarded,

    /// Dealer finished a deal.
    ///
    /// Sets: `value` (cards left in the deck)
    Reshuffled,

    /// A legal combination currently on the table (hints enabled).
    ///
    /// Sets: `slots`, `reason` (feature listing)
    Hint,

    /// A key press was dropped because the player's inbox was full or closed.
    ///
    /// Sets: `participant`, `slot`, `reason`
    InputDropped,

    /// Board state disagreed with an operation's precondition.
    ///
    /// Sets: `reason`, optionally `card`/`slot`
    ConsistencyWarning,

    // === Lifecycle events ===
    /// Player worker started.
    ///
    /// Sets: `participant`
    ParticipantStarting,

    /// Player worker exited.
    ///
    /// Sets: `participant`, `value` (selections submitted)
    ParticipantStopped,

    /// Termination requested (external request or OS signal).
    ShutdownRequested,

    /// All workers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic message)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`
    SubscriberOverflow,
}

/// Session event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    pub participant: Option<ParticipantId>,
    pub slot: Option<Slot>,
    pub card: Option<CardId>,
    /// Duration payload in milliseconds (countdown, elapsed, freeze).
    pub millis: Option<u64>,
    /// Countdown warning flag.
    pub warning: Option<bool>,
    /// Integer payload (score, counts).
    pub value: Option<u32>,
    pub winners: Option<Arc<[ParticipantId]>>,
    pub slots: Option<Arc<[Slot]>>,
    /// Human-readable reason or detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            participant: None,
            slot: None,
            card: None,
            millis: None,
            warning: None,
            value: None,
            winners: None,
            slots: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_participant(mut self, p: ParticipantId) -> Self {
        self.participant = Some(p);
        self
    }

    #[inline]
    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    #[inline]
    pub fn with_card(mut self, card: CardId) -> Self {
        self.card = Some(card);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_millis(mut self, d: Duration) -> Self {
        self.millis = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    #[inline]
    pub fn with_warning(mut self, warning: bool) -> Self {
        self.warning = Some(warning);
        self
    }

    #[inline]
    pub fn with_value(mut self, value: u32) -> Self {
        self.value = Some(value);
        self
    }

    #[inline]
    pub fn with_winners(mut self, winners: impl Into<Arc<[ParticipantId]>>) -> Self {
        self.winners = Some(winners.into());
        self
    }

    #[inline]
    pub fn with_slots(mut self, slots: impl Into<Arc<[Slot]>>) -> Self {
        self.slots = Some(slots.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for the events a display needs to mirror the table.
    #[inline]
    pub fn is_render(&self) -> bool {
        matches!(
            self.kind,
            EventKind::CardPlaced
                | EventKind::CardRemoved
                | EventKind::MarkerPlaced
                | EventKind::MarkerRemoved
                | EventKind::Countdown
                | EventKind::Elapsed
                | EventKind::Score
                | EventKind::Freeze
                | EventKind::Winners
        )
    }
}
