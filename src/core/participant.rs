//! # Player worker.
//!
//! Turns key presses into marker toggles and hands complete selections to the dealer.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► frozen?  ──► publish Freeze(left) every refresh, sleep (cancellable)
//!   │                └─► unfrozen: publish Freeze(0), drop every queued press
//!   ├─► await next slot from the private inbox (cancellable)
//!   ├─► dealer reshuffling? ──► drop the press
//!   ├─► board.toggle_marker(id, slot)
//!   └─► Added and count == MAX_MARKERS?
//!         └─► outbox.submit(id) ──► suspended until the dealer releases us
//! }
//! ```
//!
//! ## Rules
//! - Presses queued during a freeze are stale and never replayed.
//! - A toggle attempted while the dealer clears or deals is dropped without feedback.
//! - The player's score and freeze window are committed by the dealer before the
//!   release arrives, so the next loop iteration already sees them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::board::{Board, MAX_MARKERS, ParticipantId, Slot, Toggle};
use crate::core::mailbox::{Outbox, Submit};
use crate::core::standing::Standing;
use crate::core::state::SessionState;
use crate::events::{Bus, Event, EventKind};

/// Handle for feeding key presses into one player's inbox.
///
/// Real input devices and the random presser go through the same bounded queue.
#[derive(Clone, Debug)]
pub struct ActionSender {
    id: ParticipantId,
    tx: mpsc::Sender<Slot>,
    bus: Bus,
}

impl ActionSender {
    pub(crate) fn new(id: ParticipantId, tx: mpsc::Sender<Slot>, bus: Bus) -> Self {
        Self { id, tx, bus }
    }

    #[inline]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Offers a press without waiting. A full (or closed) inbox drops it and
    /// publishes `InputDropped`; returns whether the press was queued.
    pub fn press(&self, slot: Slot) -> bool {
        let reason = match self.tx.try_send(slot) {
            Ok(()) => return true,
            Err(mpsc::error::TrySendError::Full(_)) => "inbox_full",
            Err(mpsc::error::TrySendError::Closed(_)) => "inbox_closed",
        };
        self.bus.publish(
            Event::new(EventKind::InputDropped)
                .with_participant(self.id)
                .with_slot(slot)
                .with_reason(reason),
        );
        false
    }
}

/// One player's worker, spawned by the dealer.
pub(crate) struct Participant {
    standing: Arc<Standing>,
    board: Arc<Board>,
    state: Arc<SessionState>,
    outbox: Outbox,
    inbox: mpsc::Receiver<Slot>,
    bus: Bus,
    freeze_refresh: Duration,
}

impl Participant {
    pub(crate) fn new(
        standing: Arc<Standing>,
        board: Arc<Board>,
        state: Arc<SessionState>,
        outbox: Outbox,
        inbox: mpsc::Receiver<Slot>,
        bus: Bus,
        freeze_refresh: Duration,
    ) -> Self {
        Self {
            standing,
            board,
            state,
            outbox,
            inbox,
            bus,
            freeze_refresh,
        }
    }

    pub(crate) fn id(&self) -> ParticipantId {
        self.standing.id()
    }

    /// Runs until `token` is cancelled.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        let id = self.id();
        self.standing.set_alive(true);
        self.bus
            .publish(Event::new(EventKind::ParticipantStarting).with_participant(id));

        let mut submitted: u32 = 0;
        loop {
            if token.is_cancelled() {
                break;
            }
            if self.standing.frozen_for(Instant::now()).is_some()
                && !self.wait_out_freeze(&token).await
            {
                break;
            }

            let slot = tokio::select! {
                next = self.inbox.recv() => match next {
                    Some(slot) => slot,
                    // Every sender is gone; nothing more will arrive.
                    None => {
                        token.cancelled().await;
                        break;
                    }
                },
                _ = token.cancelled() => break,
            };

            if self.state.is_reshuffling() {
                continue;
            }
            if self.board.toggle_marker(id, slot) != Toggle::Added
                || self.board.marker_count(id) != MAX_MARKERS
            {
                continue;
            }

            submitted += 1;
            self.bus
                .publish(Event::new(EventKind::SelectionSubmitted).with_participant(id));
            match self.outbox.submit(id, &token).await {
                Submit::Released(_) => {}
                Submit::Cancelled => break,
                Submit::Closed => {
                    token.cancelled().await;
                    break;
                }
            }
        }

        self.standing.set_alive(false);
        self.bus.publish(
            Event::new(EventKind::ParticipantStopped)
                .with_participant(id)
                .with_value(submitted),
        );
    }

    /// Publishes the remaining freeze until it is over, then discards queued presses.
    ///
    /// Returns `false` if cancelled while frozen.
    async fn wait_out_freeze(&mut self, token: &CancellationToken) -> bool {
        let id = self.id();
        while let Some(left) = self.standing.frozen_for(Instant::now()) {
            // Rounded up to whole seconds when shown; never displays "0" while frozen.
            self.bus.publish(
                Event::new(EventKind::Freeze)
                    .with_participant(id)
                    .with_millis(left + Duration::from_millis(999)),
            );
            tokio::select! {
                _ = time::sleep(left.min(self.freeze_refresh)) => {}
                _ = token.cancelled() => return false,
            }
        }
        self.bus.publish(
            Event::new(EventKind::Freeze)
                .with_participant(id)
                .with_millis(Duration::ZERO),
        );
        while self.inbox.try_recv().is_ok() {}
        true
    }
}
