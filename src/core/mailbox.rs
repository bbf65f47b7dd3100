//! # Evaluation mailbox: capacity-1 rendezvous between players and the dealer.
//!
//! A player with a complete selection deposits its id and suspends until the
//! dealer releases it with a [`Verdict`]. At most one selection is ever
//! outstanding, counting the one the dealer is evaluating right now.
//!
//! ## Architecture
//! ```text
//! Player A ─┐                    ┌──────────────┐
//! Player B ─┼─► gate (1 permit) ─► mpsc (cap 1) ─► Dealer: recv → evaluate → release
//! Player C ─┘     ▲                                             │          │
//!                 └──────────── permit dropped ◄────────────────┘          │
//!                        Player A ◄──── oneshot(Verdict) ◄─────────────────┘
//! ```
//!
//! ## Rules
//! - The permit travels with the [`Submission`] and is freed by
//!   [`Submission::release`] *after* the verdict is sent: the next player can
//!   only deposit once the previous one has been answered.
//! - A player never deposits twice: it is suspended inside [`Outbox::submit`]
//!   until released, cancelled, or the dealer is gone.
//! - Every wait observes the player's cancellation token.
//! - Dropping the [`Inbox`] closes the gate; waiting players get [`Submit::Closed`].

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::board::ParticipantId;

/// Dealer's answer to a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Legal combination: point awarded, cards removed.
    Point,
    /// Illegal combination: penalty freeze.
    Penalty,
    /// Selection was no longer complete when evaluated; nothing changed.
    Discarded,
}

/// Outcome of [`Outbox::submit`] from the player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submit {
    Released(Verdict),
    Cancelled,
    /// The dealer dropped its end of the mailbox.
    Closed,
}

/// A pending selection, held by the dealer while it evaluates.
#[derive(Debug)]
pub struct Submission {
    participant: ParticipantId,
    release: oneshot::Sender<Verdict>,
    permit: OwnedSemaphorePermit,
}

impl Submission {
    #[inline]
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Wakes the waiting player with `verdict`, then frees the mailbox.
    ///
    /// Call only after every state change the verdict implies has been committed.
    pub fn release(self, verdict: Verdict) {
        let Submission {
            release, permit, ..
        } = self;
        let _ = release.send(verdict);
        drop(permit);
    }
}

/// Creates a connected mailbox pair.
pub fn mailbox() -> (Outbox, Inbox) {
    let gate = Arc::new(Semaphore::new(1));
    let (tx, rx) = mpsc::channel(1);
    (
        Outbox {
            gate: Arc::clone(&gate),
            tx,
        },
        Inbox { gate, rx },
    )
}

/// Player side of the mailbox (cloneable).
#[derive(Clone, Debug)]
pub struct Outbox {
    gate: Arc<Semaphore>,
    tx: mpsc::Sender<Submission>,
}

impl Outbox {
    /// Deposits `participant`'s selection and waits for the dealer's verdict.
    pub async fn submit(&self, participant: ParticipantId, token: &CancellationToken) -> Submit {
        let permit = tokio::select! {
            res = Arc::clone(&self.gate).acquire_owned() => match res {
                Ok(permit) => permit,
                Err(_closed) => return Submit::Closed,
            },
            _ = token.cancelled() => return Submit::Cancelled,
        };

        let (release, verdict) = oneshot::channel();
        // Holding the only permit means the previous submission has been
        // received and released, so the channel slot is free.
        let sub = Submission {
            participant,
            release,
            permit,
        };
        if self.tx.try_send(sub).is_err() {
            return Submit::Closed;
        }

        tokio::select! {
            res = verdict => match res {
                Ok(v) => Submit::Released(v),
                Err(_dropped) => Submit::Closed,
            },
            _ = token.cancelled() => Submit::Cancelled,
        }
    }

    /// Number of selections deposited and not yet released (0 or 1).
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        pending(&self.gate)
    }
}

/// Dealer side of the mailbox.
#[derive(Debug)]
pub struct Inbox {
    gate: Arc<Semaphore>,
    rx: mpsc::Receiver<Submission>,
}

impl Inbox {
    /// Waits for the next submission. Cancel-safe.
    pub async fn recv(&mut self) -> Option<Submission> {
        self.rx.recv().await
    }

    /// Takes a submission if one is already waiting.
    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<Submission> {
        self.rx.try_recv().ok()
    }

    /// Number of selections deposited and not yet released (0 or 1).
    pub fn pending(&self) -> usize {
        pending(&self.gate)
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.gate.close();
    }
}

fn pending(gate: &Semaphore) -> usize {
    if gate.is_closed() {
        return 0;
    }
    1 - gate.available_permits().min(1)
}
