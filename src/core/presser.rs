//! # Random key presser for computer players.
//!
//! Emits uniformly random slot indices into a player's inbox. When the inbox is
//! full it waits for room, so it never outruns the player by more than the
//! inbox capacity.

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::board::Slot;

pub(crate) struct Presser {
    tx: mpsc::Sender<Slot>,
    table_size: usize,
}

impl Presser {
    pub(crate) fn new(tx: mpsc::Sender<Slot>, table_size: usize) -> Self {
        Self { tx, table_size }
    }

    /// Runs until `token` is cancelled or the player's inbox is closed.
    pub(crate) async fn run(self, token: CancellationToken) {
        if self.table_size == 0 {
            return;
        }
        loop {
            let slot = Slot(rand::rng().random_range(0..self.table_size));
            tokio::select! {
                sent = self.tx.send(slot) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = token.cancelled() => break,
            }
        }
    }
}
