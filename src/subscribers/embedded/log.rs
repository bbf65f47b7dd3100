//! # LogWriter: console sink
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for demos and debugging.
//!
//! ## Example output
//! ```text
//! [card-placed] card=Some(CardId(17)) slot=Some(Slot(4))
//! [marker-placed] player=Some(ParticipantId(1)) slot=Some(Slot(4))
//! [submitted] player=Some(ParticipantId(1))
//! [accepted] player=Some(ParticipantId(1)) slots=[4, 7, 9]
//! [score] player=Some(ParticipantId(1)) score=Some(1)
//! [winners] ids=[1] score=Some(5)
//! ```
//!
//! Countdown/elapsed/freeze refreshes are skipped: they arrive every poll
//! interval and would drown everything else.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn slots(e: &Event) -> Vec<usize> {
    e.slots
        .as_deref()
        .map(|s| s.iter().map(|s| s.0).collect())
        .unwrap_or_default()
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Countdown | EventKind::Elapsed | EventKind::Freeze => {}
            EventKind::CardPlaced => {
                println!("[card-placed] card={:?} slot={:?}", e.card, e.slot);
            }
            EventKind::CardRemoved => {
                println!("[card-removed] slot={:?}", e.slot);
            }
            EventKind::MarkerPlaced => {
                println!("[marker-placed] player={:?} slot={:?}", e.participant, e.slot);
            }
            EventKind::MarkerRemoved => {
                println!("[marker-removed] player={:?} slot={:?}", e.participant, e.slot);
            }
            EventKind::Score => {
                println!("[score] player={:?} score={:?}", e.participant, e.value);
            }
            EventKind::Winners => {
                let ids: Vec<usize> = e
                    .winners
                    .as_deref()
                    .map(|w| w.iter().map(|p| p.0).collect())
                    .unwrap_or_default();
                println!("[winners] ids={ids:?} score={:?}", e.value);
            }
            EventKind::SelectionSubmitted => {
                println!("[submitted] player={:?}", e.participant);
            }
            EventKind::SelectionAccepted => {
                println!("[accepted] player={:?} slots={:?}", e.participant, slots(e));
            }
            EventKind::SelectionPenalized => {
                println!("[penalized] player={:?}", e.participant);
            }
            EventKind::SelectionDiscarded => {
                println!(
                    "[discarded] player={:?} cards={:?}",
                    e.participant, e.value
                );
            }
            EventKind::Reshuffled => {
                println!("[reshuffled] deck_left={:?}", e.value);
            }
            EventKind::Hint => {
                println!(
                    "[hint] slots={:?} features={}",
                    slots(e),
                    e.reason.as_deref().unwrap_or("")
                );
            }
            EventKind::InputDropped => {
                println!(
                    "[input-dropped] player={:?} slot={:?} reason={:?}",
                    e.participant, e.slot, e.reason
                );
            }
            EventKind::ConsistencyWarning => {
                println!(
                    "[consistency-warning] card={:?} slot={:?} reason={:?}",
                    e.card, e.slot, e.reason
                );
            }
            EventKind::ParticipantStarting => {
                println!("[player-starting] player={:?}", e.participant);
            }
            EventKind::ParticipantStopped => {
                println!(
                    "[player-stopped] player={:?} submitted={:?}",
                    e.participant, e.value
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] {}", e.reason.as_deref().unwrap_or(""));
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] {}", e.reason.as_deref().unwrap_or(""));
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
