//! # Dealer: the single supervisor of a session.
//!
//! Owns the deck, spawns every player, deals, evaluates submitted selections one
//! at a time, reshuffles, announces the winners and tears the players down.
//!
//! ## States
//! ```text
//!           ┌──────────── finish check ◄────────────┐
//!           │ deck still holds a combination         │
//!           ▼                                        │
//!       Dealing ──► RunningTurn ──► Collecting ──────┘
//!                   │  ▲                 (board → deck)
//!                   │  └── evaluate one submission, refill
//!                   └─ deadline / dead board / termination
//!
//!   finish check fails ──► Finished ──► teardown (reverse spawn order) ──► Terminated
//! ```
//!
//! ## Rules
//! - Exactly one submission is evaluated at a time; all effects of a verdict are
//!   committed before the player is released.
//! - Each presser is stopped and joined before its player; players are stopped
//!   and joined in reverse id order.
//! - A termination request ends the current turn after the evaluation in progress.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::board::{Board, CardId, MAX_MARKERS, ParticipantId, Slot};
use crate::core::config::{Config, TurnMode};
use crate::core::mailbox::{Inbox, Submission, Verdict};
use crate::core::participant::Participant;
use crate::core::presser::Presser;
use crate::core::standing::Standing;
use crate::core::state::{Phase, SessionState};
use crate::error::SessionError;
use crate::events::{Bus, Event, EventKind};
use crate::rules::{CombinationOracle, Triple};

/// Final result of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Players sharing the highest score (empty without players).
    pub winners: Vec<ParticipantId>,
    /// Final score of every player, indexed by id.
    pub scores: Vec<u32>,
}

impl Outcome {
    /// Score of the winners (0 without players).
    pub fn top_score(&self) -> u32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }
}

/// A player not yet spawned, with its presser for computer players.
pub(crate) struct Seat {
    pub(crate) participant: Participant,
    pub(crate) presser: Option<Presser>,
}

/// Everything the dealer is built from.
pub(crate) struct DealerParams {
    pub(crate) cfg: Config,
    pub(crate) board: Arc<Board>,
    pub(crate) state: Arc<SessionState>,
    pub(crate) oracle: Arc<dyn CombinationOracle>,
    pub(crate) bus: Bus,
    pub(crate) deck: Vec<CardId>,
    pub(crate) inbox: Inbox,
    pub(crate) standings: Vec<Arc<Standing>>,
    pub(crate) seats: Vec<Seat>,
    /// Parent of every worker token; cancelled only to abandon a stuck teardown.
    pub(crate) hard_stop: CancellationToken,
}

/// A spawned worker and the token that stops it.
struct Worker {
    name: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Cancels and joins; returns the worker name if it panicked.
    async fn stop(self) -> Option<String> {
        self.token.cancel();
        match self.handle.await {
            Err(e) if e.is_panic() => Some(self.name),
            _ => None,
        }
    }
}

struct Crew {
    participant: Worker,
    presser: Option<Worker>,
}

/// What woke the dealer during a turn.
enum Wake {
    Submission(Submission),
    Tick,
    Terminated,
    /// Every player dropped its outbox.
    Deserted,
}

pub(crate) struct Dealer {
    cfg: Config,
    mode: TurnMode,
    board: Arc<Board>,
    state: Arc<SessionState>,
    oracle: Arc<dyn CombinationOracle>,
    bus: Bus,
    deck: Vec<CardId>,
    inbox: Inbox,
    standings: Vec<Arc<Standing>>,
    seats: Vec<Seat>,
    hard_stop: CancellationToken,
    /// Time of the last deal; the countdown deadline is derived from it.
    dealt_at: Instant,
    deserted: bool,
}

impl Dealer {
    pub(crate) fn new(p: DealerParams) -> Self {
        Self {
            mode: p.cfg.turn_mode(),
            cfg: p.cfg,
            board: p.board,
            state: p.state,
            oracle: p.oracle,
            bus: p.bus,
            deck: p.deck,
            inbox: p.inbox,
            standings: p.standings,
            seats: p.seats,
            hard_stop: p.hard_stop,
            dealt_at: Instant::now(),
            deserted: false,
        }
    }

    /// Plays the session to the end. Returns once every player has been joined.
    pub(crate) async fn run(mut self, token: CancellationToken) -> Result<Outcome, SessionError> {
        self.state.set(Phase::Reshuffling);
        let crew = self.spawn_crew();

        while !self.should_finish(&token) {
            self.deal(&token).await;
            self.running_turn(&token).await;
            self.collect(&token).await;
        }

        self.state.set(Phase::Finished);
        let outcome = self.announce_winners();
        let panicked = Self::tear_down(crew).await;
        self.state.set(Phase::Terminated);

        match panicked {
            Some(worker) => Err(SessionError::WorkerPanicked { worker }),
            None => Ok(outcome),
        }
    }

    /// Spawns players (and their pressers) in id order, each with its own token.
    fn spawn_crew(&mut self) -> Vec<Crew> {
        let root = self.hard_stop.clone();
        self.seats
            .drain(..)
            .map(|seat| {
                let id = seat.participant.id();
                let presser = seat.presser.map(|presser| {
                    let token = root.child_token();
                    Worker {
                        name: format!("presser-{id}"),
                        handle: tokio::spawn(presser.run(token.clone())),
                        token,
                    }
                });
                let token = root.child_token();
                let participant = Worker {
                    name: format!("player-{id}"),
                    handle: tokio::spawn(seat.participant.run(token.clone())),
                    token,
                };
                Crew {
                    participant,
                    presser,
                }
            })
            .collect()
    }

    async fn tear_down(crew: Vec<Crew>) -> Option<String> {
        let mut panicked = None;
        for member in crew.into_iter().rev() {
            if let Some(presser) = member.presser {
                panicked = panicked.or(presser.stop().await);
            }
            panicked = panicked.or(member.participant.stop().await);
        }
        panicked
    }

    fn should_finish(&self, token: &CancellationToken) -> bool {
        token.is_cancelled()
            || self.deserted
            || self.standings.is_empty()
            || !self.oracle.has_combination(&self.deck)
    }

    async fn deal(&mut self, token: &CancellationToken) {
        self.place_cards(token).await;
        self.reset_timer();
        self.update_timer_display();
        if self.cfg.hints {
            self.publish_hints();
        }
        self.bus
            .publish(Event::new(EventKind::Reshuffled).with_value(saturate(self.deck.len())));
        self.state.set(Phase::Running);
    }

    /// Fills empty slots from the shuffled deck; returns the number of cards placed.
    async fn place_cards(&mut self, token: &CancellationToken) -> usize {
        let empty = self.board.count_empty();
        if empty == 0 || self.deck.is_empty() {
            return 0;
        }
        self.deck.shuffle(&mut rand::rng());

        let mut placed = 0;
        for _ in 0..empty {
            let Some(card) = self.deck.pop() else { break };
            self.pause(token).await;
            if self.board.place_card_random(card).is_some() {
                placed += 1;
                continue;
            }
            self.deck.push(card);
            self.bus.publish(
                Event::new(EventKind::ConsistencyWarning)
                    .with_card(card)
                    .with_reason("placement_failed"),
            );
            break;
        }
        placed
    }

    async fn running_turn(&mut self, token: &CancellationToken) {
        let mut cards_removed = true;
        loop {
            if token.is_cancelled() || self.deadline_passed() {
                return;
            }
            if cards_removed && self.board_is_dead() {
                return;
            }

            let wake = self.wait(token).await;
            self.update_timer_display();
            cards_removed = match wake {
                Wake::Submission(sub) => self.evaluate(sub, token).await,
                Wake::Tick => false,
                Wake::Terminated => return,
                Wake::Deserted => {
                    self.deserted = true;
                    return;
                }
            };

            if self.place_cards(token).await > 0 {
                self.reset_timer();
                self.update_timer_display();
                if self.cfg.hints {
                    self.publish_hints();
                }
            }
        }
    }

    /// Waits for a submission, a display tick or termination.
    async fn wait(&mut self, token: &CancellationToken) -> Wake {
        // `time_left` is unbounded outside countdown turns.
        let tick = self
            .mode
            .polls()
            .then(|| self.cfg.poll_interval.min(self.time_left()));
        let sleep = async move {
            match tick {
                Some(d) => time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            next = self.inbox.recv() => match next {
                Some(sub) => Wake::Submission(sub),
                None => Wake::Deserted,
            },
            _ = sleep => Wake::Tick,
            _ = token.cancelled() => Wake::Terminated,
        }
    }

    /// Judges one selection and releases its player. Returns whether cards were removed.
    async fn evaluate(&mut self, sub: Submission, token: &CancellationToken) -> bool {
        debug_assert_eq!(self.inbox.pending(), 1);
        let id = sub.participant();
        let cards = self.board.collect_marked_cards(id);
        let (Ok(triple), Some(standing)) = (
            Triple::try_from(cards.as_slice()),
            self.standings.get(id.0).cloned(),
        ) else {
            self.bus.publish(
                Event::new(EventKind::SelectionDiscarded)
                    .with_participant(id)
                    .with_value(saturate(cards.len())),
            );
            sub.release(Verdict::Discarded);
            return false;
        };

        if !self.oracle.is_legal(&triple) {
            standing.penalize(self.cfg.penalty_freeze);
            self.bus
                .publish(Event::new(EventKind::SelectionPenalized).with_participant(id));
            sub.release(Verdict::Penalty);
            return false;
        }

        let mut slots = Vec::with_capacity(MAX_MARKERS);
        for card in triple {
            self.pause(token).await;
            if let Some(slot) = self.board.remove_card_by_id(card) {
                slots.push(slot);
            }
        }
        let score = standing.award_point(self.cfg.point_freeze);
        self.bus.publish(
            Event::new(EventKind::Score)
                .with_participant(id)
                .with_value(score),
        );
        self.bus.publish(
            Event::new(EventKind::SelectionAccepted)
                .with_participant(id)
                .with_slots(slots),
        );
        sub.release(Verdict::Point);
        true
    }

    /// Sends every card on the table back to the deck.
    async fn collect(&mut self, token: &CancellationToken) {
        self.state.set(Phase::Reshuffling);
        self.update_timer_display();

        if self.cfg.table_delay.is_zero() {
            let cards = self.board.clear();
            self.deck.extend(cards);
            return;
        }
        let mut order: Vec<Slot> = (0..self.board.table_size()).map(Slot).collect();
        order.shuffle(&mut rand::rng());
        for slot in order {
            if self.board.card_at(slot).is_none() {
                continue;
            }
            self.pause(token).await;
            if let Some(card) = self.board.remove_card(slot) {
                self.deck.push(card);
            }
        }
    }

    fn announce_winners(&self) -> Outcome {
        let scores: Vec<u32> = self.standings.iter().map(|s| s.score()).collect();
        let top = scores.iter().copied().max().unwrap_or(0);
        let winners: Vec<ParticipantId> = self
            .standings
            .iter()
            .filter(|s| s.score() == top)
            .map(|s| s.id())
            .collect();

        self.bus.publish(
            Event::new(EventKind::Winners)
                .with_winners(winners.clone())
                .with_value(top),
        );
        Outcome { winners, scores }
    }

    /// No legal combination left to find in this turn.
    fn board_is_dead(&self) -> bool {
        let mut cards = self.board.cards();
        if matches!(self.mode, TurnMode::Countdown(_)) {
            cards.extend_from_slice(&self.deck);
        }
        !self.oracle.has_combination(&cards)
    }

    fn publish_hints(&self) {
        for triple in self.oracle.find_combinations(&self.board.cards(), usize::MAX) {
            let mut slots: Vec<Slot> = triple
                .iter()
                .filter_map(|card| self.board.slot_of(*card))
                .collect();
            slots.sort();
            let features: Vec<Vec<u32>> = triple.iter().map(|c| self.oracle.describe(*c)).collect();
            self.bus.publish(
                Event::new(EventKind::Hint)
                    .with_slots(slots)
                    .with_reason(format!("{features:?}")),
            );
        }
    }

    fn reset_timer(&mut self) {
        self.dealt_at = Instant::now();
    }

    fn time_left(&self) -> Duration {
        match self.mode {
            TurnMode::Countdown(len) => self
                .dealt_at
                .checked_add(len)
                .map_or(Duration::MAX, |deadline| {
                    deadline.saturating_duration_since(Instant::now())
                }),
            _ => Duration::MAX,
        }
    }

    fn deadline_passed(&self) -> bool {
        matches!(self.mode, TurnMode::Countdown(_)) && self.time_left().is_zero()
    }

    fn update_timer_display(&self) {
        match self.mode {
            TurnMode::Countdown(_) => {
                let left = self.time_left();
                self.bus.publish(
                    Event::new(EventKind::Countdown)
                        .with_millis(left)
                        .with_warning(left < self.cfg.turn_timeout_warning),
                );
            }
            TurnMode::Elapsed => {
                self.bus
                    .publish(Event::new(EventKind::Elapsed).with_millis(self.dealt_at.elapsed()));
            }
            TurnMode::Untimed => {}
        }
    }

    /// Sleeps for `table_delay`; cut short by termination.
    async fn pause(&self, token: &CancellationToken) {
        if self.cfg.table_delay.is_zero() || token.is_cancelled() {
            return;
        }
        tokio::select! {
            _ = time::sleep(self.cfg.table_delay) => {}
            _ = token.cancelled() => {}
        }
    }
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
