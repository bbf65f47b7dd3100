//! Whole-session scenarios driven through the public surface, plus
//! player-level checks that need crate-internal constructors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, sleep, timeout, timeout_at};
use tokio_util::sync::CancellationToken;

use super::mailbox::mailbox;
use super::participant::Participant;
use super::*;
use crate::board::{Board, CardId, MAX_MARKERS, ParticipantId, Slot};
use crate::error::SessionError;
use crate::events::{Bus, Event, EventKind};
use crate::rules::{CombinationOracle, FeatureRules, Triple};

/// Oracle with exactly one legal combination.
struct OneTriple(Triple);

impl CombinationOracle for OneTriple {
    fn find_combinations(&self, cards: &[CardId], limit: usize) -> Vec<Triple> {
        if limit > 0 && self.0.iter().all(|c| cards.contains(c)) {
            vec![self.0]
        } else {
            Vec::new()
        }
    }

    fn is_legal(&self, cards: &Triple) -> bool {
        let mut sorted = *cards;
        sorted.sort();
        sorted == self.0
    }
}

/// Oracle whose evaluation blocks its thread.
struct Stalling(Duration);

impl CombinationOracle for Stalling {
    fn find_combinations(&self, cards: &[CardId], limit: usize) -> Vec<Triple> {
        match cards {
            [a, b, c, ..] if limit > 0 => vec![[*a, *b, *c]],
            _ => Vec::new(),
        }
    }

    fn is_legal(&self, _cards: &Triple) -> bool {
        std::thread::sleep(self.0);
        false
    }
}

fn twelve_cards() -> Vec<CardId> {
    (0..12).map(CardId).collect()
}

fn one_human() -> Config {
    Config {
        table_size: 12,
        human_players: 1,
        computer_players: 0,
        point_freeze: Duration::from_millis(50),
        penalty_freeze: Duration::from_millis(400),
        grace: Duration::from_secs(2),
        ..Config::default()
    }
}

async fn wait_for_phase(state: &SessionState, phase: Phase) {
    timeout(Duration::from_secs(5), async {
        while state.phase() != phase {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("phase reached");
}

async fn wait_for_event(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
    .expect("event arrived")
}

/// Every event published during `window`.
async fn events_for(rx: &mut broadcast::Receiver<Event>, window: Duration) -> Vec<Event> {
    let until = Instant::now() + window;
    let mut seen = Vec::new();
    loop {
        match timeout_at(until, rx.recv()).await {
            Ok(Ok(ev)) => seen.push(ev),
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return seen,
        }
    }
}

/// Every event up to and including the next one of `kind`.
async fn events_until(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Vec<Event> {
    timeout(Duration::from_secs(5), async {
        let mut seen = Vec::new();
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let done = ev.kind == kind;
                    seen.push(ev);
                    if done {
                        return seen;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
    .expect("event arrived")
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|ev| ev.kind == kind).count()
}

fn human_table(turn_timeout_ms: i64) -> Config {
    Config {
        turn_timeout_ms,
        poll_interval: Duration::from_millis(10),
        ..one_human()
    }
}

fn press_cards(board: &Board, sender: &ActionSender, cards: &[u32]) {
    for c in cards {
        let slot = board.slot_of(CardId(*c)).expect("card on table");
        assert!(sender.press(slot));
    }
}

fn assert_board_consistent(board: &Board) {
    for s in 0..board.table_size() {
        if let Some(c) = board.card_at(Slot(s)) {
            assert_eq!(board.slot_of(c), Some(Slot(s)));
        }
    }
    for p in 0..board.participants() {
        let p = ParticipantId(p);
        let column = (0..board.table_size())
            .filter(|s| board.has_marker(p, Slot(*s)))
            .count();
        assert_eq!(board.marker_count(p), column);
        assert!(column <= MAX_MARKERS);
    }
}

#[tokio::test]
async fn single_legal_triple_scores_and_ends_the_session() {
    let session = Session::builder(one_human())
        .with_deck(twelve_cards())
        .with_oracle(Arc::new(OneTriple([CardId(0), CardId(1), CardId(2)])))
        .build()
        .unwrap();
    let board = Arc::clone(session.board());
    let state = Arc::clone(session.state());
    let sender = session.action_sender(ParticipantId(0)).unwrap();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    wait_for_phase(&state, Phase::Running).await;
    assert_eq!(board.count_filled(), 12);

    press_cards(&board, &sender, &[2, 0, 1]);
    let accepted = wait_for_event(&mut rx, EventKind::SelectionAccepted).await;
    assert_eq!(accepted.participant, Some(ParticipantId(0)));
    assert_eq!(accepted.slots.as_deref().map(<[Slot]>::len), Some(3));

    // No combination is left anywhere, so the dealer collects without waiting
    // for the 60s countdown and the deck can no longer produce a combination.
    let outcome = timeout(Duration::from_secs(5), run)
        .await
        .expect("session ends early")
        .unwrap()
        .unwrap();
    assert_eq!(outcome.winners, vec![ParticipantId(0)]);
    assert_eq!(outcome.scores, vec![1]);
    assert_eq!(outcome.top_score(), 1);

    assert_eq!(state.phase(), Phase::Terminated);
    assert_eq!(board.count_filled(), 0);
    assert_eq!(board.marker_count(ParticipantId(0)), 0);
    assert_board_consistent(&board);
}

#[tokio::test]
async fn illegal_triple_freezes_without_touching_the_table() {
    let cfg = one_human();
    let penalty = cfg.penalty_freeze;
    let session = Session::builder(cfg)
        .with_deck(twelve_cards())
        .with_oracle(Arc::new(OneTriple([CardId(0), CardId(1), CardId(2)])))
        .build()
        .unwrap();
    let board = Arc::clone(session.board());
    let state = Arc::clone(session.state());
    let standing = Arc::clone(&session.standings()[0]);
    let sender = session.action_sender(ParticipantId(0)).unwrap();
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    wait_for_phase(&state, Phase::Running).await;

    press_cards(&board, &sender, &[3, 4, 5]);
    let penalized = wait_for_event(&mut rx, EventKind::SelectionPenalized).await;
    assert_eq!(penalized.participant, Some(ParticipantId(0)));

    let left = standing.frozen_for(Instant::now()).expect("frozen");
    assert!(left <= penalty);
    assert!(left > penalty / 2);
    assert_eq!(standing.score(), 0);
    for c in [3, 4, 5] {
        assert!(board.slot_of(CardId(c)).is_some());
    }
    assert_eq!(board.marker_count(ParticipantId(0)), MAX_MARKERS);

    terminator.terminate();
    let outcome = timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome.scores, vec![0]);
    assert_eq!(state.phase(), Phase::Terminated);
}

#[tokio::test]
async fn zero_players_finish_with_no_winners() {
    let cfg = Config {
        computer_players: 0,
        ..Config::default()
    };
    let session = Session::builder(cfg).build().unwrap();
    let state = Arc::clone(session.state());
    let mut rx = session.subscribe();

    let outcome = timeout(Duration::from_secs(5), session.run())
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.winners.is_empty());
    assert!(outcome.scores.is_empty());
    assert_eq!(state.phase(), Phase::Terminated);

    let winners = wait_for_event(&mut rx, EventKind::Winners).await;
    assert_eq!(winners.winners.as_deref(), Some(&[][..]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn termination_mid_freeze_joins_every_worker() {
    let cfg = Config {
        computer_players: 3,
        penalty_freeze: Duration::from_secs(30),
        point_freeze: Duration::from_secs(30),
        grace: Duration::from_secs(2),
        ..Config::default()
    };
    let session = Session::builder(cfg).build().unwrap();
    let standings: Vec<_> = session.standings().to_vec();
    let state = Arc::clone(session.state());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    // Random presses complete a selection quickly; whatever the verdict,
    // the player is then frozen for far longer than the test runs.
    wait_for_event(&mut rx, EventKind::SelectionSubmitted).await;
    sleep(Duration::from_millis(50)).await;

    let asked = Instant::now();
    terminator.terminate();
    assert!(terminator.is_terminated());
    let outcome = timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(asked.elapsed() < Duration::from_secs(2));
    assert_eq!(outcome.scores.len(), 3);
    assert!(standings.iter().all(|s| !s.is_alive()));
    assert_eq!(state.phase(), Phase::Terminated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn busy_session_keeps_the_board_consistent() {
    let cfg = Config {
        computer_players: 4,
        point_freeze: Duration::from_millis(5),
        penalty_freeze: Duration::from_millis(5),
        turn_timeout_ms: 150,
        ..Config::default()
    };
    let session = Session::builder(cfg).build().unwrap();
    let board = Arc::clone(session.board());
    let terminator = session.terminator();
    let run = tokio::spawn(session.run());

    let until = Instant::now() + Duration::from_millis(600);
    while Instant::now() < until {
        assert!(board.is_consistent());
        sleep(Duration::from_millis(3)).await;
    }

    terminator.terminate();
    let outcome = timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome.scores.len(), 4);
    assert!(board.is_consistent());
    assert_board_consistent(&board);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn stuck_dealer_exceeds_the_grace_period() {
    let cfg = Config {
        grace: Duration::from_millis(100),
        ..one_human()
    };
    let session = Session::builder(cfg)
        .with_deck(twelve_cards())
        .with_oracle(Arc::new(Stalling(Duration::from_millis(800))))
        .build()
        .unwrap();
    let board = Arc::clone(session.board());
    let state = Arc::clone(session.state());
    let sender = session.action_sender(ParticipantId(0)).unwrap();
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    wait_for_phase(&state, Phase::Running).await;
    press_cards(&board, &sender, &[0, 1, 2]);
    wait_for_event(&mut rx, EventKind::SelectionSubmitted).await;
    sleep(Duration::from_millis(50)).await;

    terminator.terminate();
    let err = timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    match err {
        SessionError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(100));
            assert_eq!(stuck, vec![ParticipantId(0)]);
        }
        other => panic!("unexpected error: {other}"),
    }
    wait_for_event(&mut rx, EventKind::GraceExceeded).await;
}

#[test]
fn builder_rejects_decks_the_features_cannot_encode() {
    let cfg = Config {
        deck_size: 82,
        ..Config::default()
    };
    let err = Session::builder(cfg).build().err().expect("rejected");
    assert_eq!(err, crate::ConfigError::FeatureMismatch { deck: 82, max: 81 });
}

// ---- turn timing ----

#[tokio::test]
async fn countdown_expiry_collects_and_redeals_the_whole_table() {
    let cfg = Config {
        turn_timeout_warning: Duration::from_millis(60),
        ..human_table(120)
    };
    let session = Session::builder(cfg)
        .with_deck((0..20).map(CardId).collect())
        .build()
        .unwrap();
    let board = Arc::clone(session.board());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    let events = events_for(&mut rx, Duration::from_millis(600)).await;

    let deals: Vec<_> = events
        .iter()
        .filter(|ev| ev.kind == EventKind::Reshuffled)
        .collect();
    assert!(deals.len() >= 2, "only {} deals", deals.len());
    // Each redeal starts from the full deck again: 20 cards, 12 on the table.
    assert!(deals.iter().all(|ev| ev.value == Some(8)));

    let countdown: Vec<_> = events
        .iter()
        .filter(|ev| ev.kind == EventKind::Countdown)
        .collect();
    for ev in &countdown {
        let millis = ev.millis.expect("countdown carries millis");
        assert_eq!(ev.warning, Some(millis < 60), "millis = {millis}");
    }
    assert!(countdown.iter().any(|ev| ev.warning == Some(true)));
    assert!(countdown.iter().any(|ev| ev.warning == Some(false)));
    assert_eq!(count(&events, EventKind::Elapsed), 0);

    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(board.is_consistent());
}

#[tokio::test]
async fn zero_timeout_shows_elapsed_time_and_never_collects() {
    let session = Session::builder(human_table(0))
        .with_deck(twelve_cards())
        .build()
        .unwrap();
    let state = Arc::clone(session.state());
    let board = Arc::clone(session.board());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    let events = events_for(&mut rx, Duration::from_millis(250)).await;

    let elapsed: Vec<u64> = events
        .iter()
        .filter(|ev| ev.kind == EventKind::Elapsed)
        .filter_map(|ev| ev.millis)
        .collect();
    assert!(elapsed.len() >= 2);
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(count(&events, EventKind::Countdown), 0);
    assert_eq!(count(&events, EventKind::Reshuffled), 1);
    assert_eq!(count(&events, EventKind::CardRemoved), 0);
    assert_eq!(state.phase(), Phase::Running);
    assert_eq!(board.count_filled(), 12);

    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn untimed_turns_publish_no_timing_display() {
    let session = Session::builder(human_table(-1))
        .with_deck(twelve_cards())
        .build()
        .unwrap();
    let state = Arc::clone(session.state());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    let events = events_for(&mut rx, Duration::from_millis(250)).await;

    assert_eq!(count(&events, EventKind::Countdown), 0);
    assert_eq!(count(&events, EventKind::Elapsed), 0);
    assert_eq!(count(&events, EventKind::Reshuffled), 1);
    assert_eq!(state.phase(), Phase::Running);

    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

// ---- teardown, hints, table delay, input ----

#[tokio::test]
async fn teardown_stops_players_in_reverse_spawn_order() {
    let cfg = Config {
        human_players: 3,
        ..human_table(-1)
    };
    let session = Session::builder(cfg).with_deck(twelve_cards()).build().unwrap();
    let state = Arc::clone(session.state());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    wait_for_phase(&state, Phase::Running).await;
    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let mut stopped = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::ParticipantStopped {
            stopped.push(ev.participant.expect("stopped player id"));
        }
    }
    assert_eq!(
        stopped,
        vec![ParticipantId(2), ParticipantId(1), ParticipantId(0)]
    );
}

#[tokio::test]
async fn hints_name_every_legal_triple_on_the_table() {
    let cfg = Config {
        hints: true,
        ..human_table(-1)
    };
    let session = Session::builder(cfg).with_deck(twelve_cards()).build().unwrap();
    let board = Arc::clone(session.board());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    let events = events_until(&mut rx, EventKind::Reshuffled).await;

    let rules = FeatureRules::default();
    let hints: Vec<_> = events
        .iter()
        .filter(|ev| ev.kind == EventKind::Hint)
        .collect();
    let expected = rules.find_combinations(&board.cards(), usize::MAX).len();
    assert!(expected > 0);
    assert_eq!(hints.len(), expected);

    for hint in hints {
        let slots = hint.slots.as_deref().expect("hint slots");
        let cards: Vec<CardId> = slots
            .iter()
            .map(|s| board.card_at(*s).expect("hinted slot holds a card"))
            .collect();
        let triple = Triple::try_from(cards.as_slice()).expect("three cards");
        assert!(rules.is_legal(&triple));

        let features: Vec<Vec<u32>> = cards.iter().map(|c| rules.describe(*c)).collect();
        assert_eq!(hint.reason.as_deref(), Some(format!("{features:?}").as_str()));
    }

    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn delayed_collect_returns_every_card_to_the_deck() {
    let cfg = Config {
        table_delay: Duration::from_millis(5),
        ..human_table(150)
    };
    let session = Session::builder(cfg)
        .with_deck((0..20).map(CardId).collect())
        .build()
        .unwrap();
    let board = Arc::clone(session.board());
    let terminator = session.terminator();
    let mut rx = session.subscribe();

    let run = tokio::spawn(session.run());
    let first = events_until(&mut rx, EventKind::Reshuffled).await;
    assert_eq!(first.last().and_then(|ev| ev.value), Some(8));

    let turn = events_until(&mut rx, EventKind::Reshuffled).await;
    let mut removed: Vec<Slot> = turn
        .iter()
        .filter(|ev| ev.kind == EventKind::CardRemoved)
        .filter_map(|ev| ev.slot)
        .collect();
    removed.sort();
    removed.dedup();
    assert_eq!(removed.len(), 12);
    assert_eq!(turn.last().and_then(|ev| ev.value), Some(8));
    assert_eq!(count(&turn, EventKind::CardPlaced), 12);

    terminator.terminate();
    timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(board.is_consistent());
}

#[tokio::test]
async fn presses_beyond_the_inbox_are_dropped_and_reported() {
    let cfg = Config {
        inbox_capacity: 1,
        ..one_human()
    };
    let session = Session::builder(cfg).with_deck(twelve_cards()).build().unwrap();
    let sender = session.action_sender(ParticipantId(0)).unwrap();
    let mut rx = session.subscribe();

    // Nothing drains the inbox before the session runs.
    assert!(sender.press(Slot(0)));
    assert!(!sender.press(Slot(1)));
    let ev = rx.try_recv().expect("drop reported");
    assert_eq!(ev.kind, EventKind::InputDropped);
    assert_eq!(ev.participant, Some(ParticipantId(0)));
    assert_eq!(ev.slot, Some(Slot(1)));
    assert_eq!(ev.reason.as_deref(), Some("inbox_full"));

    drop(session);
    assert!(!sender.press(Slot(2)));
    let ev = rx.try_recv().expect("drop reported");
    assert_eq!(ev.reason.as_deref(), Some("inbox_closed"));
}

// ---- player worker ----

struct Rig {
    board: Arc<Board>,
    state: Arc<SessionState>,
    standing: Arc<Standing>,
    tx: mpsc::Sender<Slot>,
    token: CancellationToken,
    worker: tokio::task::JoinHandle<()>,
    _inbox: super::mailbox::Inbox,
}

/// Spawns one player on a full six-slot table, optionally already frozen.
fn rig(phase: Phase, frozen: Option<Duration>) -> Rig {
    let bus = Bus::new(1024);
    let board = Arc::new(Board::new(6, 1, bus.clone()));
    for c in 0..6 {
        board.place_card(CardId(c), Slot(c as usize));
    }
    let state = Arc::new(SessionState::new());
    state.set(phase);
    let standing = Arc::new(Standing::new(ParticipantId(0), true));
    if let Some(d) = frozen {
        standing.penalize(d);
    }
    let (outbox, inbox) = mailbox();
    let (tx, rx) = mpsc::channel(8);
    let participant = Participant::new(
        Arc::clone(&standing),
        Arc::clone(&board),
        Arc::clone(&state),
        outbox,
        rx,
        bus,
        Duration::from_millis(10),
    );
    let token = CancellationToken::new();
    let worker = tokio::spawn(participant.run(token.clone()));
    Rig {
        board,
        state,
        standing,
        tx,
        token,
        worker,
        _inbox: inbox,
    }
}

#[tokio::test]
async fn presses_during_a_reshuffle_are_dropped() {
    let r = rig(Phase::Reshuffling, None);
    r.tx.send(Slot(1)).await.unwrap();
    sleep(Duration::from_millis(30)).await;
    assert_eq!(r.board.marker_count(ParticipantId(0)), 0);

    r.state.set(Phase::Running);
    r.tx.send(Slot(1)).await.unwrap();
    sleep(Duration::from_millis(30)).await;
    assert!(r.board.has_marker(ParticipantId(0), Slot(1)));

    r.token.cancel();
    r.worker.await.unwrap();
    assert!(!r.standing.is_alive());
}

#[tokio::test]
async fn presses_queued_while_frozen_are_discarded() {
    let r = rig(Phase::Running, Some(Duration::from_millis(150)));
    r.tx.send(Slot(0)).await.unwrap();
    r.tx.send(Slot(2)).await.unwrap();

    sleep(Duration::from_millis(250)).await;
    assert!(r.standing.frozen_for(Instant::now()).is_none());
    assert_eq!(r.board.marker_count(ParticipantId(0)), 0);

    r.tx.send(Slot(4)).await.unwrap();
    sleep(Duration::from_millis(30)).await;
    assert_eq!(r.board.marker_count(ParticipantId(0)), 1);
    assert!(r.board.has_marker(ParticipantId(0), Slot(4)));

    r.token.cancel();
    r.worker.await.unwrap();
}
