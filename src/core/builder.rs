use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    config::Config,
    dealer::{Dealer, DealerParams, Seat},
    mailbox::mailbox,
    participant::{ActionSender, Participant},
    presser::Presser,
    session::{Session, Terminator},
    standing::Standing,
    state::SessionState,
};
use crate::{
    board::{Board, CardId, ParticipantId},
    error::ConfigError,
    events::Bus,
    rules::{CombinationOracle, FeatureRules},
    subscribers::Subscribe,
};

/// Builder for a [`Session`].
pub struct SessionBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    oracle: Option<Arc<dyn CombinationOracle>>,
    deck: Option<Vec<CardId>>,
}

impl SessionBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            oracle: None,
            deck: None,
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue once the session runs.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default [`FeatureRules`] built from `feature_size`/`feature_count`.
    pub fn with_oracle(mut self, oracle: Arc<dyn CombinationOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Deals exactly these cards instead of `0..deck_size`.
    pub fn with_deck(mut self, deck: Vec<CardId>) -> Self {
        self.deck = Some(deck);
        self
    }

    /// Validates the configuration and wires players, mailbox and dealer together.
    ///
    /// Nothing is spawned until [`Session::run`].
    pub fn build(self) -> Result<Session, ConfigError> {
        let cfg = self.cfg;
        let deck = self.deck.unwrap_or_else(|| {
            let size = u32::try_from(cfg.deck_size).unwrap_or(u32::MAX);
            (0..size).map(CardId).collect()
        });
        cfg.validate(deck.len())?;

        let oracle = match self.oracle {
            Some(oracle) => oracle,
            None => {
                let rules = FeatureRules::new(cfg.feature_size, cfg.feature_count);
                let max = rules.deck_size();
                if deck.iter().any(|c| u64::from(c.0) >= max) {
                    return Err(ConfigError::FeatureMismatch {
                        deck: deck.len(),
                        max,
                    });
                }
                Arc::new(rules)
            }
        };

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let players = cfg.players();
        let board = Arc::new(Board::new(cfg.table_size, players, bus.clone()));
        let state = Arc::new(SessionState::new());
        let (outbox, inbox) = mailbox();
        let hard_stop = CancellationToken::new();

        let mut standings = Vec::with_capacity(players);
        let mut senders = Vec::with_capacity(players);
        let mut seats = Vec::with_capacity(players);
        for n in 0..players {
            let id = ParticipantId(n);
            let standing = Arc::new(Standing::new(id, n < cfg.human_players));
            let (tx, rx) = mpsc::channel(cfg.inbox_capacity);

            let presser =
                (!standing.is_human()).then(|| Presser::new(tx.clone(), cfg.table_size));
            let participant = Participant::new(
                Arc::clone(&standing),
                Arc::clone(&board),
                Arc::clone(&state),
                outbox.clone(),
                rx,
                bus.clone(),
                cfg.freeze_refresh_interval(),
            );
            senders.push(ActionSender::new(id, tx, bus.clone()));
            standings.push(standing);
            seats.push(Seat {
                participant,
                presser,
            });
        }
        drop(outbox);

        let dealer = Dealer::new(DealerParams {
            cfg: cfg.clone(),
            board: Arc::clone(&board),
            state: Arc::clone(&state),
            oracle,
            bus: bus.clone(),
            deck,
            inbox,
            standings: standings.clone(),
            seats,
            hard_stop: hard_stop.clone(),
        });

        Ok(Session {
            cfg,
            bus,
            subscribers: self.subscribers,
            board,
            state,
            standings,
            senders,
            dealer,
            terminator: Terminator::new(),
            hard_stop,
        })
    }
}
