//! # Session: lifecycle around one dealer.
//!
//! A [`Session`] owns the event bus, the subscribers, the shared board and the
//! dealer. [`Session::run`] forwards bus events to the subscribers, runs the
//! dealer to completion and enforces the grace period after a termination request.
//!
//! ## Architecture
//! ```text
//! SessionBuilder::build() ──► Session
//!                               │ action_senders() ──► ActionSender::press(slot) ──► player inbox
//!                               │ terminator()     ──► Terminator::terminate()
//!                               ▼
//! run():
//!   Bus.subscribe() ─► listener ─► SubscriberSet::emit ─► [queue S1] ... [queue SN]
//!   spawn Dealer::run(token) ─► players, pressers ...
//!
//!   dealer returns            ──► Ok(Outcome)
//!   token cancelled           ──► Bus.publish(ShutdownRequested)
//!                                 └─► timeout(grace, dealer):
//!                                       ├─ joined   → Bus.publish(AllStoppedWithin)
//!                                       └─ elapsed  → Bus.publish(GraceExceeded)
//!                                                     hard-stop every worker
//!                                                     Err(GraceExceeded { stuck })
//!   listener drains the bus, subscribers drain their queues
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use setvisor::{Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config { computer_players: 3, ..Config::default() };
//!     let session = Session::builder(cfg).build()?;
//!     let outcome = session.run_until_signal().await?;
//!     println!("winners: {:?}", outcome.winners);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::board::{Board, ParticipantId};
use crate::core::builder::SessionBuilder;
use crate::core::config::Config;
use crate::core::dealer::{Dealer, Outcome};
use crate::core::participant::ActionSender;
use crate::core::shutdown;
use crate::core::standing::Standing;
use crate::core::state::SessionState;
use crate::error::SessionError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Cloneable handle that asks a running session to stop.
#[derive(Clone, Debug)]
pub struct Terminator {
    token: CancellationToken,
    reason: Arc<OnceLock<&'static str>>,
}

impl Terminator {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Requests termination. Idempotent; later calls are no-ops.
    pub fn terminate(&self) {
        self.terminate_with("requested");
    }

    pub(crate) fn terminate_with(&self, reason: &'static str) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_terminated(&self) -> bool {
        self.token.is_cancelled()
    }

    fn reason(&self) -> &'static str {
        self.reason.get().copied().unwrap_or("requested")
    }
}

/// A configured game session, ready to run.
pub struct Session {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(crate) board: Arc<Board>,
    pub(crate) state: Arc<SessionState>,
    pub(crate) standings: Vec<Arc<Standing>>,
    pub(crate) senders: Vec<ActionSender>,
    pub(crate) dealer: Dealer,
    pub(crate) terminator: Terminator,
    pub(crate) hard_stop: CancellationToken,
}

impl Session {
    /// Starts configuring a session.
    pub fn builder(cfg: Config) -> SessionBuilder {
        SessionBuilder::new(cfg)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    /// Input handles, indexed by player id.
    pub fn action_senders(&self) -> &[ActionSender] {
        &self.senders
    }

    pub fn action_sender(&self, id: ParticipantId) -> Option<ActionSender> {
        self.senders.get(id.0).cloned()
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Per-player standings, indexed by player id.
    pub fn standings(&self) -> &[Arc<Standing>] {
        &self.standings
    }

    /// Raw receiver of every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs the session until the deck is exhausted or termination is requested.
    ///
    /// After a termination request the dealer has [`Config::grace`] to finish its
    /// current evaluation and join every player.
    pub async fn run(self) -> Result<Outcome, SessionError> {
        let Session {
            cfg,
            bus,
            subscribers,
            standings,
            dealer,
            terminator,
            hard_stop,
            ..
        } = self;

        let listener = Listener::spawn(subscribers, &bus);
        let mut dealer_task = tokio::spawn(dealer.run(terminator.token.clone()));

        let result = tokio::select! {
            joined = &mut dealer_task => dealer_result(joined),
            _ = terminator.token.cancelled() => {
                bus.publish(
                    Event::new(EventKind::ShutdownRequested).with_reason(terminator.reason()),
                );
                match time::timeout(cfg.grace, &mut dealer_task).await {
                    Ok(joined) => {
                        bus.publish(Event::new(EventKind::AllStoppedWithin));
                        dealer_result(joined)
                    }
                    Err(_elapsed) => {
                        bus.publish(Event::new(EventKind::GraceExceeded));
                        let stuck = standings
                            .iter()
                            .filter(|s| s.is_alive())
                            .map(|s| s.id())
                            .collect();
                        dealer_task.abort();
                        hard_stop.cancel();
                        Err(SessionError::GraceExceeded { grace: cfg.grace, stuck })
                    }
                }
            }
        };

        if let Some(listener) = listener {
            listener.finish().await;
        }
        result
    }

    /// Like [`Session::run`], but an OS termination signal requests termination.
    pub async fn run_until_signal(self) -> Result<Outcome, SessionError> {
        let terminator = self.terminator();
        let watcher = tokio::spawn(async move {
            if let Ok(signal) = shutdown::wait_for_shutdown_signal().await {
                terminator.terminate_with(signal);
            }
        });
        let result = self.run().await;
        watcher.abort();
        result
    }
}

fn dealer_result(
    joined: Result<Result<Outcome, SessionError>, JoinError>,
) -> Result<Outcome, SessionError> {
    joined.unwrap_or_else(|_| {
        Err(SessionError::WorkerPanicked {
            worker: "dealer".to_string(),
        })
    })
}

/// Forwards bus events to the subscribers for the lifetime of a run.
struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Subscribes before returning, so no event published afterwards is missed.
    fn spawn(subscribers: Vec<Arc<dyn Subscribe>>, bus: &Bus) -> Option<Self> {
        if subscribers.is_empty() {
            return None;
        }
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(subscribers, bus.clone());
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    next = rx.recv() => match next {
                        Ok(ev) => set.emit(Arc::new(ev)),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stopped.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(Arc::new(ev)),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });
        Some(Self { stop, handle })
    }

    /// Delivers what is already on the bus, then waits for every subscriber to drain.
    async fn finish(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}
