//! # setvisor
//!
//! **Setvisor** is the coordination runtime of a real-time multi-player card
//! matching game: one dealer and any number of players share a table of cards,
//! players race to mark three cards forming a legal combination, and the dealer
//! judges one selection at a time.
//!
//! The crate is about the concurrency protocol, not the pixels: everything a
//! display needs is published as [`Event`]s.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ActionSender      ActionSender      Presser (computer)
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//!   ┌──────────┐      ┌──────────┐      ┌──────────┐
//!   │ Player 0 │      │ Player 1 │      │ Player 2 │   toggle markers
//!   └────┬─────┘      └────┬─────┘      └────┬─────┘
//!        │   ┌─────────────┴─────────────┐   │
//!        └──►│ Board (one lock)          │◄──┘
//!            │ slots ↔ cards, markers    │◄──────────────┐
//!            └───────────────────────────┘               │ deal / remove / clear
//!        complete selection                              │
//!        ──► Mailbox (capacity 1) ──► ┌────────────────────────────┐
//!        ◄── release(Verdict) ◄────── │ Dealer                     │
//!                                     │ CombinationOracle, deck,   │
//!                                     │ standings, SessionState    │
//!                                     └────────────────────────────┘
//!
//!   Board / Dealer / Players ── publish ──► Bus ──► SubscriberSet ──► LogWriter, renderers, ...
//! ```
//!
//! ### Turn cycle
//! ```text
//! finish check ─► Dealing ─► RunningTurn ─► Collecting ─► finish check ...
//!      └─ no legal combination left in the deck / termination ─► Finished ─► Terminated
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                          |
//! |-------------------|----------------------------------------------------------------|---------------------------------------------|
//! | **Session**       | Build, run and terminate one game.                             | [`Session`], [`SessionBuilder`], [`Terminator`] |
//! | **Board**         | Shared table with atomic card and marker operations.           | [`Board`], [`CardId`], [`Slot`], [`Toggle`] |
//! | **Rules**         | Pluggable combination oracle, classic feature rules.           | [`CombinationOracle`], [`FeatureRules`]     |
//! | **Subscriber API**| Renderers and loggers consume the event stream.                | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Errors**        | Typed configuration and lifecycle errors.                      | [`ConfigError`], [`SessionError`]           |
//! | **Configuration** | Centralized session settings.                                  | [`Config`], [`TurnMode`]                    |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use setvisor::{Config, Session};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         computer_players: 0,
//!         grace: Duration::from_secs(1),
//!         ..Config::default()
//!     };
//!
//!     // Without players the dealer finishes right away with no winners.
//!     let outcome = Session::builder(cfg).build()?.run().await?;
//!     assert!(outcome.winners.is_empty());
//!     Ok(())
//! }
//! ```
mod board;
mod core;
mod error;
mod events;
mod rules;
mod subscribers;

// ---- Public re-exports ----

pub use board::{Board, CardId, MAX_MARKERS, ParticipantId, Slot, Toggle};
pub use crate::core::{
    ActionSender, Config, Outcome, Phase, Session, SessionBuilder, SessionState, Standing,
    Terminator, TurnMode, Verdict,
};
pub use error::{ConfigError, SessionError};
pub use events::{Bus, Event, EventKind};
pub use rules::{CombinationOracle, FeatureRules, Triple};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
