//! Session events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Board` (render events, under its lock), `Dealer`,
//!   player workers, `SubscriberSet` workers (overflow/panic), `Session`.
//! - **Consumers**: the session listener (fans out to `SubscriberSet`) and any
//!   receiver obtained through `Session::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
