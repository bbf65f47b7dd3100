//! Runtime core: workers, handoff and lifecycle.
//!
//! The public surface is [`Session`] (with its [`SessionBuilder`]) and the small
//! handles and state types it hands out.
//!
//! Internal modules:
//! - [`dealer`]: supervisor phase loop, one evaluation at a time, ordered teardown;
//! - [`participant`]: player worker turning key presses into marker toggles;
//! - [`presser`]: random key presses for computer players;
//! - [`mailbox`]: capacity-1 rendezvous between players and the dealer;
//! - [`session`]: startup, termination request, grace period;
//! - [`shutdown`]: OS signal handling.

mod builder;
mod config;
mod dealer;
mod mailbox;
mod participant;
mod presser;
mod session;
mod shutdown;
mod standing;
mod state;

#[cfg(test)]
mod tests;

pub use builder::SessionBuilder;
pub use config::{Config, TurnMode};
pub use dealer::Outcome;
pub use mailbox::Verdict;
pub use participant::ActionSender;
pub use session::{Session, Terminator};
pub use standing::Standing;
pub use state::{Phase, SessionState};
