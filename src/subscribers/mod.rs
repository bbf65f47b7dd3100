//! # Event subscribers.
//!
//! A session has no built-in display: everything a renderer or a logger needs
//! arrives as [`Event`](crate::Event)s, delivered to every [`Subscribe`]
//! implementation through a [`SubscriberSet`].
//!
//! ## Architecture
//! ```text
//! Board / Dealer / Player ── publish(Event) ──► Bus ──► session listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                              ┌───────────┼───────────┐
//!                                              ▼           ▼           ▼
//!                                          LogWriter    Renderer     Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
