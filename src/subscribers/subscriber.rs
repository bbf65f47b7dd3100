//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging render sinks, loggers and
//! recorders into a session.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Rules
//! - A slow subscriber only affects its own queue; it never slows the board or the dealer.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use setvisor::{Event, EventKind, Subscribe};
//!
//! struct ScoreTicker;
//!
//! #[async_trait]
//! impl Subscribe for ScoreTicker {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::Score) {
//!             // redraw the score column
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "score-ticker" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for session rendering and logging.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
