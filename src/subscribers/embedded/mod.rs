//! # Built-in subscribers
//!
//! - [`LogWriter`]: prints events in a human-readable form (console sink).

mod log;

pub use log::LogWriter;
