//! # Shared board state.
//!
//! - [`Board`] slot↔card mapping plus the per-player marker matrix, behind a single lock
//! - [`CardId`], [`Slot`], [`ParticipantId`] plain identifiers
//! - [`Toggle`] outcome of a marker toggle
//! - [`MAX_MARKERS`] size of a complete selection

mod ids;
mod table;

pub use ids::{CardId, MAX_MARKERS, ParticipantId, Slot, Toggle};
pub use table::Board;
