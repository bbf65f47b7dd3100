//! # Identifiers shared by the board, the dealer and the players.

use std::fmt;

/// Number of markers that make a complete selection.
pub const MAX_MARKERS: usize = 3;

/// Card identifier (index into the full deck, starting from 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(pub u32);

/// Board position that holds at most one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub usize);

/// Stable participant identifier (starting from 0, in spawn order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub usize);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card#{}", self.0)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Result of [`Board::toggle_marker`](crate::Board::toggle_marker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Marker placed; the participant's count went up by one.
    Added,
    /// Existing marker taken back; the count went down by one.
    Removed,
    /// Slot is empty, or the selection is already full.
    Rejected,
}
