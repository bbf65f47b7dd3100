//! # Board: the shared table of slots, cards, and player markers.
//!
//! All state lives behind one mutex, so every operation below is atomic with
//! respect to every other one. Render events are published while the lock is
//! held: subscribers observe mutations in exactly the order they happened.
//!
//! ## Layout
//! ```text
//!              player 0  player 1  ...  player P-1
//! slot 0  [c7]   true     false          false
//! slot 1  [  ]   false    false          false
//! slot 2  [c3]   false    true           true
//! ...
//! marker_count:  1        1              1
//! ```
//!
//! ## Rules
//! - `slot_to_card[s] == c` iff `card_to_slot[c] == s`
//! - `marker_count[p]` always equals the number of `true` cells in column `p`
//!   and never exceeds [`MAX_MARKERS`]
//! - markers only exist on occupied slots; removing a card clears every marker
//!   on its slot inside the same critical section

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::Rng;
use rand::seq::SliceRandom;

use super::ids::{CardId, MAX_MARKERS, ParticipantId, Slot, Toggle};
use crate::events::{Bus, Event, EventKind};

struct Grid {
    slot_to_card: Vec<Option<CardId>>,
    card_to_slot: HashMap<CardId, Slot>,
    markers: Vec<Vec<bool>>,
    marker_count: Vec<usize>,
}

impl Grid {
    fn card_at(&self, slot: Slot) -> Option<CardId> {
        self.slot_to_card.get(slot.0).copied().flatten()
    }

    fn empty_slots(&self) -> Vec<Slot> {
        self.slot_to_card
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| Slot(i))
            .collect()
    }

    fn clear_marker(&mut self, p: usize, slot: Slot) -> bool {
        let cell = &mut self.markers[slot.0][p];
        if !*cell {
            return false;
        }
        *cell = false;
        self.marker_count[p] -= 1;
        true
    }
}

/// Shared game table.
pub struct Board {
    grid: Mutex<Grid>,
    bus: Bus,
    table_size: usize,
    participants: usize,
}

impl Board {
    /// Creates an empty board with `table_size` slots and a marker column per participant.
    pub fn new(table_size: usize, participants: usize, bus: Bus) -> Self {
        Self {
            grid: Mutex::new(Grid {
                slot_to_card: vec![None; table_size],
                card_to_slot: HashMap::new(),
                markers: vec![vec![false; participants]; table_size],
                marker_count: vec![0; participants],
            }),
            bus,
            table_size,
            participants,
        }
    }

    fn grid(&self) -> MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Puts `card` into `slot`.
    ///
    /// The caller checks that the slot is empty first. An occupied or unknown
    /// slot leaves the board untouched and publishes a `ConsistencyWarning`.
    pub fn place_card(&self, card: CardId, slot: Slot) {
        let mut g = self.grid();
        Self::place_locked(&mut g, &self.bus, card, slot);
    }

    /// Puts `card` into an empty slot chosen uniformly at random.
    ///
    /// Returns `None` if the board is full.
    pub fn place_card_random(&self, card: CardId) -> Option<Slot> {
        let mut g = self.grid();
        let empty = g.empty_slots();
        if empty.is_empty() {
            return None;
        }
        let slot = empty[rand::rng().random_range(0..empty.len())];
        Self::place_locked(&mut g, &self.bus, card, slot).then_some(slot)
    }

    fn place_locked(g: &mut Grid, bus: &Bus, card: CardId, slot: Slot) -> bool {
        let free = matches!(g.slot_to_card.get(slot.0), Some(None));
        if !free || g.card_to_slot.contains_key(&card) {
            bus.publish(
                Event::new(EventKind::ConsistencyWarning)
                    .with_card(card)
                    .with_slot(slot)
                    .with_reason("place_on_occupied_slot"),
            );
            return false;
        }
        g.slot_to_card[slot.0] = Some(card);
        g.card_to_slot.insert(card, slot);
        bus.publish(
            Event::new(EventKind::CardPlaced)
                .with_card(card)
                .with_slot(slot),
        );
        true
    }

    /// Takes the card out of `slot` together with every marker on it.
    ///
    /// No-op (and no event) when the slot is already empty.
    pub fn remove_card(&self, slot: Slot) -> Option<CardId> {
        let mut g = self.grid();
        Self::remove_locked(&mut g, &self.bus, slot)
    }

    /// Removes `card` wherever it is; returns the slot it occupied.
    pub fn remove_card_by_id(&self, card: CardId) -> Option<Slot> {
        let mut g = self.grid();
        let slot = g.card_to_slot.get(&card).copied()?;
        Self::remove_locked(&mut g, &self.bus, slot).map(|_| slot)
    }

    fn remove_locked(g: &mut Grid, bus: &Bus, slot: Slot) -> Option<CardId> {
        let card = g.card_at(slot)?;
        g.slot_to_card[slot.0] = None;
        g.card_to_slot.remove(&card);
        for p in 0..g.marker_count.len() {
            if g.clear_marker(p, slot) {
                bus.publish(
                    Event::new(EventKind::MarkerRemoved)
                        .with_participant(ParticipantId(p))
                        .with_slot(slot),
                );
            }
        }
        bus.publish(Event::new(EventKind::CardRemoved).with_slot(slot));
        Some(card)
    }

    /// Flips participant `p`'s marker on `slot`.
    ///
    /// Once the participant holds [`MAX_MARKERS`] markers, further additions are
    /// rejected until one is taken back or cleared by a card removal.
    pub fn toggle_marker(&self, p: ParticipantId, slot: Slot) -> Toggle {
        let mut g = self.grid();
        if p.0 >= g.marker_count.len() || g.card_at(slot).is_none() {
            return Toggle::Rejected;
        }
        if g.clear_marker(p.0, slot) {
            self.bus.publish(
                Event::new(EventKind::MarkerRemoved)
                    .with_participant(p)
                    .with_slot(slot),
            );
            return Toggle::Removed;
        }
        if g.marker_count[p.0] >= MAX_MARKERS {
            return Toggle::Rejected;
        }
        g.markers[slot.0][p.0] = true;
        g.marker_count[p.0] += 1;
        self.bus.publish(
            Event::new(EventKind::MarkerPlaced)
                .with_participant(p)
                .with_slot(slot),
        );
        Toggle::Added
    }

    /// Cards under participant `p`'s markers, in slot order.
    pub fn collect_marked_cards(&self, p: ParticipantId) -> Vec<CardId> {
        let g = self.grid();
        if p.0 >= g.marker_count.len() {
            return Vec::new();
        }
        g.markers
            .iter()
            .enumerate()
            .filter(|(_, row)| row[p.0])
            .filter_map(|(s, _)| g.slot_to_card[s])
            .collect()
    }

    /// Removes every card (in a random slot order) and every marker.
    ///
    /// Returns the removed cards so they can go back to the deck.
    pub fn clear(&self) -> Vec<CardId> {
        let mut g = self.grid();
        let mut order: Vec<Slot> = (0..self.table_size).map(Slot).collect();
        order.shuffle(&mut rand::rng());
        order
            .into_iter()
            .filter_map(|slot| Self::remove_locked(&mut g, &self.bus, slot))
            .collect()
    }

    pub fn marker_count(&self, p: ParticipantId) -> usize {
        self.grid().marker_count.get(p.0).copied().unwrap_or(0)
    }

    pub fn has_marker(&self, p: ParticipantId, slot: Slot) -> bool {
        let g = self.grid();
        g.markers
            .get(slot.0)
            .and_then(|row| row.get(p.0))
            .copied()
            .unwrap_or(false)
    }

    pub fn card_at(&self, slot: Slot) -> Option<CardId> {
        self.grid().card_at(slot)
    }

    pub fn slot_of(&self, card: CardId) -> Option<Slot> {
        self.grid().card_to_slot.get(&card).copied()
    }

    /// Cards currently on the table, in slot order.
    pub fn cards(&self) -> Vec<CardId> {
        self.grid().slot_to_card.iter().flatten().copied().collect()
    }

    pub fn count_filled(&self) -> usize {
        self.grid().slot_to_card.iter().filter(|c| c.is_some()).count()
    }

    pub fn count_empty(&self) -> usize {
        self.table_size - self.count_filled()
    }

    /// Checks every board invariant in one critical section.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let g = self.grid();
        let bijection = g.card_to_slot.len() == g.slot_to_card.iter().flatten().count()
            && g
                .card_to_slot
                .iter()
                .all(|(c, s)| g.card_at(*s) == Some(*c));
        let markers = g.marker_count.iter().enumerate().all(|(p, n)| {
            let column = g.markers.iter().filter(|row| row[p]).count();
            *n == column && column <= MAX_MARKERS
        });
        let on_cards = g
            .markers
            .iter()
            .enumerate()
            .all(|(s, row)| g.slot_to_card[s].is_some() || row.iter().all(|m| !m));
        bijection && markers && on_cards
    }
}
