//! # Combination rules.
//!
//! The dealer never decides by itself whether three cards match: it asks a
//! [`CombinationOracle`]. [`FeatureRules`] is the classic rule set where every
//! card is a vector of `feature_count` features with `feature_size` values each,
//! and three cards form a legal combination when each feature is either the same
//! on all three cards or different on all three.
//!
//! ## Card encoding
//! ```text
//! card id = f0 + f1·size + f2·size² + ...      (base-`feature_size` digits)
//!
//! size=3, count=4:  id 0  → [0,0,0,0]
//!                   id 41 → [2,1,1,1]
//!                   id 80 → [2,2,2,2]
//! ```

use crate::board::{CardId, MAX_MARKERS};

/// A candidate (or confirmed) combination.
pub type Triple = [CardId; MAX_MARKERS];

/// Pure combinatorial oracle consulted by the dealer.
pub trait CombinationOracle: Send + Sync + 'static {
    /// Returns up to `limit` legal combinations drawn from `cards`.
    fn find_combinations(&self, cards: &[CardId], limit: usize) -> Vec<Triple>;

    /// Whether the three cards form a legal combination.
    fn is_legal(&self, cards: &Triple) -> bool;

    /// Whether at least one legal combination exists among `cards`.
    fn has_combination(&self, cards: &[CardId]) -> bool {
        !self.find_combinations(cards, 1).is_empty()
    }

    /// Feature vector of a card, used for hint output.
    fn describe(&self, _card: CardId) -> Vec<u32> {
        Vec::new()
    }
}

/// Feature-vector matching rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureRules {
    /// Number of values each feature can take.
    pub feature_size: u32,
    /// Number of features per card.
    pub feature_count: u32,
}

impl Default for FeatureRules {
    /// Four features with three values each (81 cards).
    fn default() -> Self {
        Self {
            feature_size: 3,
            feature_count: 4,
        }
    }
}

impl FeatureRules {
    pub fn new(feature_size: u32, feature_count: u32) -> Self {
        Self {
            feature_size,
            feature_count,
        }
    }

    /// Number of distinct cards the encoding can express.
    pub fn deck_size(&self) -> u64 {
        u64::from(self.feature_size).saturating_pow(self.feature_count)
    }

    /// Decodes a card id into its features (least significant first).
    pub fn features(&self, card: CardId) -> Vec<u32> {
        let size = self.feature_size.max(1);
        let mut rest = card.0;
        (0..self.feature_count)
            .map(|_| {
                let f = rest % size;
                rest /= size;
                f
            })
            .collect()
    }
}

impl CombinationOracle for FeatureRules {
    fn find_combinations(&self, cards: &[CardId], limit: usize) -> Vec<Triple> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }
        let n = cards.len();
        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    let t = [cards[i], cards[j], cards[k]];
                    if self.is_legal(&t) {
                        found.push(t);
                        if found.len() >= limit {
                            return found;
                        }
                    }
                }
            }
        }
        found
    }

    fn is_legal(&self, cards: &Triple) -> bool {
        let [a, b, c] = cards;
        if a == b || b == c || a == c {
            return false;
        }
        let (fa, fb, fc) = (self.features(*a), self.features(*b), self.features(*c));
        fa.iter().zip(&fb).zip(&fc).all(|((x, y), z)| {
            let all_same = x == y && y == z;
            let all_distinct = x != y && y != z && x != z;
            all_same || all_distinct
        })
    }

    fn describe(&self, card: CardId) -> Vec<u32> {
        self.features(card)
    }
}
