use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};
use crate::errors::GameError;

/// Ordered sequence of 52 unique cards, consumed strictly from one end.
///
/// The shuffle RNG is a seeded ChaCha20 stream so a table can replay the
/// exact same deal from the same seed. At any point the union of
/// (remaining deck + everything dealt) is the full 52-card set exactly once.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(seed);
        // Keep canonical order until shuffle is called explicitly
        Self {
            cards: full_deck(),
            position: 0,
            rng,
        }
    }

    /// Restores all 52 cards and applies one pass of a uniform shuffle.
    /// Called once per hand at hand start.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        if self.position >= self.cards.len() {
            None
        } else {
            let c = self.cards[self.position];
            self.position += 1;
            Some(c)
        }
    }

    /// Deals `n` cards at once. Fails only if `n` exceeds the remaining deck
    /// size, which the dealing arithmetic (2 × seats + 5 ≤ 52) rules out for
    /// supported table sizes.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.remaining() {
            return Err(GameError::DeckExhausted {
                requested: n,
                remaining: self.remaining(),
            });
        }
        Ok((0..n).filter_map(|_| self.deal_card()).collect())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len().saturating_sub(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn shuffle_is_deterministic_with_same_seed() {
        let mut d1 = Deck::new_with_seed(12345);
        let mut d2 = Deck::new_with_seed(12345);
        d1.shuffle();
        d2.shuffle();
        let a: Vec<Card> = (0..10).map(|_| d1.deal_card().unwrap()).collect();
        let b: Vec<Card> = (0..10).map(|_| d2.deal_card().unwrap()).collect();
        assert_eq!(a, b, "same seed must yield identical order");
    }

    #[test]
    fn shuffled_deck_stays_a_permutation() {
        let mut deck = Deck::new_with_seed(42);
        deck.shuffle();
        let mut seen = HashSet::new();
        while let Some(c) = deck.deal_card() {
            assert!(seen.insert(c), "card {:?} dealt twice", c);
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn deal_rejects_overdraw() {
        let mut deck = Deck::new_with_seed(7);
        deck.shuffle();
        let dealt = deck.deal(50).unwrap();
        assert_eq!(dealt.len(), 50);
        assert!(matches!(
            deck.deal(3),
            Err(GameError::DeckExhausted {
                requested: 3,
                remaining: 2
            })
        ));
        // a failed deal consumes nothing
        assert_eq!(deck.remaining(), 2);
    }
}
