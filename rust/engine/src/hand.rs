use std::cmp::Ordering;

use crate::cards::{Card, Rank, Suit};

/// Hand category in ascending order of strength. The discriminant is the
/// primary comparison key; kickers break ties within a category.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::HighCard => "high card",
            Category::OnePair => "pair",
            Category::TwoPair => "two pair",
            Category::ThreeOfAKind => "three of a kind",
            Category::Straight => "straight",
            Category::Flush => "flush",
            Category::FullHouse => "full house",
            Category::FourOfAKind => "four of a kind",
            Category::StraightFlush => "straight flush",
        }
    }
}

/// Total-ordered rank of the best five-card hand found in the input.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HandStrength {
    pub category: Category,
    /// Tie-break ranks ordered high -> low in descending significance.
    pub kickers: [u8; 5],
}

impl HandStrength {
    /// Short textual description, e.g. "full house (K high)".
    pub fn describe(&self) -> String {
        format!(
            "{} ({} high)",
            self.category.label(),
            Rank::from_value(self.kickers[0].max(2))
        )
    }
}

/// Ranks the best 5-card hand obtainable from `cards` (5 to 7 cards: 2 hole
/// cards plus up to 5 community cards). The rank-count representation picks
/// the best five-card subset implicitly; no explicit combination scan is
/// needed.
pub fn evaluate_hand(cards: &[Card]) -> HandStrength {
    debug_assert!(
        (5..=7).contains(&cards.len()),
        "evaluator takes 5 to 7 cards, got {}",
        cards.len()
    );

    let mut rank_counts = [0u8; 15]; // indices 2..=14 used
    let mut suit_counts = [0u8; 4];
    let mut by_suit: [Vec<u8>; 4] = [vec![], vec![], vec![], vec![]];
    for &c in cards {
        let r = c.rank.value();
        rank_counts[r as usize] += 1;
        let s = suit_index(c.suit);
        suit_counts[s] += 1;
        by_suit[s].push(r);
    }

    let flush_suit = suit_counts.iter().position(|&count| count >= 5);

    // Straight flush
    if let Some(s) = flush_suit {
        let mut suited = by_suit[s].clone();
        suited.sort_unstable();
        suited.dedup();
        if let Some(high) = straight_high(&suited) {
            return HandStrength {
                category: Category::StraightFlush,
                kickers: [high, 0, 0, 0, 0],
            };
        }
    }

    let (quads, trips, pairs, singles) = classify_multiples(&rank_counts);

    if let Some(&quad) = quads.first() {
        let kicker = best_excluding(&rank_counts, &[quad]);
        return HandStrength {
            category: Category::FourOfAKind,
            kickers: [quad, kicker, 0, 0, 0],
        };
    }

    // Full house: highest trips plus the best remaining pair (a second set of
    // trips counts as the pair).
    if !trips.is_empty() {
        let over = trips[0];
        let under = trips
            .get(1)
            .copied()
            .into_iter()
            .chain(pairs.first().copied())
            .max();
        if let Some(under) = under {
            return HandStrength {
                category: Category::FullHouse,
                kickers: [over, under, 0, 0, 0],
            };
        }
    }

    if let Some(s) = flush_suit {
        let mut ranks = by_suit[s].clone();
        ranks.sort_unstable_by(|a, b| b.cmp(a));
        let mut k = [0u8; 5];
        k.copy_from_slice(&ranks[..5]);
        return HandStrength {
            category: Category::Flush,
            kickers: k,
        };
    }

    let mut uniq: Vec<u8> = (2..=14).filter(|&r| rank_counts[r as usize] > 0).collect();
    uniq.sort_unstable();
    if let Some(high) = straight_high(&uniq) {
        return HandStrength {
            category: Category::Straight,
            kickers: [high, 0, 0, 0, 0],
        };
    }

    if let Some(&t) = trips.first() {
        let mut rest: Vec<u8> = pairs.iter().chain(singles.iter()).copied().collect();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        return HandStrength {
            category: Category::ThreeOfAKind,
            kickers: [
                t,
                rest.first().copied().unwrap_or(0),
                rest.get(1).copied().unwrap_or(0),
                0,
                0,
            ],
        };
    }

    if pairs.len() >= 2 {
        let high = pairs[0];
        let low = pairs[1];
        // With three pairs in 7 cards the odd pair's rank competes as kicker.
        let mut rest: Vec<u8> = pairs[2..].iter().chain(singles.iter()).copied().collect();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        return HandStrength {
            category: Category::TwoPair,
            kickers: [high, low, rest.first().copied().unwrap_or(0), 0, 0],
        };
    }

    if let Some(&p) = pairs.first() {
        let mut rest = singles.clone();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        let mut k = [p, 0, 0, 0, 0];
        for i in 0..3 {
            k[i + 1] = rest.get(i).copied().unwrap_or(0);
        }
        return HandStrength {
            category: Category::OnePair,
            kickers: k,
        };
    }

    let mut highs = singles;
    highs.sort_unstable_by(|a, b| b.cmp(a));
    let mut k = [0u8; 5];
    for (i, slot) in k.iter_mut().enumerate() {
        *slot = highs.get(i).copied().unwrap_or(0);
    }
    HandStrength {
        category: Category::HighCard,
        kickers: k,
    }
}

/// Negative / zero / positive total ordering over hand strengths.
pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.kickers.cmp(&b.kickers),
        ord => ord,
    }
}

fn suit_index(s: Suit) -> usize {
    match s {
        Suit::Clubs => 0,
        Suit::Diamonds => 1,
        Suit::Hearts => 2,
        Suit::Spades => 3,
    }
}

/// Highest rank completing a 5-long run in `ranks` (sorted ascending,
/// deduplicated). The Ace doubles as rank 1 so the wheel (A-2-3-4-5) is
/// detected with high card Five.
fn straight_high(ranks: &[u8]) -> Option<u8> {
    let mut v: Vec<u8> = Vec::with_capacity(ranks.len() + 1);
    if ranks.contains(&14) {
        v.push(1);
    }
    v.extend_from_slice(ranks);

    let mut best = None;
    let mut run = 1usize;
    for i in 1..v.len() {
        if v[i] == v[i - 1] + 1 {
            run += 1;
            if run >= 5 {
                best = Some(v[i]);
            }
        } else {
            run = 1;
        }
    }
    best
}

/// Splits the rank histogram into (quads, trips, pairs, singles), each sorted
/// high -> low.
fn classify_multiples(rank_counts: &[u8; 15]) -> (Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut quads = vec![];
    let mut trips = vec![];
    let mut pairs = vec![];
    let mut singles = vec![];
    for r in (2..=14u8).rev() {
        match rank_counts[r as usize] {
            4 => quads.push(r),
            3 => trips.push(r),
            2 => pairs.push(r),
            1 => singles.push(r),
            _ => {}
        }
    }
    (quads, trips, pairs, singles)
}

fn best_excluding(rank_counts: &[u8; 15], excluded: &[u8]) -> u8 {
    (2..=14u8)
        .rev()
        .find(|r| rank_counts[*r as usize] > 0 && !excluded.contains(r))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank as R, Suit as S};

    fn c(s: S, r: R) -> Card {
        Card { suit: s, rank: r }
    }

    #[test]
    fn wheel_straight_counts_ace_low() {
        let cards = [
            c(S::Clubs, R::Ace),
            c(S::Hearts, R::Two),
            c(S::Diamonds, R::Three),
            c(S::Spades, R::Four),
            c(S::Clubs, R::Five),
        ];
        let hs = evaluate_hand(&cards);
        assert_eq!(hs.category, Category::Straight);
        assert_eq!(hs.kickers[0], 5, "wheel high card is the Five");
    }

    #[test]
    fn double_trips_make_a_full_house() {
        let cards = [
            c(S::Clubs, R::Nine),
            c(S::Hearts, R::Nine),
            c(S::Diamonds, R::Nine),
            c(S::Clubs, R::King),
            c(S::Hearts, R::King),
            c(S::Spades, R::King),
            c(S::Spades, R::Two),
        ];
        let hs = evaluate_hand(&cards);
        assert_eq!(hs.category, Category::FullHouse);
        assert_eq!(hs.kickers[0], 13);
        assert_eq!(hs.kickers[1], 9);
    }

    #[test]
    fn three_pairs_use_best_two_and_kicker() {
        let cards = [
            c(S::Clubs, R::Two),
            c(S::Hearts, R::Two),
            c(S::Diamonds, R::Seven),
            c(S::Spades, R::Seven),
            c(S::Clubs, R::Jack),
            c(S::Hearts, R::Jack),
            c(S::Spades, R::Ace),
        ];
        let hs = evaluate_hand(&cards);
        assert_eq!(hs.category, Category::TwoPair);
        assert_eq!(hs.kickers[..3], [11, 7, 14]);
    }

    #[test]
    fn describe_names_category() {
        let cards = [
            c(S::Clubs, R::Nine),
            c(S::Hearts, R::Nine),
            c(S::Diamonds, R::Nine),
            c(S::Spades, R::Nine),
            c(S::Clubs, R::Two),
        ];
        let hs = evaluate_hand(&cards);
        assert!(hs.describe().starts_with("four of a kind"));
    }
}
