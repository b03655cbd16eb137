//! The heuristic agent: pre-flop hand scoring, post-flop Monte-Carlo equity,
//! pot-odds comparison and strength-threshold action bands.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use cardroom_engine::cards::{full_deck, Card};
use cardroom_engine::hand::{compare_hands, evaluate_hand};
use cardroom_engine::seat::{PlayerAction, Seat};
use cardroom_engine::table::{Phase, Table};

/// Monte-Carlo trials per post-flop decision. Hundreds of trials keeps the
/// equity estimate within a few percent without noticeable latency.
const DEFAULT_SAMPLES: usize = 300;

/// Probability of a bluff raise on an otherwise weak hand.
const BLUFF_FREQUENCY: f64 = 0.05;

/// Uniform jitter applied to the strength estimate so play is not fully
/// deterministic.
const STRENGTH_JITTER: f64 = 0.04;

/// Rule-based decision agent for bot seats.
///
/// Pre-flop it scores the hole cards 0–20 (high card value, pair bonus,
/// suited bonus, connectedness bonus, gap penalty) and normalizes to 0–1.
/// Post-flop it estimates win probability by Monte-Carlo: complete the
/// unseen board and deal random opponent hole cards from the remaining
/// deck, compare with the hand evaluator, count wins and half-credit ties.
/// The estimate is then compared against pot odds (with a phase-dependent
/// implied-odds discount), jittered, occasionally overridden by a bluff,
/// and nudged by position to pick an action band.
#[derive(Debug, Clone)]
pub struct HeuristicAgent {
    rng: ChaCha20Rng,
    samples: usize,
}

impl HeuristicAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            samples: DEFAULT_SAMPLES,
        }
    }

    pub fn with_samples(seed: u64, samples: usize) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            samples: samples.max(1),
        }
    }

    /// Scores two hole cards on a 0–20 scale.
    fn preflop_score(hole: [Card; 2]) -> i32 {
        let r1 = hole[0].rank.value() as i32;
        let r2 = hole[1].rank.value() as i32;
        let (high, low) = if r1 > r2 { (r1, r2) } else { (r2, r1) };
        let suited = hole[0].suit == hole[1].suit;

        let mut score = high / 2; // 1..=7 from the high card
        if high == low {
            score += 8 + high / 4; // pair bonus, bigger for bigger pairs
        } else {
            let gap = high - low;
            match gap {
                1 => score += 2, // connectors
                2 => score += 1,
                3 => {}
                _ => score -= (gap - 3).min(5), // rank-gap penalty
            }
        }
        if suited {
            score += 2;
        }
        score.clamp(0, 20)
    }

    /// Monte-Carlo win probability for `hero` against `opponents` live seats.
    /// Ties are half-credited. Inherently stochastic; only approximately
    /// reproducible across sample counts.
    fn monte_carlo_equity(&mut self, hole: &[Card], community: &[Card], opponents: usize) -> f64 {
        if opponents == 0 {
            return 1.0;
        }
        let mut stub: Vec<Card> = full_deck()
            .into_iter()
            .filter(|c| !hole.contains(c) && !community.contains(c))
            .collect();

        let missing = 5 - community.len();
        let mut credit = 0.0;
        for _ in 0..self.samples {
            stub.shuffle(&mut self.rng);
            let board: Vec<Card> = community
                .iter()
                .copied()
                .chain(stub[..missing].iter().copied())
                .collect();

            let mut hero_cards = hole.to_vec();
            hero_cards.extend_from_slice(&board);
            let hero = evaluate_hand(&hero_cards);

            let mut outcome: f64 = 1.0;
            for opp in 0..opponents {
                let offset = missing + opp * 2;
                let mut opp_cards = vec![stub[offset], stub[offset + 1]];
                opp_cards.extend_from_slice(&board);
                let villain = evaluate_hand(&opp_cards);
                match compare_hands(&villain, &hero) {
                    std::cmp::Ordering::Greater => {
                        outcome = 0.0;
                        break;
                    }
                    std::cmp::Ordering::Equal => outcome = outcome.min(0.5),
                    std::cmp::Ordering::Less => {}
                }
            }
            credit += outcome;
        }
        credit / self.samples as f64
    }

    /// Future streets make a call worth slightly more than raw pot odds say;
    /// the discount shrinks as streets run out.
    fn implied_odds_multiplier(phase: Phase) -> f64 {
        match phase {
            Phase::Preflop => 1.3,
            Phase::Flop => 1.2,
            Phase::Turn => 1.1,
            _ => 1.0,
        }
    }

    /// Positive for late position (acting close after the dealer sees more
    /// information pre-flop, the button closes every post-flop street).
    fn position_bonus(table: &Table, seat_no: usize) -> f64 {
        let in_hand: Vec<usize> = table
            .seats()
            .filter(|s| s.in_hand())
            .map(|s| s.seat_no)
            .collect();
        if in_hand.len() < 3 {
            return 0.0;
        }
        let dealer = table.dealer_seat();
        let max = table.max_seats();
        let distance = (seat_no + max - dealer) % max;
        let latest = in_hand
            .iter()
            .map(|&n| (n + max - dealer) % max)
            .max()
            .unwrap_or(0);
        if distance == latest {
            0.03
        } else {
            0.0
        }
    }

    /// Clamps a desired total bet to a legal raise, degrading to all-in or a
    /// call when the stack cannot cover a legal raise.
    fn raise_or_shove(table: &Table, seat: &Seat, desired_total: u32) -> PlayerAction {
        let max_target = seat.current_bet + seat.stack;
        let min_target = table.current_bet() + table.min_raise();
        if max_target <= min_target {
            // Cannot make a full raise: shove (a legal short all-in raise or
            // a capped call, the engine sorts out which).
            return PlayerAction::AllIn;
        }
        PlayerAction::RaiseTo(desired_total.clamp(min_target, max_target))
    }

    fn decide_inner(&mut self, table: &Table, seat_no: usize) -> PlayerAction {
        let Some(seat) = table.seat(seat_no) else {
            return PlayerAction::Fold;
        };
        if seat.hole_cards.len() != 2 {
            // Defensive: without cards there is nothing to evaluate.
            return if table.current_bet() == seat.current_bet {
                PlayerAction::Check
            } else {
                PlayerAction::Fold
            };
        }

        let hole = [seat.hole_cards[0], seat.hole_cards[1]];
        let community = table.community();
        let opponents = table
            .seats()
            .filter(|s| s.seat_no != seat_no && s.in_hand())
            .count();

        let mut strength = if community.is_empty() {
            f64::from(Self::preflop_score(hole) as u8) / 20.0
        } else {
            self.monte_carlo_equity(&seat.hole_cards, community, opponents)
        };

        strength += self.rng.random_range(-STRENGTH_JITTER..STRENGTH_JITTER);
        strength += Self::position_bonus(table, seat_no);
        strength = strength.clamp(0.0, 1.0);

        let to_call = table.current_bet().saturating_sub(seat.current_bet);
        let live_pot: u32 = table.pot() + table.seats().map(|s| s.current_bet).sum::<u32>();
        let pot_odds = if to_call == 0 {
            1.0
        } else {
            f64::from(live_pot) / f64::from(live_pot + to_call)
        };
        let required_equity =
            (1.0 - pot_odds) / Self::implied_odds_multiplier(table.phase());

        // Occasional bluff on a weak hand, so folds are not perfectly
        // predictable.
        let bluffing = strength < 0.3 && self.rng.random_bool(BLUFF_FREQUENCY);
        if bluffing {
            let target = table.current_bet() + table.min_raise().max(live_pot / 2);
            return Self::raise_or_shove(table, seat, target);
        }

        if strength > 0.85 {
            // Very strong: raise big.
            let target = table.current_bet() + table.min_raise().max(live_pot);
            return Self::raise_or_shove(table, seat, target);
        }

        if strength > 0.65 {
            // Strong: value-bet when unopened, otherwise call.
            if to_call == 0 {
                if table.current_bet() == 0 && seat.stack > 0 {
                    let target = table.min_raise().max(live_pot / 2);
                    return Self::raise_or_shove(table, seat, target);
                }
                return PlayerAction::Check;
            }
            if to_call >= seat.stack {
                return PlayerAction::AllIn;
            }
            return PlayerAction::Call;
        }

        if strength > 0.4 {
            // Medium: call when the price is right.
            if to_call == 0 {
                return PlayerAction::Check;
            }
            if strength >= required_equity && to_call < seat.stack {
                return PlayerAction::Call;
            }
            return PlayerAction::Fold;
        }

        // Weak: take free cards, fold to anything but the cheapest calls.
        if to_call == 0 {
            PlayerAction::Check
        } else if to_call <= table.config().big_blind && strength >= required_equity {
            PlayerAction::Call
        } else {
            PlayerAction::Fold
        }
    }
}

impl crate::DecisionAgent for HeuristicAgent {
    fn decide(&mut self, table: &Table, seat_no: usize) -> PlayerAction {
        self.decide_inner(table, seat_no)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
