//! Hand lifecycle: blind posting, street dealing, run-out and showdown.
//!
//! Betting-round completion itself is decided in [`crate::betting`]; this
//! module owns what happens once a round (or the whole hand) is over.

use std::collections::HashMap;

use crate::cards::Card;
use crate::errors::GameError;
use crate::hand::{compare_hands, evaluate_hand, HandStrength};
use crate::seat::SeatStatus;
use crate::table::{HandEvent, Phase, Table, Winner};

impl Table {
    /// Starts a new hand: rotates the dealer button, deals two hole cards to
    /// every seat with chips, posts blinds (capped at the payer's stack) and
    /// opens pre-flop betting.
    ///
    /// Heads-up the dealer posts the small blind and acts first pre-flop;
    /// with three or more players the blinds are the dealer's two left
    /// neighbors and the seat after the big blind acts first.
    pub fn start_hand(&mut self) -> Result<Vec<HandEvent>, GameError> {
        if !self.phase().hand_over() {
            return Err(GameError::HandInProgress);
        }
        let eligible: Vec<usize> = self
            .seats()
            .filter(|s| s.stack > 0)
            .map(|s| s.seat_no)
            .collect();
        if eligible.len() < 2 {
            return Err(GameError::NotEnoughPlayers {
                seated: eligible.len(),
            });
        }

        self.hand_no += 1;
        self.winners.clear();
        self.community.clear();
        self.pot = 0;
        self.deck.shuffle();

        let seat_nos: Vec<usize> = self.seats().map(|s| s.seat_no).collect();
        for &no in &seat_nos {
            let seat = self.seat_mut(no).expect("occupied seat");
            seat.reset_for_hand();
            if seat.stack > 0 {
                seat.status = SeatStatus::Active;
            }
        }

        let dealer = self
            .next_eligible_after(self.dealer_seat)
            .expect("at least two seats with chips");
        self.dealer_seat = dealer;
        if let Some(seat) = self.seat_mut(dealer) {
            seat.is_dealer = true;
        }

        let heads_up = eligible.len() == 2;
        let (small_blind_seat, big_blind_seat) = if heads_up {
            // Heads-up rule: the dealer is the small blind.
            let bb = self.next_eligible_after(dealer).expect("second seat");
            (dealer, bb)
        } else {
            let sb = self.next_eligible_after(dealer).expect("second seat");
            let bb = self.next_eligible_after(sb).expect("third seat");
            (sb, bb)
        };

        // Two passes of one card each, starting left of the dealer.
        let first = self
            .next_active_after(dealer)
            .expect("active seats were just marked");
        let mut order = vec![first];
        let mut no = first;
        loop {
            no = self.next_active_after(no).expect("active seats remain");
            if no == first {
                break;
            }
            order.push(no);
        }
        for _ in 0..2 {
            for &n in &order {
                let card = self.deck.deal_card().ok_or(GameError::DeckExhausted {
                    requested: 1,
                    remaining: 0,
                })?;
                self.seat_mut(n).expect("active seat").hole_cards.push(card);
            }
        }

        let sb_amount = self.config().small_blind;
        let bb_amount = self.config().big_blind;
        {
            let seat = self.seat_mut(small_blind_seat).expect("blind seat");
            seat.is_small_blind = true;
            seat.commit(sb_amount);
        }
        {
            let seat = self.seat_mut(big_blind_seat).expect("blind seat");
            seat.is_big_blind = true;
            seat.commit(bb_amount);
        }

        self.current_bet = bb_amount;
        self.min_raise = bb_amount;
        self.phase = Phase::Preflop;

        // First to act, skipping seats the blinds already put all-in.
        self.current_seat = if heads_up {
            match self.seat(small_blind_seat).map(|s| s.status) {
                Some(SeatStatus::Active) => Some(small_blind_seat),
                _ => self.next_active_after(small_blind_seat),
            }
        } else {
            self.next_active_after(big_blind_seat)
        };

        let mut events = vec![HandEvent::HandStarted {
            hand_no: self.hand_no,
            dealer,
        }];

        // Blinds can leave nobody (or only one seat) able to act voluntarily.
        if self.betting_round_complete() {
            events.extend(self.finish_betting_round()?);
        }
        Ok(events)
    }

    /// Folds every live bet into the pot at the end of a betting round.
    pub(crate) fn collect_bets(&mut self) {
        let seat_nos: Vec<usize> = self.seats().map(|s| s.seat_no).collect();
        for no in seat_nos {
            let seat = self.seat_mut(no).expect("occupied seat");
            let bet = seat.current_bet;
            seat.current_bet = 0;
            self.pot += bet;
        }
    }

    /// Runs after the betting engine detects round completion: collects bets,
    /// then either deals the next street, runs the board out to showdown when
    /// at most one seat can still act voluntarily, or reaches showdown at the
    /// river.
    pub(crate) fn finish_betting_round(&mut self) -> Result<Vec<HandEvent>, GameError> {
        self.collect_bets();

        let mut events = Vec::new();
        if self.phase == Phase::River || self.active_count() <= 1 {
            events.extend(self.run_out_board()?);
            events.push(self.showdown());
            return Ok(events);
        }

        let (next_phase, count) = match self.phase {
            Phase::Preflop => (Phase::Flop, 3),
            Phase::Flop => (Phase::Turn, 1),
            Phase::Turn => (Phase::River, 1),
            other => unreachable!("finish_betting_round in {:?}", other),
        };
        let cards = self.deck.deal(count)?;
        self.community.extend_from_slice(&cards);
        self.phase = next_phase;
        events.push(HandEvent::StreetDealt {
            phase: next_phase,
            cards,
        });

        self.begin_betting_round();
        Ok(events)
    }

    /// Per-round resets: betting level back to zero, min-raise back to the
    /// big blind, every still-active seat owes a fresh decision. First to act
    /// post-flop is the first active seat left of the dealer.
    fn begin_betting_round(&mut self) {
        self.current_bet = 0;
        self.min_raise = self.config().big_blind;
        let seat_nos: Vec<usize> = self.seats().map(|s| s.seat_no).collect();
        for no in seat_nos {
            let seat = self.seat_mut(no).expect("occupied seat");
            if seat.status == SeatStatus::Active {
                seat.has_acted = false;
            }
        }
        self.current_seat = self.next_active_after(self.dealer_seat);
    }

    /// Deals any community cards still missing, street by street, without
    /// intervening betting rounds.
    fn run_out_board(&mut self) -> Result<Vec<HandEvent>, GameError> {
        let mut events = Vec::new();
        while self.community.len() < 5 {
            let (phase, count) = match self.community.len() {
                0 => (Phase::Flop, 3),
                3 => (Phase::Turn, 1),
                _ => (Phase::River, 1),
            };
            let cards = self.deck.deal(count)?;
            self.community.extend_from_slice(&cards);
            events.push(HandEvent::StreetDealt { phase, cards });
        }
        Ok(events)
    }

    /// Compares every non-folded hand and distributes the pot, splitting side
    /// pots by contribution level: a seat only contests chips it matched.
    /// Folded (and departed) contributions above the highest live level are
    /// folded into the last pot so no chip is lost.
    pub(crate) fn showdown(&mut self) -> HandEvent {
        self.collect_bets();

        let contenders: Vec<usize> = self
            .seats()
            .filter(|s| s.in_hand())
            .map(|s| s.seat_no)
            .collect();

        let mut strengths: HashMap<usize, HandStrength> = HashMap::new();
        for &no in &contenders {
            let seat = self.seat(no).expect("contender seat");
            let mut cards: Vec<Card> = seat.hole_cards.clone();
            cards.extend_from_slice(self.community());
            strengths.insert(no, evaluate_hand(&cards));
        }

        let mut levels: Vec<u32> = contenders
            .iter()
            .map(|&no| self.seat(no).expect("contender").total_bet)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<(u32, Vec<usize>)> = Vec::new();
        let mut prev = 0u32;
        for &level in &levels {
            let amount: u32 = self
                .seats()
                .map(|s| s.total_bet.min(level).saturating_sub(prev))
                .sum();
            let eligible: Vec<usize> = contenders
                .iter()
                .copied()
                .filter(|&no| self.seat(no).expect("contender").total_bet >= level)
                .collect();
            pots.push((amount, eligible));
            prev = level;
        }
        let distributed: u32 = pots.iter().map(|(a, _)| a).sum();
        if let Some(last) = pots.last_mut() {
            last.0 += self.pot.saturating_sub(distributed);
        }

        let mut awards: HashMap<usize, u32> = HashMap::new();
        for (amount, eligible) in pots {
            if amount == 0 || eligible.is_empty() {
                continue;
            }
            let best = eligible
                .iter()
                .map(|no| &strengths[no])
                .max_by(|a, b| compare_hands(a, b))
                .expect("non-empty eligible set")
                .clone();
            let mut winners: Vec<usize> = eligible
                .into_iter()
                .filter(|no| compare_hands(&strengths[no], &best).is_eq())
                .collect();
            winners.sort_unstable();
            let share = amount / winners.len() as u32;
            let remainder = amount % winners.len() as u32;
            for (i, no) in winners.iter().enumerate() {
                let mut credit = share;
                if i == 0 {
                    credit += remainder; // odd chip to the lowest seat
                }
                *awards.entry(*no).or_insert(0) += credit;
            }
        }

        let mut winners: Vec<Winner> = Vec::new();
        let mut seat_nos: Vec<usize> = awards.keys().copied().collect();
        seat_nos.sort_unstable();
        for no in seat_nos {
            let amount = awards[&no];
            let seat = self.seat_mut(no).expect("winner seat");
            seat.stack += amount;
            winners.push(Winner {
                seat_no: no,
                amount,
                description: Some(strengths[&no].describe()),
            });
        }

        self.pot = 0;
        self.winners = winners.clone();
        self.current_seat = None;
        self.phase = Phase::Showdown;
        HandEvent::ShowdownReached { winners }
    }

    /// Early finish: all but one seat folded. The survivor takes the whole
    /// pot without a showdown and no further community cards are dealt.
    pub(crate) fn settle_if_single_survivor(&mut self) -> Option<HandEvent> {
        if !self.phase.is_betting() || self.in_hand_count() != 1 {
            return None;
        }
        self.collect_bets();
        let survivor = self
            .seats()
            .find(|s| s.in_hand())
            .map(|s| s.seat_no)
            .expect("exactly one survivor");
        let amount = self.pot;
        self.pot = 0;
        let seat = self.seat_mut(survivor).expect("survivor seat");
        seat.stack += amount;
        let winners = vec![Winner {
            seat_no: survivor,
            amount,
            description: None,
        }];
        self.winners = winners.clone();
        self.current_seat = None;
        self.phase = Phase::Finished;
        Some(HandEvent::HandFinished { winners })
    }
}
