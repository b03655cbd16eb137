use crate::cards::Card;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity seated at the table: a human user or a synthetic bot.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum PlayerId {
    Human(String),
    Bot(String),
}

impl PlayerId {
    pub fn is_human(&self) -> bool {
        matches!(self, PlayerId::Human(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlayerId::Human(id) | PlayerId::Bot(id) => id,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seat status over the life of a hand. `Waiting` and `Out` seats are not in
/// the current hand; `Folded` and `AllIn` seats are in the hand but can no
/// longer act.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Seated but not dealt into the current hand.
    Waiting,
    /// Dealt in and still able to act.
    Active,
    /// Forfeited the current hand.
    Folded,
    /// Entire stack wagered; in the hand but acts no further.
    AllIn,
    /// Busted (zero stack between hands).
    Out,
}

/// Player action taxonomy. `RaiseTo` carries the *total* bet the seat's
/// per-round bet should become, not the increment.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "amount")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    RaiseTo(u32),
    AllIn,
}

/// One seat slot in the table arena. The seat number is the stable identity
/// used for turn order; list position never matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub seat_no: usize,
    pub player: PlayerId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,
    /// Monotonic join ordinal; host succession picks the lowest among humans.
    #[serde(default)]
    pub joined_seq: u64,
    /// Chip stack behind (excludes chips already bet this round).
    pub stack: u32,
    /// Chips committed this betting round, not yet folded into the pot.
    pub current_bet: u32,
    /// Total chips committed this hand; drives side-pot layering.
    pub total_bet: u32,
    /// Exactly two cards while a hand is active, none otherwise.
    pub hole_cards: Vec<Card>,
    pub status: SeatStatus,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    /// Reset at every street and whenever another seat raises.
    pub has_acted: bool,
    pub last_action: Option<PlayerAction>,
}

impl Seat {
    pub fn new(seat_no: usize, player: PlayerId, name: impl Into<String>, stack: u32) -> Self {
        Self {
            seat_no,
            player,
            name: name.into(),
            avatar: None,
            joined_seq: 0,
            stack,
            current_bet: 0,
            total_bet: 0,
            hole_cards: Vec::new(),
            status: SeatStatus::Waiting,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            has_acted: false,
            last_action: None,
        }
    }

    /// Moves up to `amount` chips from the stack into the current bet and
    /// returns what was actually paid. Paying the whole stack flips the seat
    /// to all-in.
    pub fn commit(&mut self, amount: u32) -> u32 {
        let paid = amount.min(self.stack);
        self.stack -= paid;
        self.current_bet += paid;
        self.total_bet += paid;
        if self.stack == 0 && self.status == SeatStatus::Active {
            self.status = SeatStatus::AllIn;
        }
        paid
    }

    pub fn in_hand(&self) -> bool {
        matches!(self.status, SeatStatus::Active | SeatStatus::AllIn)
    }

    /// Clears per-hand fields ahead of a new deal.
    pub fn reset_for_hand(&mut self) {
        self.current_bet = 0;
        self.total_bet = 0;
        self.hole_cards.clear();
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.has_acted = false;
        self.last_action = None;
        self.status = if self.stack == 0 {
            SeatStatus::Out
        } else {
            SeatStatus::Waiting
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_is_capped_at_stack_and_flips_all_in() {
        let mut seat = Seat::new(0, PlayerId::Human("u1".into()), "Ann", 100);
        seat.status = SeatStatus::Active;
        assert_eq!(seat.commit(40), 40);
        assert_eq!(seat.stack, 60);
        assert_eq!(seat.status, SeatStatus::Active);
        assert_eq!(seat.commit(90), 60);
        assert_eq!(seat.stack, 0);
        assert_eq!(seat.current_bet, 100);
        assert_eq!(seat.total_bet, 100);
        assert_eq!(seat.status, SeatStatus::AllIn);
    }

    #[test]
    fn reset_marks_busted_seats_out() {
        let mut seat = Seat::new(2, PlayerId::Bot("b1".into()), "Bot 1", 0);
        seat.status = SeatStatus::Folded;
        seat.reset_for_hand();
        assert_eq!(seat.status, SeatStatus::Out);
    }
}
