use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::deck::Deck;
use crate::errors::GameError;
use crate::seat::{PlayerId, Seat, SeatStatus};

/// Largest supported table. 6 seats keeps the dealing arithmetic
/// (2 × seats + 5 = 17 cards) far below the 52-card deck.
pub const MAX_SEATS: usize = 6;

/// Default chips a seat buys in with.
pub const DEFAULT_STACK: u32 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub max_seats: usize,
    pub small_blind: u32,
    pub big_blind: u32,
    pub starting_stack: u32,
    /// Deck seed. Fixing it makes every deal of the table reproducible.
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_seats: MAX_SEATS,
            small_blind: 10,
            big_blind: 20,
            starting_stack: DEFAULT_STACK,
            seed: None,
        }
    }
}

/// Hand lifecycle phase. `Finished` is reached directly from any betting
/// phase when a single non-folded seat remains; `Showdown` is the terminal
/// phase of a contested hand. Both admit starting the next hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl Phase {
    pub fn is_betting(self) -> bool {
        matches!(self, Phase::Preflop | Phase::Flop | Phase::Turn | Phase::River)
    }

    pub fn hand_over(self) -> bool {
        matches!(self, Phase::Waiting | Phase::Showdown | Phase::Finished)
    }
}

/// Pot award recorded at hand end.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    pub seat_no: usize,
    pub amount: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// State transition notifications returned by the mutating operations, in
/// the order they occurred. The service layer fans these out to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandEvent {
    HandStarted { hand_no: u64, dealer: usize },
    ActionApplied { seat_no: usize, action: crate::seat::PlayerAction },
    StreetDealt { phase: Phase, cards: Vec<Card> },
    ShowdownReached { winners: Vec<Winner> },
    HandFinished { winners: Vec<Winner> },
}

/// Outcome of a seat leaving the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub seat_no: usize,
    /// Chips the departing player takes with them.
    pub cashed_out: u32,
    pub new_host: Option<PlayerId>,
    /// True when no human seats remain; the caller destroys the table.
    pub destroy: bool,
}

/// One poker table: a fixed arena of seat slots plus the shared hand state.
/// Every public operation is a synchronous read-modify-write transform; the
/// caller is responsible for serializing access (one actor per table).
#[derive(Debug, Clone)]
pub struct Table {
    config: TableConfig,
    /// Seat arena addressed by stable seat number; `None` slots are free.
    seats: Vec<Option<Seat>>,
    host: PlayerId,
    pub(crate) community: Vec<Card>,
    pub(crate) pot: u32,
    pub(crate) current_bet: u32,
    pub(crate) min_raise: u32,
    pub(crate) current_seat: Option<usize>,
    pub(crate) dealer_seat: usize,
    pub(crate) phase: Phase,
    pub(crate) hand_no: u64,
    pub(crate) winners: Vec<Winner>,
    pub(crate) deck: Deck,
    join_seq: u64,
}

impl Table {
    /// Creates a table with the host seated at slot 0, phase `Waiting`.
    /// Degenerate config values are clamped: the big blind floors the
    /// minimum raise and must stay positive, the small blind never exceeds
    /// it, and every buy-in covers at least one big blind.
    pub fn new(mut config: TableConfig, host: PlayerId, host_name: impl Into<String>) -> Self {
        config.max_seats = config.max_seats.clamp(2, MAX_SEATS);
        config.big_blind = config.big_blind.max(1);
        config.small_blind = config.small_blind.clamp(1, config.big_blind);
        config.starting_stack = config.starting_stack.max(config.big_blind);
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut seats = vec![None; config.max_seats];
        let mut host_seat = Seat::new(0, host.clone(), host_name, config.starting_stack);
        host_seat.joined_seq = 0;
        seats[0] = Some(host_seat);
        Self {
            config,
            seats,
            host,
            community: Vec::with_capacity(5),
            pot: 0,
            current_bet: 0,
            min_raise: 0,
            current_seat: None,
            dealer_seat: 0,
            phase: Phase::Waiting,
            hand_no: 0,
            winners: Vec::new(),
            deck: Deck::new_with_seed(seed),
            join_seq: 1,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pot(&self) -> u32 {
        self.pot
    }

    pub fn current_bet(&self) -> u32 {
        self.current_bet
    }

    pub fn min_raise(&self) -> u32 {
        self.min_raise
    }

    pub fn current_seat(&self) -> Option<usize> {
        self.current_seat
    }

    pub fn dealer_seat(&self) -> usize {
        self.dealer_seat
    }

    pub fn hand_no(&self) -> u64 {
        self.hand_no
    }

    pub fn community(&self) -> &[Card] {
        &self.community
    }

    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    pub fn max_seats(&self) -> usize {
        self.seats.len()
    }

    pub fn seat(&self, seat_no: usize) -> Option<&Seat> {
        self.seats.get(seat_no).and_then(|s| s.as_ref())
    }

    pub(crate) fn seat_mut(&mut self, seat_no: usize) -> Option<&mut Seat> {
        self.seats.get_mut(seat_no).and_then(|s| s.as_mut())
    }

    /// Occupied seats in seat-number order.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter_map(|s| s.as_ref())
    }

    pub fn seat_count(&self) -> usize {
        self.seats().count()
    }

    pub fn human_count(&self) -> usize {
        self.seats().filter(|s| s.player.is_human()).count()
    }

    pub fn seat_of(&self, player_id: &str) -> Option<&Seat> {
        self.seats().find(|s| s.player.as_str() == player_id)
    }

    /// Seats an identity at the first free slot. Re-joining an already seated
    /// player is an idempotent no-op returning the existing seat number.
    pub fn seat_player(
        &mut self,
        player: PlayerId,
        name: impl Into<String>,
        avatar: Option<String>,
    ) -> Result<usize, GameError> {
        if let Some(existing) = self.seat_of(player.as_str()) {
            return Ok(existing.seat_no);
        }
        if !self.phase.hand_over() {
            return Err(GameError::HandInProgress);
        }
        let slot = self
            .seats
            .iter()
            .position(|s| s.is_none())
            .ok_or(GameError::TableFull {
                max_seats: self.seats.len(),
            })?;
        let mut seat = Seat::new(slot, player, name, self.config.starting_stack);
        seat.avatar = avatar;
        seat.joined_seq = self.join_seq;
        self.join_seq += 1;
        self.seats[slot] = Some(seat);
        Ok(slot)
    }

    /// Removes a player's seat. Chips committed to the current hand stay in
    /// the pot; the stack leaves with the player. Transfers the host role to
    /// the next-joined human when the host leaves, and reports `destroy` when
    /// no human seats remain.
    pub fn vacate(&mut self, player_id: &str) -> Result<(LeaveOutcome, Vec<HandEvent>), GameError> {
        let seat_no = self
            .seat_of(player_id)
            .map(|s| s.seat_no)
            .ok_or_else(|| GameError::SeatNotFound {
                player_id: player_id.to_string(),
            })?;

        let mut events = Vec::new();
        let was_in_hand = self.seat(seat_no).is_some_and(|s| s.in_hand());
        if self.phase.is_betting() && was_in_hand {
            // Treat the departure as a fold; the bet already on the felt is
            // forfeited to the pot.
            let seat = self.seat_mut(seat_no).expect("seat checked above");
            let forfeited = seat.current_bet;
            seat.current_bet = 0;
            seat.status = SeatStatus::Folded;
            self.pot += forfeited;
            if self.current_seat == Some(seat_no) {
                self.current_seat = self.next_active_after(seat_no);
            }
            if let Some(event) = self.settle_if_single_survivor() {
                events.push(event);
            } else if self.betting_round_complete() {
                events.extend(self.finish_betting_round()?);
            }
        }

        let seat = self.seats[seat_no].take().expect("seat checked above");
        let cashed_out = seat.stack;
        let was_host = self.host.as_str() == player_id;

        let new_host = if was_host {
            let successor = self
                .seats()
                .filter(|s| s.player.is_human())
                .min_by_key(|s| s.joined_seq)
                .map(|s| s.player.clone());
            if let Some(h) = &successor {
                self.host = h.clone();
            }
            successor
        } else {
            None
        };

        let destroy = self.human_count() == 0;
        Ok((
            LeaveOutcome {
                seat_no,
                cashed_out,
                new_host,
                destroy,
            },
            events,
        ))
    }

    /// Next occupied seat strictly after `seat_no`, wrapping around.
    pub(crate) fn next_occupied_after(&self, seat_no: usize) -> Option<usize> {
        let len = self.seats.len();
        (1..=len)
            .map(|i| (seat_no + i) % len)
            .find(|&n| self.seats[n].is_some())
    }

    /// Next seat with status `Active` strictly after `seat_no`, wrapping.
    pub(crate) fn next_active_after(&self, seat_no: usize) -> Option<usize> {
        let len = self.seats.len();
        (1..=len).map(|i| (seat_no + i) % len).find(|&n| {
            self.seats[n]
                .as_ref()
                .is_some_and(|s| s.status == SeatStatus::Active)
        })
    }

    /// Next seat eligible to be dealt in (occupied, chips behind), wrapping.
    pub(crate) fn next_eligible_after(&self, seat_no: usize) -> Option<usize> {
        let len = self.seats.len();
        (1..=len)
            .map(|i| (seat_no + i) % len)
            .find(|&n| self.seats[n].as_ref().is_some_and(|s| s.stack > 0))
    }

    pub(crate) fn active_count(&self) -> usize {
        self.seats()
            .filter(|s| s.status == SeatStatus::Active)
            .count()
    }

    pub(crate) fn in_hand_count(&self) -> usize {
        self.seats().filter(|s| s.in_hand()).count()
    }

    /// Adjusts a seat's stack between hands (re-buys and short buy-ins).
    /// Rejected while a hand is running so chip conservation stays checkable
    /// within a hand.
    pub fn set_stack(&mut self, seat_no: usize, stack: u32) -> Result<(), GameError> {
        if !self.phase.hand_over() {
            return Err(GameError::HandInProgress);
        }
        let seat = self
            .seat_mut(seat_no)
            .ok_or(GameError::SeatEmpty { seat_no })?;
        seat.stack = stack;
        Ok(())
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    /// Total chips observable at the table: stacks, live bets and the pot.
    /// Constant across every operation except seat/vacate (buy-in/cash-out).
    pub fn total_chips(&self) -> u32 {
        self.pot
            + self
                .seats()
                .map(|s| s.stack + s.current_bet)
                .sum::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human(id: &str) -> PlayerId {
        PlayerId::Human(id.to_string())
    }

    #[test]
    fn host_is_seated_on_create() {
        let table = Table::new(TableConfig::default(), human("u1"), "Ann");
        assert_eq!(table.seat_count(), 1);
        assert_eq!(table.host().as_str(), "u1");
        assert_eq!(table.seat(0).unwrap().player.as_str(), "u1");
        assert_eq!(table.phase(), Phase::Waiting);
    }

    #[test]
    fn join_is_idempotent_for_seated_player() {
        let mut table = Table::new(TableConfig::default(), human("u1"), "Ann");
        let first = table.seat_player(human("u2"), "Ben", None).unwrap();
        let again = table.seat_player(human("u2"), "Ben", None).unwrap();
        assert_eq!(first, again);
        assert_eq!(table.seat_count(), 2);
    }

    #[test]
    fn degenerate_config_is_clamped_to_playable_values() {
        let config = TableConfig {
            max_seats: 0,
            small_blind: 0,
            big_blind: 0,
            starting_stack: 0,
            seed: Some(11),
        };
        let table = Table::new(config, human("u1"), "Ann");
        assert_eq!(table.config().max_seats, 2);
        assert_eq!(table.config().big_blind, 1);
        assert_eq!(table.config().small_blind, 1);
        assert_eq!(table.config().starting_stack, 1);
    }

    #[test]
    fn zero_blind_config_still_yields_a_positive_min_raise() {
        let config = TableConfig {
            small_blind: 0,
            big_blind: 0,
            seed: Some(12),
            ..TableConfig::default()
        };
        let mut table = Table::new(config, human("u1"), "Ann");
        table.seat_player(human("u2"), "Ben", None).unwrap();
        table.start_hand().unwrap();
        assert_eq!(table.phase(), Phase::Preflop);
        assert!(table.min_raise() > 0, "big blind floors the minimum raise");
        assert!(table.current_bet() > 0);
    }

    #[test]
    fn small_blind_never_exceeds_big_blind() {
        let config = TableConfig {
            small_blind: 500,
            big_blind: 20,
            ..TableConfig::default()
        };
        let table = Table::new(config, human("u1"), "Ann");
        assert_eq!(table.config().small_blind, 20);
        assert_eq!(table.config().big_blind, 20);
    }

    #[test]
    fn join_fails_when_full() {
        let config = TableConfig {
            max_seats: 2,
            ..TableConfig::default()
        };
        let mut table = Table::new(config, human("u1"), "Ann");
        table.seat_player(human("u2"), "Ben", None).unwrap();
        let err = table.seat_player(human("u3"), "Cam", None).unwrap_err();
        assert_eq!(err, GameError::TableFull { max_seats: 2 });
    }

    #[test]
    fn host_transfers_to_next_joined_human() {
        let mut table = Table::new(TableConfig::default(), human("u1"), "Ann");
        table.seat_player(human("u2"), "Ben", None).unwrap();
        table.seat_player(human("u3"), "Cam", None).unwrap();
        let (outcome, _) = table.vacate("u1").unwrap();
        assert_eq!(outcome.new_host, Some(human("u2")));
        assert!(!outcome.destroy);
        assert_eq!(table.host().as_str(), "u2");
    }

    #[test]
    fn table_destroyed_when_no_humans_remain() {
        let mut table = Table::new(TableConfig::default(), human("u1"), "Ann");
        table
            .seat_player(PlayerId::Bot("b1".into()), "Bot 1", None)
            .unwrap();
        let (outcome, _) = table.vacate("u1").unwrap();
        assert!(outcome.destroy);
    }

    #[test]
    fn vacated_seat_slot_is_reusable() {
        let mut table = Table::new(TableConfig::default(), human("u1"), "Ann");
        table.seat_player(human("u2"), "Ben", None).unwrap();
        table.vacate("u2").unwrap();
        let slot = table.seat_player(human("u3"), "Cam", None).unwrap();
        assert_eq!(slot, 1, "freed slot is handed out again");
    }
}
