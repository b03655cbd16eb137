use crate::seat::SeatStatus;
use thiserror::Error;

/// Error taxonomy for every engine operation. All variants are raised
/// synchronously before any mutation, so a rejected call leaves the table
/// untouched; none are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("no seat for player {player_id}")]
    SeatNotFound { player_id: String },
    #[error("seat {seat_no} is empty")]
    SeatEmpty { seat_no: usize },
    #[error("it's not seat {seat}'s turn (expected seat {expected})")]
    NotYourTurn { seat: usize, expected: usize },
    #[error("seat {seat} cannot act in state {status:?}")]
    CannotAct { seat: usize, status: SeatStatus },
    #[error("cannot check: {to_call} chips owed")]
    CheckFacingBet { to_call: u32 },
    #[error("nothing to call")]
    NothingToCall,
    #[error("raise to {target} is below minimum {minimum}")]
    RaiseBelowMinimum { target: u32, minimum: u32 },
    #[error("table is full ({max_seats} seats)")]
    TableFull { max_seats: usize },
    #[error("need at least 2 seated players to start a hand, have {seated}")]
    NotEnoughPlayers { seated: usize },
    #[error("a hand is already in progress")]
    HandInProgress,
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("deck exhausted: requested {requested}, remaining {remaining}")]
    DeckExhausted { requested: usize, remaining: usize },
}
