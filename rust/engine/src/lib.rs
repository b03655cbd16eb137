//! # cardroom-engine: Multiplayer Texas Hold'em Core
//!
//! The card-game engine behind the cardroom service: a Texas Hold'em state
//! machine for 2–6 seats with betting-round resolution, a seven-card hand
//! evaluator, side-pot-aware pot accounting and table/seat lifecycle.
//! Deterministic when given a deck seed, which makes full hands reproducible
//! in tests.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and deck construction
//! - [`deck`] - Deterministic deck shuffling with a seeded ChaCha20 RNG
//! - [`hand`] - Hand evaluation and total-ordered strength comparison
//! - [`seat`] - Seat slots, player identity, statuses and the action taxonomy
//! - [`table`] - The shared table state and seat arena
//! - [`betting`] - Action validation, chip movement and turn sequencing
//! - [`round`] - Hand lifecycle: blinds, streets, run-out and showdown
//! - [`history`] - Per-hand records and JSONL persistence
//! - [`errors`] - Error taxonomy for every engine operation
//!
//! ## Quick Start
//!
//! ```rust
//! use cardroom_engine::seat::{PlayerAction, PlayerId};
//! use cardroom_engine::table::{Table, TableConfig};
//!
//! let config = TableConfig {
//!     seed: Some(42),
//!     ..TableConfig::default()
//! };
//! let mut table = Table::new(config, PlayerId::Human("u1".into()), "Ann");
//! table
//!     .seat_player(PlayerId::Human("u2".into()), "Ben", None)
//!     .unwrap();
//! table.start_hand().unwrap();
//!
//! let seat = table.current_seat().expect("someone is first to act");
//! table.apply_action(seat, PlayerAction::Call).unwrap();
//! ```
//!
//! Every public operation is a synchronous read-modify-write transform on
//! one table value; the engine has no interior threading. The service crate
//! serializes access by running one actor task per table.

pub mod betting;
pub mod cards;
pub mod deck;
pub mod errors;
pub mod hand;
pub mod history;
pub mod round;
pub mod seat;
pub mod table;
