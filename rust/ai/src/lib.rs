//! # cardroom-ai: Decision Agents for Non-Human Seats
//!
//! Produces one action for a bot seat from the full table state: a pre-flop
//! heuristic score plus a post-flop Monte-Carlo win-probability estimate,
//! combined with pot odds and controlled randomization.
//!
//! Agents carry their own seeded RNG ([`rand_chacha::ChaCha20Rng`]) so bot
//! play is reproducible in tests while staying non-deterministic in feel.
//!
//! ```rust
//! use cardroom_ai::{create_agent, DecisionAgent};
//! use cardroom_engine::seat::PlayerId;
//! use cardroom_engine::table::{Table, TableConfig};
//!
//! let config = TableConfig { seed: Some(7), ..TableConfig::default() };
//! let mut table = Table::new(config, PlayerId::Human("u1".into()), "Ann");
//! table.seat_player(PlayerId::Bot("b1".into()), "Bot 1", None).unwrap();
//! table.start_hand().unwrap();
//!
//! let mut agent = create_agent("heuristic", 99);
//! let seat = table.current_seat().unwrap();
//! let action = agent.decide(&table, seat);
//! ```

use cardroom_engine::seat::PlayerAction;
use cardroom_engine::table::Table;

pub mod heuristic;

pub use heuristic::HeuristicAgent;

/// Interface for anything that can play a seat. `decide` takes `&mut self`
/// because agents consume randomness.
pub trait DecisionAgent: Send {
    /// Produce one action for the seat at `seat_no`. The returned action is
    /// always legal for the given table state.
    fn decide(&mut self, table: &Table, seat_no: usize) -> PlayerAction;

    fn name(&self) -> &str;
}

/// Factory for agents by kind string. `"heuristic"` is the only kind today;
/// unknown kinds fall back to it rather than failing a live table.
pub fn create_agent(kind: &str, seed: u64) -> Box<dyn DecisionAgent> {
    match kind {
        "heuristic" => Box::new(HeuristicAgent::new(seed)),
        _ => Box::new(HeuristicAgent::new(seed)),
    }
}
