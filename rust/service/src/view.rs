//! Client-facing projections of table state.
//!
//! The engine's [`Table`] holds everything, including every seat's hole
//! cards and the deck order. Nothing in this module ever serializes the
//! deck, and hole cards are disclosed only to their owner until showdown.

use cardroom_engine::cards::Card;
use cardroom_engine::seat::{PlayerAction, PlayerId, SeatStatus};
use cardroom_engine::table::{Phase, Table, Winner};
use serde::{Deserialize, Serialize};

use crate::lobby::TableId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_no: usize,
    pub player: PlayerId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,
    pub stack: u32,
    pub current_bet: u32,
    pub total_bet: u32,
    pub status: SeatStatus,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_action: Option<PlayerAction>,
    /// Present for the viewer's own seat, and for every contesting seat
    /// once the hand reaches showdown.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hole_cards: Option<Vec<Card>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableView {
    pub id: TableId,
    pub name: String,
    pub host: PlayerId,
    pub phase: Phase,
    pub hand_no: u64,
    pub pot: u32,
    pub current_bet: u32,
    pub min_raise: u32,
    pub current_seat: Option<usize>,
    pub dealer_seat: usize,
    pub small_blind: u32,
    pub big_blind: u32,
    pub max_seats: usize,
    pub community: Vec<Card>,
    pub winners: Vec<Winner>,
    pub seats: Vec<SeatView>,
}

/// Lobby listing line. Carries enough to pick a table, nothing about the
/// hand in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
    pub phase: Phase,
    pub player_count: usize,
    pub human_count: usize,
    pub max_seats: usize,
    pub small_blind: u32,
    pub big_blind: u32,
}

/// Projects a table for one viewer. `viewer` is the requesting player id;
/// `None` renders the spectator view.
pub fn sanitized_view(id: &TableId, name: &str, table: &Table, viewer: Option<&str>) -> TableView {
    let at_showdown = table.phase() == Phase::Showdown;
    let seats = table
        .seats()
        .map(|seat| {
            let own = viewer.is_some_and(|v| seat.player.as_str() == v);
            let revealed = at_showdown && seat.in_hand();
            let hole_cards = if (own || revealed) && !seat.hole_cards.is_empty() {
                Some(seat.hole_cards.clone())
            } else {
                None
            };
            SeatView {
                seat_no: seat.seat_no,
                player: seat.player.clone(),
                name: seat.name.clone(),
                avatar: seat.avatar.clone(),
                stack: seat.stack,
                current_bet: seat.current_bet,
                total_bet: seat.total_bet,
                status: seat.status,
                is_dealer: seat.is_dealer,
                is_small_blind: seat.is_small_blind,
                is_big_blind: seat.is_big_blind,
                last_action: seat.last_action,
                hole_cards,
            }
        })
        .collect();

    TableView {
        id: id.clone(),
        name: name.to_string(),
        host: table.host().clone(),
        phase: table.phase(),
        hand_no: table.hand_no(),
        pot: table.pot(),
        current_bet: table.current_bet(),
        min_raise: table.min_raise(),
        current_seat: table.current_seat(),
        dealer_seat: table.dealer_seat(),
        small_blind: table.config().small_blind,
        big_blind: table.config().big_blind,
        max_seats: table.max_seats(),
        community: table.community().to_vec(),
        winners: table.winners().to_vec(),
        seats,
    }
}

pub fn summary(id: &TableId, name: &str, table: &Table) -> TableSummary {
    TableSummary {
        id: id.clone(),
        name: name.to_string(),
        phase: table.phase(),
        player_count: table.seat_count(),
        human_count: table.human_count(),
        max_seats: table.max_seats(),
        small_blind: table.config().small_blind,
        big_blind: table.config().big_blind,
    }
}
