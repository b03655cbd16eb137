//! Betting engine: validates one seat's action against the table state,
//! applies the chip movement and advances or holds the turn pointer.
//!
//! Every precondition is checked before any mutation; a rejected action is a
//! strict no-op on the table.

use crate::errors::GameError;
use crate::seat::{PlayerAction, SeatStatus};
use crate::table::{HandEvent, Table};

impl Table {
    /// Applies `action` for the seat at `seat_no`.
    ///
    /// Precondition order (each a distinct error): a betting round must be in
    /// progress, the seat must exist, it must hold the turn, and it must be
    /// `Active`. Per-action legality is then enforced:
    ///
    /// - `Check` only when nothing is owed.
    /// - `Call` only when something is owed; a short stack calls for less and
    ///   goes all-in.
    /// - `RaiseTo(target)` names the *total* per-round bet; it must reach
    ///   `current_bet + min_raise` unless the seat is shoving its entire
    ///   stack (a legal short all-in raise). Any raise re-opens the action:
    ///   every other active seat's `has_acted` flips back to false.
    /// - `AllIn` shoves the whole stack; it counts as a raise when it exceeds
    ///   the current bet, otherwise as a capped call.
    /// - `Fold` is always legal while active.
    pub fn apply_action(
        &mut self,
        seat_no: usize,
        action: PlayerAction,
    ) -> Result<Vec<HandEvent>, GameError> {
        if !self.phase().is_betting() {
            return Err(GameError::NoHandInProgress);
        }
        let seat = self
            .seat(seat_no)
            .ok_or(GameError::SeatEmpty { seat_no })?;
        let expected = self.current_seat().ok_or(GameError::NoHandInProgress)?;
        if expected != seat_no {
            return Err(GameError::NotYourTurn {
                seat: seat_no,
                expected,
            });
        }
        if seat.status != SeatStatus::Active {
            return Err(GameError::CannotAct {
                seat: seat_no,
                status: seat.status,
            });
        }

        let seat_bet = seat.current_bet;
        let seat_stack = seat.stack;
        let table_bet = self.current_bet();
        let owed = table_bet.saturating_sub(seat_bet);

        // Legality checks, still before any mutation.
        match action {
            PlayerAction::Check if owed != 0 => {
                return Err(GameError::CheckFacingBet { to_call: owed });
            }
            PlayerAction::Call if owed == 0 => {
                return Err(GameError::NothingToCall);
            }
            PlayerAction::RaiseTo(target) => {
                let max_target = seat_bet + seat_stack;
                let min_target = table_bet + self.min_raise();
                let effective = target.min(max_target);
                let is_full_shove = effective == max_target;
                if effective <= table_bet || (effective < min_target && !is_full_shove) {
                    return Err(GameError::RaiseBelowMinimum {
                        target,
                        minimum: min_target,
                    });
                }
            }
            _ => {}
        }

        match action {
            PlayerAction::Fold => {
                let seat = self.seat_mut(seat_no).expect("seat checked above");
                seat.status = SeatStatus::Folded;
            }
            PlayerAction::Check => {}
            PlayerAction::Call => {
                let seat = self.seat_mut(seat_no).expect("seat checked above");
                seat.commit(owed);
            }
            PlayerAction::RaiseTo(target) => {
                let effective = target.min(seat_bet + seat_stack);
                let seat = self.seat_mut(seat_no).expect("seat checked above");
                seat.commit(effective - seat_bet);
                self.register_bet_level(seat_no);
            }
            PlayerAction::AllIn => {
                let seat = self.seat_mut(seat_no).expect("seat checked above");
                seat.commit(seat_stack);
                if seat_bet + seat_stack > table_bet {
                    self.register_bet_level(seat_no);
                }
            }
        }

        {
            let seat = self.seat_mut(seat_no).expect("seat checked above");
            seat.has_acted = true;
            seat.last_action = Some(action);
        }

        let mut events = vec![HandEvent::ActionApplied { seat_no, action }];

        if let Some(event) = self.settle_if_single_survivor() {
            events.push(event);
        } else if self.betting_round_complete() {
            events.extend(self.finish_betting_round()?);
        } else {
            // Hand the turn to the next active seat; if none exists the last
            // acted seat retains the pointer.
            if let Some(next) = self.next_active_after(seat_no) {
                self.current_seat = Some(next);
            }
        }

        Ok(events)
    }

    /// Records that `seat_no`'s bet raised the table's betting level: grows
    /// the current bet and the minimum raise, and makes every other active
    /// seat respond again.
    fn register_bet_level(&mut self, seat_no: usize) {
        let new_bet = self
            .seat(seat_no)
            .map(|s| s.current_bet)
            .expect("raiser seat");
        let delta = new_bet.saturating_sub(self.current_bet());
        if delta == 0 {
            return;
        }
        self.min_raise = self.min_raise.max(delta);
        self.current_bet = new_bet;

        let others: Vec<usize> = self
            .seats()
            .filter(|s| s.seat_no != seat_no && s.status == SeatStatus::Active)
            .map(|s| s.seat_no)
            .collect();
        for no in others {
            self.seat_mut(no).expect("active seat").has_acted = false;
        }
    }

    /// A betting round is complete iff every active seat has acted this
    /// round *and* matches the table bet. One seat yet to respond to a raise
    /// keeps the round open. Vacuously true when nobody can act voluntarily.
    pub(crate) fn betting_round_complete(&self) -> bool {
        self.seats()
            .filter(|s| s.status == SeatStatus::Active)
            .all(|s| s.has_acted && s.current_bet == self.current_bet())
    }
}
