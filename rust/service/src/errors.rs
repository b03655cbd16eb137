use cardroom_engine::errors::GameError;
use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::lobby::TableId;

/// Service-level failures layered over the engine's [`GameError`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("table {0} not found")]
    TableNotFound(TableId),
    #[error("only the host may start a hand")]
    NotHost,
    #[error("raise requires an amount")]
    RaiseAmountMissing,
    #[error("table is shutting down")]
    Closed,
    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;
    fn error_response(&self) -> ErrorResponse;

    fn into_response(&self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, "request failed: {}", self.error_response().error);
        } else {
            tracing::debug!(status = %status, "request rejected: {}", self.error_response().error);
        }
        warp::reply::with_status(warp::reply::json(&self.error_response()), status).into_response()
    }
}

impl IntoErrorResponse for LobbyError {
    fn status_code(&self) -> StatusCode {
        match self {
            LobbyError::TableNotFound(_) => StatusCode::NOT_FOUND,
            LobbyError::NotHost => StatusCode::FORBIDDEN,
            LobbyError::RaiseAmountMissing => StatusCode::UNPROCESSABLE_ENTITY,
            LobbyError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            LobbyError::Game(e) => match e {
                GameError::SeatNotFound { .. } | GameError::SeatEmpty { .. } => {
                    StatusCode::NOT_FOUND
                }
                GameError::NotYourTurn { .. }
                | GameError::CannotAct { .. }
                | GameError::TableFull { .. }
                | GameError::HandInProgress
                | GameError::NoHandInProgress => StatusCode::CONFLICT,
                GameError::CheckFacingBet { .. }
                | GameError::NothingToCall
                | GameError::RaiseBelowMinimum { .. }
                | GameError::NotEnoughPlayers { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                GameError::DeckExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> ErrorResponse {
        let code = match self {
            LobbyError::TableNotFound(_) => "table_not_found",
            LobbyError::NotHost => "not_host",
            LobbyError::RaiseAmountMissing => "raise_amount_missing",
            LobbyError::Closed => "table_closed",
            LobbyError::Game(e) => match e {
                GameError::SeatNotFound { .. } => "seat_not_found",
                GameError::SeatEmpty { .. } => "seat_empty",
                GameError::NotYourTurn { .. } => "not_your_turn",
                GameError::CannotAct { .. } => "cannot_act",
                GameError::CheckFacingBet { .. } => "check_facing_bet",
                GameError::NothingToCall => "nothing_to_call",
                GameError::RaiseBelowMinimum { .. } => "raise_below_minimum",
                GameError::TableFull { .. } => "table_full",
                GameError::NotEnoughPlayers { .. } => "not_enough_players",
                GameError::HandInProgress => "hand_in_progress",
                GameError::NoHandInProgress => "no_hand_in_progress",
                GameError::DeckExhausted { .. } => "deck_exhausted",
            },
        };
        ErrorResponse::new(self.to_string(), code)
    }
}
