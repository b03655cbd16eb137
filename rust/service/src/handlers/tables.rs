//! Request handlers for the table API. Each handler resolves to a full
//! `Response`; errors are rendered through [`IntoErrorResponse`] so the
//! route layer never deals in rejections.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

use cardroom_engine::seat::{PlayerAction, PlayerId};
use cardroom_engine::table::TableConfig;

use crate::errors::{IntoErrorResponse, LobbyError};
use crate::lobby::{Lobby, TableId};

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub small_blind: Option<u32>,
    #[serde(default)]
    pub big_blind: Option<u32>,
    #[serde(default)]
    pub starting_stack: Option<u32>,
    #[serde(default)]
    pub max_seats: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body for requests keyed only on the acting player.
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub user_id: String,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub user_id: String,
    pub action: ActionKind,
    #[serde(default)]
    pub amount: Option<u32>,
}

impl ActionRequest {
    /// Maps the wire action to the engine's taxonomy. A raise without an
    /// amount is rejected here, before it reaches the table.
    fn to_player_action(&self) -> Result<PlayerAction, LobbyError> {
        Ok(match self.action {
            ActionKind::Fold => PlayerAction::Fold,
            ActionKind::Check => PlayerAction::Check,
            ActionKind::Call => PlayerAction::Call,
            ActionKind::Raise => {
                let amount = self.amount.ok_or(LobbyError::RaiseAmountMissing)?;
                PlayerAction::RaiseTo(amount)
            }
            ActionKind::AllIn => PlayerAction::AllIn,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub viewer: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    table_id: TableId,
}

#[derive(Debug, Serialize)]
struct JoinedResponse {
    seat_no: usize,
}

#[derive(Debug, Serialize)]
struct LeftResponse {
    seat_no: usize,
    cashed_out: u32,
    new_host: Option<String>,
    destroyed: bool,
}

#[derive(Debug, Serialize)]
struct BotResponse {
    bot_id: String,
}

pub async fn create_table(lobby: Arc<Lobby>, request: CreateTableRequest) -> Response {
    let defaults = TableConfig::default();
    let config = TableConfig {
        max_seats: request.max_seats.unwrap_or(defaults.max_seats),
        small_blind: request.small_blind.unwrap_or(defaults.small_blind),
        big_blind: request.big_blind.unwrap_or(defaults.big_blind),
        starting_stack: request.starting_stack.unwrap_or(defaults.starting_stack),
        seed: None,
    };
    let id = lobby.create_table(
        PlayerId::Human(request.user_id),
        &request.name,
        request.table_name,
        config,
    );
    reply::with_status(
        reply::json(&CreatedResponse { table_id: id }),
        StatusCode::CREATED,
    )
    .into_response()
}

pub async fn list_tables(lobby: Arc<Lobby>) -> Response {
    let tables = lobby.list_tables().await;
    reply::json(&tables).into_response()
}

pub async fn get_table(lobby: Arc<Lobby>, id: TableId, query: ViewQuery) -> Response {
    match lobby.table_view(&id, query.viewer.as_deref()).await {
        Ok(view) => reply::json(&view).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn join_table(lobby: Arc<Lobby>, id: TableId, request: JoinRequest) -> Response {
    let result = lobby
        .join_table(
            &id,
            PlayerId::Human(request.user_id),
            &request.name,
            request.avatar,
        )
        .await;
    match result {
        Ok(seat_no) => reply::json(&JoinedResponse { seat_no }).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn leave_table(lobby: Arc<Lobby>, id: TableId, request: PlayerRequest) -> Response {
    match lobby.leave_table(&id, &request.user_id).await {
        Ok(outcome) => reply::json(&LeftResponse {
            seat_no: outcome.seat_no,
            cashed_out: outcome.cashed_out,
            new_host: outcome.new_host.map(|p| p.as_str().to_string()),
            destroyed: outcome.destroy,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn add_bot(lobby: Arc<Lobby>, id: TableId) -> Response {
    match lobby.add_bot(&id).await {
        Ok(bot_id) => reply::with_status(
            reply::json(&BotResponse { bot_id }),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn remove_bot(lobby: Arc<Lobby>, id: TableId, bot_id: String) -> Response {
    match lobby.remove_bot(&id, &bot_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn start_hand(lobby: Arc<Lobby>, id: TableId, request: PlayerRequest) -> Response {
    match lobby.start_hand(&id, &request.user_id).await {
        Ok(()) => match lobby.table_view(&id, Some(&request.user_id)).await {
            Ok(view) => reply::json(&view).into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => e.into_response(),
    }
}

pub async fn submit_action(lobby: Arc<Lobby>, id: TableId, request: ActionRequest) -> Response {
    let action = match request.to_player_action() {
        Ok(a) => a,
        Err(e) => return e.into_response(),
    };
    match lobby.apply_action(&id, &request.user_id, action).await {
        Ok(()) => match lobby.table_view(&id, Some(&request.user_id)).await {
            Ok(view) => reply::json(&view).into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => e.into_response(),
    }
}
