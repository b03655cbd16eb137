//! Lobby-level integration tests: per-table actors, host rules, bot play
//! and staleness reclamation. Bot think time is zeroed so tests drive the
//! queue deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use cardroom_engine::history::HandRecord;
use cardroom_engine::seat::{PlayerAction, PlayerId};
use cardroom_engine::table::{Phase, TableConfig};
use cardroom_service::errors::LobbyError;
use cardroom_service::events::{EventBus, TableEvent};
use cardroom_service::lobby::{Lobby, LobbyConfig, TableId};
use cardroom_service::store::TableStore;

fn test_lobby() -> Arc<Lobby> {
    test_lobby_with(LobbyConfig {
        bot_delay_ms: (0, 0),
        ..LobbyConfig::default()
    })
}

fn test_lobby_with(config: LobbyConfig) -> Arc<Lobby> {
    Arc::new(Lobby::new(
        EventBus::new(),
        Arc::new(TableStore::new()),
        config,
    ))
}

fn human(id: &str) -> PlayerId {
    PlayerId::Human(id.to_string())
}

fn seeded_config(seed: u64) -> TableConfig {
    TableConfig {
        seed: Some(seed),
        ..TableConfig::default()
    }
}

async fn create_with_players(lobby: &Arc<Lobby>, players: usize, seed: u64) -> TableId {
    let id = lobby.create_table(human("u0"), "P0", None, seeded_config(seed));
    for i in 1..players {
        lobby
            .join_table(&id, human(&format!("u{i}")), &format!("P{i}"), None)
            .await
            .unwrap();
    }
    id
}

#[tokio::test]
async fn create_join_and_view() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 1).await;

    let view = lobby.table_view(&id, Some("u0")).await.unwrap();
    assert_eq!(view.phase, Phase::Waiting);
    assert_eq!(view.seats.len(), 2);
    assert_eq!(view.host.as_str(), "u0");

    let listed = lobby.list_tables().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].player_count, 2);
    assert_eq!(listed[0].human_count, 2);
}

#[tokio::test]
async fn tables_between_hands_stay_listed() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 31).await;
    lobby.start_hand(&id, "u0").await.unwrap();

    // End the hand: the first actor folds heads-up.
    let view = lobby.table_view(&id, None).await.unwrap();
    let acting = view.current_seat.unwrap();
    let actor_id = view
        .seats
        .iter()
        .find(|s| s.seat_no == acting)
        .unwrap()
        .player
        .as_str()
        .to_string();
    lobby
        .apply_action(&id, &actor_id, PlayerAction::Fold)
        .await
        .unwrap();

    let view = lobby.table_view(&id, None).await.unwrap();
    assert!(view.phase.hand_over());
    // Joins are only legal between hands, so the table must stay visible.
    let listed = lobby.list_tables().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
async fn rejoin_returns_the_same_seat() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 2).await;
    let first = lobby.join_table(&id, human("u1"), "P1", None).await.unwrap();
    let again = lobby.join_table(&id, human("u1"), "P1", None).await.unwrap();
    assert_eq!(first, again);
}

#[tokio::test]
async fn only_the_host_starts_a_hand() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 3).await;

    let err = lobby.start_hand(&id, "u1").await.unwrap_err();
    assert_eq!(err, LobbyError::NotHost);

    lobby.start_hand(&id, "u0").await.unwrap();
    let view = lobby.table_view(&id, None).await.unwrap();
    assert_eq!(view.phase, Phase::Preflop);
    assert_eq!(view.hand_no, 1);
}

#[tokio::test]
async fn views_withhold_opponent_cards() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 4).await;
    lobby.start_hand(&id, "u0").await.unwrap();

    let view = lobby.table_view(&id, Some("u1")).await.unwrap();
    for seat in &view.seats {
        if seat.player.as_str() == "u1" {
            assert_eq!(seat.hole_cards.as_ref().map(Vec::len), Some(2));
        } else {
            assert!(seat.hole_cards.is_none());
        }
    }
}

#[tokio::test]
async fn actions_route_by_player_identity() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 3, 5).await;
    lobby.start_hand(&id, "u0").await.unwrap();

    let view = lobby.table_view(&id, None).await.unwrap();
    let acting = view.current_seat.unwrap();
    let actor_id = view
        .seats
        .iter()
        .find(|s| s.seat_no == acting)
        .unwrap()
        .player
        .as_str()
        .to_string();
    let other = view
        .seats
        .iter()
        .find(|s| s.player.as_str() != actor_id)
        .unwrap()
        .player
        .as_str()
        .to_string();

    let err = lobby
        .apply_action(&id, &other, PlayerAction::Call)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LobbyError::Game(cardroom_engine::errors::GameError::NotYourTurn { .. })
    ));

    lobby
        .apply_action(&id, &actor_id, PlayerAction::Call)
        .await
        .unwrap();
}

#[tokio::test]
async fn bots_play_the_hand_to_completion() {
    let lobby = test_lobby();
    let id = lobby.create_table(human("u0"), "P0", None, seeded_config(6));
    lobby.add_bot(&id).await.unwrap();
    lobby.add_bot(&id).await.unwrap();

    lobby.start_hand(&id, "u0").await.unwrap();

    // Bot turns run on the actor queue before the next command, so each
    // view either shows the human to act or the hand over.
    for _ in 0..30 {
        let view = lobby.table_view(&id, Some("u0")).await.unwrap();
        if view.phase.hand_over() {
            let stacks: u32 = view.seats.iter().map(|s| s.stack + s.current_bet).sum();
            assert_eq!(stacks + view.pot, 3_000, "chips conserved across bot play");
            assert!(!view.winners.is_empty());
            return;
        }
        let acting = view.current_seat.expect("betting phase has a turn");
        let actor = view.seats.iter().find(|s| s.seat_no == acting).unwrap();
        assert_eq!(
            actor.player.as_str(),
            "u0",
            "bots never leave the turn on themselves"
        );
        lobby
            .apply_action(&id, "u0", PlayerAction::Fold)
            .await
            .unwrap();
    }
    panic!("hand did not complete");
}

#[tokio::test]
async fn host_transfer_and_destroy_on_leave() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 7).await;
    lobby.add_bot(&id).await.unwrap();

    let outcome = lobby.leave_table(&id, "u0").await.unwrap();
    assert_eq!(outcome.new_host.as_ref().map(|p| p.as_str()), Some("u1"));
    assert!(!outcome.destroy);

    // Last human out: bots alone do not keep a table alive.
    let outcome = lobby.leave_table(&id, "u1").await.unwrap();
    assert!(outcome.destroy);
    assert_eq!(lobby.table_count(), 0);

    let err = lobby.table_view(&id, None).await.unwrap_err();
    assert_eq!(err, LobbyError::TableNotFound(id.clone()));

    // The actor removes the persisted record as it stops.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(lobby.store().get(&id).is_none());
}

#[tokio::test]
async fn concurrent_joins_never_overfill_the_table() {
    let lobby = test_lobby();
    let id = lobby.create_table(human("u0"), "P0", None, seeded_config(8));

    let mut join_set = JoinSet::new();
    for i in 1..10 {
        let lobby = Arc::clone(&lobby);
        let id = id.clone();
        join_set.spawn(async move {
            lobby
                .join_table(&id, human(&format!("u{i}")), &format!("P{i}"), None)
                .await
        });
    }

    let mut ok = 0;
    let mut full = 0;
    while let Some(result) = join_set.join_next().await {
        match result.unwrap() {
            Ok(_) => ok += 1,
            Err(LobbyError::Game(cardroom_engine::errors::GameError::TableFull { .. })) => {
                full += 1
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 5, "five free seats behind the host");
    assert_eq!(full, 4);

    let view = lobby.table_view(&id, None).await.unwrap();
    assert_eq!(view.seats.len(), 6);
}

#[tokio::test]
async fn events_fan_out_to_subscribers() {
    let lobby = test_lobby();
    let id = create_with_players(&lobby, 2, 9).await;
    let mut sub = lobby.event_bus().subscribe(id.clone());

    lobby.start_hand(&id, "u0").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), sub.receiver().recv())
        .await
        .expect("event within a second")
        .expect("bus open");
    assert!(matches!(event, TableEvent::HandStarted { hand_no: 1, .. }));
}

#[tokio::test]
async fn stale_tables_are_reclaimed() {
    let lobby = test_lobby_with(LobbyConfig {
        stale_after: Duration::ZERO,
        bot_delay_ms: (0, 0),
        ..LobbyConfig::default()
    });
    let id = lobby.create_table(human("u0"), "P0", None, seeded_config(10));
    assert_eq!(lobby.table_count(), 1);

    let reclaimed = lobby.reclaim_stale().await;
    assert_eq!(reclaimed, 1);
    assert_eq!(lobby.table_count(), 0);

    let err = lobby.table_view(&id, None).await.unwrap_err();
    assert_eq!(err, LobbyError::TableNotFound(id));
}

#[tokio::test]
async fn hand_history_is_appended_as_jsonl() {
    let dir = std::env::temp_dir().join(format!("cardroom-history-{}", std::process::id()));
    let lobby = test_lobby_with(LobbyConfig {
        bot_delay_ms: (0, 0),
        history_dir: Some(dir.clone()),
        ..LobbyConfig::default()
    });
    let id = create_with_players(&lobby, 2, 12).await;
    lobby.start_hand(&id, "u0").await.unwrap();

    // First to act folds; heads-up that ends the hand immediately.
    let view = lobby.table_view(&id, None).await.unwrap();
    let acting = view.current_seat.unwrap();
    let actor = view
        .seats
        .iter()
        .find(|s| s.seat_no == acting)
        .unwrap()
        .player
        .as_str()
        .to_string();
    lobby
        .apply_action(&id, &actor, PlayerAction::Fold)
        .await
        .unwrap();
    let view = lobby.table_view(&id, None).await.unwrap();
    assert!(view.phase.hand_over());

    let contents = std::fs::read_to_string(dir.join(format!("{id}.jsonl"))).unwrap();
    let line = contents.lines().next().expect("one record written");
    let record: HandRecord = serde_json::from_str(line).unwrap();
    assert_eq!(record.hand_id, format!("{id}-000001"));
    assert_eq!(record.seed, Some(12));
    assert!(record
        .actions
        .iter()
        .any(|a| a.action == PlayerAction::Fold));
    assert_eq!(record.winners.len(), 1);
}

#[tokio::test]
async fn fresh_tables_survive_the_sweep() {
    let lobby = test_lobby();
    lobby.create_table(human("u0"), "P0", None, seeded_config(11));
    let reclaimed = lobby.reclaim_stale().await;
    assert_eq!(reclaimed, 0);
    assert_eq!(lobby.table_count(), 1);
}
