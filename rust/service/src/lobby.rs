//! Table lobby and per-table actors.
//!
//! Every table is owned by exactly one tokio task. All reads and writes go
//! through that task's command channel, so engine calls are serialized
//! without any locking around [`Table`] itself. Bot turns run on the same
//! queue: after each command the actor drives bot seats to act until a
//! human is up or the hand ends.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use cardroom_ai::{create_agent, DecisionAgent};
use cardroom_engine::errors::GameError;
use cardroom_engine::history::{format_hand_id, ActionRecord, HandLogger, HandRecord};
use cardroom_engine::seat::{PlayerAction, PlayerId};
use cardroom_engine::table::{HandEvent, LeaveOutcome, Phase, Table, TableConfig, Winner};

use crate::errors::LobbyError;
use crate::events::{EventBus, TableEvent};
use crate::store::{TableRecord, TableStore};
use crate::view::{sanitized_view, summary, TableSummary, TableView};

pub type TableId = String;

const COMMAND_CHANNEL_BUFFER: usize = 64;

/// Default idle window after which an abandoned table is reclaimed.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct LobbyConfig {
    pub stale_after: Duration,
    /// Simulated bot think time, min..max milliseconds.
    pub bot_delay_ms: (u64, u64),
    pub agent_kind: String,
    /// When set, each table appends its hand history to
    /// `<history_dir>/<table_id>.jsonl`.
    pub history_dir: Option<PathBuf>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            bot_delay_ms: (300, 900),
            agent_kind: "heuristic".to_string(),
            history_dir: None,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, LobbyError>>;

enum TableCommand {
    Join {
        player: PlayerId,
        name: String,
        avatar: Option<String>,
        reply: Reply<usize>,
    },
    Leave {
        player_id: String,
        reply: Reply<LeaveOutcome>,
    },
    AddBot {
        reply: Reply<String>,
    },
    RemoveBot {
        bot_id: String,
        reply: Reply<()>,
    },
    StartHand {
        player_id: String,
        reply: Reply<()>,
    },
    Action {
        player_id: String,
        action: PlayerAction,
        reply: Reply<()>,
    },
    View {
        viewer: Option<String>,
        reply: Reply<TableView>,
    },
    Summary {
        reply: Reply<TableSummary>,
    },
    Close,
}

#[derive(Debug)]
struct TableMeta {
    id: TableId,
    name: String,
    created_at: DateTime<Utc>,
    last_active: Mutex<DateTime<Utc>>,
}

impl TableMeta {
    fn touch(&self) {
        *self.last_active.lock().expect("meta lock poisoned") = Utc::now();
    }

    fn idle_for(&self) -> Duration {
        let last = *self.last_active.lock().expect("meta lock poisoned");
        (Utc::now() - last).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Clone)]
struct TableHandle {
    tx: mpsc::Sender<TableCommand>,
    meta: Arc<TableMeta>,
}

/// The room: creates tables, routes commands to their actors and reclaims
/// abandoned ones.
pub struct Lobby {
    tables: RwLock<HashMap<TableId, TableHandle>>,
    bus: EventBus,
    store: Arc<TableStore>,
    config: LobbyConfig,
}

impl Lobby {
    pub fn new(bus: EventBus, store: Arc<TableStore>, config: LobbyConfig) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            bus,
            store,
            config,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Creates a table with `host` seated and spawns its actor.
    pub fn create_table(
        &self,
        host: PlayerId,
        host_name: &str,
        table_name: Option<String>,
        config: TableConfig,
    ) -> TableId {
        let id = Uuid::new_v4().to_string();
        let name = table_name.unwrap_or_else(|| format!("{host_name}'s table"));
        let table = Table::new(config, host, host_name);

        let meta = Arc::new(TableMeta {
            id: id.clone(),
            name,
            created_at: Utc::now(),
            last_active: Mutex::new(Utc::now()),
        });

        let logger = match &self.config.history_dir {
            Some(dir) => {
                let path = dir.join(format!("{id}.jsonl"));
                HandLogger::create(&path).unwrap_or_else(|e| {
                    tracing::warn!(table_id = %id, error = %e, "hand history disabled");
                    HandLogger::discard()
                })
            }
            None => HandLogger::discard(),
        };

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let actor = TableActor {
            table,
            agents: HashMap::new(),
            bot_seq: 0,
            bus: self.bus.clone(),
            store: Arc::clone(&self.store),
            meta: Arc::clone(&meta),
            config: self.config.clone(),
            recorder: HandRecorder::new(logger),
            rx,
        };
        actor.persist();
        tokio::spawn(actor.run());

        let mut guard = self.tables.write().expect("lobby lock poisoned");
        guard.insert(id.clone(), TableHandle { tx, meta });
        tracing::info!(table_id = %id, "table created");
        id
    }

    pub async fn join_table(
        &self,
        id: &TableId,
        player: PlayerId,
        name: &str,
        avatar: Option<String>,
    ) -> Result<usize, LobbyError> {
        self.send(id, |reply| TableCommand::Join {
            player,
            name: name.to_string(),
            avatar,
            reply,
        })
        .await
    }

    /// Removes a player. When the last human leaves the table is destroyed
    /// and its handle dropped from the lobby.
    pub async fn leave_table(&self, id: &TableId, player_id: &str) -> Result<LeaveOutcome, LobbyError> {
        let outcome = self
            .send(id, |reply| TableCommand::Leave {
                player_id: player_id.to_string(),
                reply,
            })
            .await?;
        if outcome.destroy {
            self.forget(id);
        }
        Ok(outcome)
    }

    pub async fn add_bot(&self, id: &TableId) -> Result<String, LobbyError> {
        self.send(id, |reply| TableCommand::AddBot { reply }).await
    }

    pub async fn remove_bot(&self, id: &TableId, bot_id: &str) -> Result<(), LobbyError> {
        self.send(id, |reply| TableCommand::RemoveBot {
            bot_id: bot_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn start_hand(&self, id: &TableId, player_id: &str) -> Result<(), LobbyError> {
        self.send(id, |reply| TableCommand::StartHand {
            player_id: player_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn apply_action(
        &self,
        id: &TableId,
        player_id: &str,
        action: PlayerAction,
    ) -> Result<(), LobbyError> {
        self.send(id, |reply| TableCommand::Action {
            player_id: player_id.to_string(),
            action,
            reply,
        })
        .await
    }

    pub async fn table_view(
        &self,
        id: &TableId,
        viewer: Option<&str>,
    ) -> Result<TableView, LobbyError> {
        self.send(id, |reply| TableCommand::View {
            viewer: viewer.map(str::to_string),
            reply,
        })
        .await
    }

    /// Lobby listing: live tables that still hold at least one human.
    /// Tables between hands stay listed (that is the only time a join is
    /// legal); destroyed and stale-reclaimed tables are already gone from
    /// the registry.
    pub async fn list_tables(&self) -> Vec<TableSummary> {
        let handles: Vec<TableHandle> = {
            let guard = self.tables.read().expect("lobby lock poisoned");
            guard.values().cloned().collect()
        };
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let (tx, rx) = oneshot::channel();
            if handle.tx.send(TableCommand::Summary { reply: tx }).await.is_err() {
                continue;
            }
            if let Ok(Ok(s)) = rx.await {
                if s.human_count > 0 {
                    summaries.push(s);
                }
            }
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Closes tables idle past the configured window. Returns how many were
    /// reclaimed.
    pub async fn reclaim_stale(&self) -> usize {
        let stale: Vec<(TableId, TableHandle)> = {
            let guard = self.tables.read().expect("lobby lock poisoned");
            guard
                .iter()
                .filter(|(_, h)| h.meta.idle_for() >= self.config.stale_after)
                .map(|(id, h)| (id.clone(), h.clone()))
                .collect()
        };
        let count = stale.len();
        for (id, handle) in stale {
            tracing::info!(table_id = %id, "reclaiming stale table");
            let _ = handle.tx.send(TableCommand::Close).await;
            self.forget(&id);
        }
        count
    }

    fn forget(&self, id: &TableId) {
        let mut guard = self.tables.write().expect("lobby lock poisoned");
        guard.remove(id);
    }

    async fn send<T>(
        &self,
        id: &TableId,
        make: impl FnOnce(Reply<T>) -> TableCommand,
    ) -> Result<T, LobbyError> {
        let handle = {
            let guard = self.tables.read().expect("lobby lock poisoned");
            guard
                .get(id)
                .cloned()
                .ok_or_else(|| LobbyError::TableNotFound(id.clone()))?
        };
        let (tx, rx) = oneshot::channel();
        handle
            .tx
            .send(make(tx))
            .await
            .map_err(|_| LobbyError::Closed)?;
        rx.await.map_err(|_| LobbyError::Closed)?
    }
}

struct TableActor {
    table: Table,
    /// Bot id to its decision agent.
    agents: HashMap<String, Box<dyn DecisionAgent>>,
    bot_seq: u32,
    bus: EventBus,
    store: Arc<TableStore>,
    meta: Arc<TableMeta>,
    config: LobbyConfig,
    recorder: HandRecorder,
    rx: mpsc::Receiver<TableCommand>,
}

/// Accumulates the actions of the hand in flight and appends a
/// [`HandRecord`] when it ends. Streets are tracked from the event stream
/// so each action is tagged with the phase it happened in.
struct HandRecorder {
    logger: HandLogger,
    actions: Vec<ActionRecord>,
    phase: Phase,
}

impl HandRecorder {
    fn new(logger: HandLogger) -> Self {
        Self {
            logger,
            actions: Vec::new(),
            phase: Phase::Waiting,
        }
    }

    fn observe(&mut self, event: &HandEvent) -> Option<Vec<Winner>> {
        match event {
            HandEvent::HandStarted { .. } => {
                self.actions.clear();
                self.phase = Phase::Preflop;
                None
            }
            HandEvent::ActionApplied { seat_no, action } => {
                self.actions.push(ActionRecord {
                    seat_no: *seat_no,
                    phase: self.phase,
                    action: *action,
                });
                None
            }
            HandEvent::StreetDealt { phase, .. } => {
                self.phase = *phase;
                None
            }
            HandEvent::ShowdownReached { winners } | HandEvent::HandFinished { winners } => {
                Some(winners.clone())
            }
        }
    }

    fn finish(&mut self, table_id: &str, table: &Table, winners: Vec<Winner>) {
        let record = HandRecord {
            hand_id: format_hand_id(table_id, table.hand_no()),
            seed: table.config().seed,
            actions: std::mem::take(&mut self.actions),
            board: table.community().to_vec(),
            winners,
            ts: None,
        };
        if let Err(e) = self.logger.write(&record) {
            tracing::warn!(table_id, error = %e, "failed to append hand history");
        }
    }
}

impl TableActor {
    async fn run(mut self) {
        let mut reason = "shutdown";
        while let Some(cmd) = self.rx.recv().await {
            match self.handle(cmd) {
                Disposition::Continue => {}
                Disposition::Destroy(why) => {
                    reason = why;
                    break;
                }
            }
            self.drive_bots().await;
        }
        self.store.remove(&self.meta.id);
        self.bus.broadcast(
            &self.meta.id,
            TableEvent::TableClosed {
                table_id: self.meta.id.clone(),
                reason: reason.to_string(),
            },
        );
        self.bus.drop_table(&self.meta.id);
        tracing::info!(table_id = %self.meta.id, "table actor stopped");
    }

    fn handle(&mut self, cmd: TableCommand) -> Disposition {
        match cmd {
            TableCommand::Join {
                player,
                name,
                avatar,
                reply,
            } => {
                self.meta.touch();
                let result = self.table.seat_player(player, name.clone(), avatar);
                if let Ok(seat_no) = result {
                    self.broadcast(TableEvent::PlayerJoined {
                        table_id: self.meta.id.clone(),
                        seat_no,
                        name,
                    });
                    self.persist();
                }
                let _ = reply.send(result.map_err(LobbyError::from));
            }
            TableCommand::Leave { player_id, reply } => {
                self.meta.touch();
                match self.table.vacate(&player_id) {
                    Ok((outcome, events)) => {
                        self.broadcast(TableEvent::PlayerLeft {
                            table_id: self.meta.id.clone(),
                            seat_no: outcome.seat_no,
                            new_host: outcome
                                .new_host
                                .as_ref()
                                .map(|p| p.as_str().to_string()),
                        });
                        self.fan_out(events);
                        let destroy = outcome.destroy;
                        self.persist();
                        let _ = reply.send(Ok(outcome));
                        if destroy {
                            return Disposition::Destroy("empty");
                        }
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            TableCommand::AddBot { reply } => {
                self.meta.touch();
                self.bot_seq += 1;
                let bot_id = format!("bot-{}", self.bot_seq);
                let bot_name = format!("Bot {}", self.bot_seq);
                let result = self
                    .table
                    .seat_player(PlayerId::Bot(bot_id.clone()), bot_name.clone(), None);
                match result {
                    Ok(seat_no) => {
                        let seed = rand::random();
                        self.agents
                            .insert(bot_id.clone(), create_agent(&self.config.agent_kind, seed));
                        self.broadcast(TableEvent::BotAdded {
                            table_id: self.meta.id.clone(),
                            bot_id: bot_id.clone(),
                            seat_no,
                        });
                        self.persist();
                        let _ = reply.send(Ok(bot_id));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            TableCommand::RemoveBot { bot_id, reply } => {
                self.meta.touch();
                match self.table.vacate(&bot_id) {
                    Ok((_, events)) => {
                        self.agents.remove(&bot_id);
                        self.broadcast(TableEvent::BotRemoved {
                            table_id: self.meta.id.clone(),
                            bot_id,
                        });
                        self.fan_out(events);
                        self.persist();
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.into()));
                    }
                }
            }
            TableCommand::StartHand { player_id, reply } => {
                self.meta.touch();
                let result = if self.table.host().as_str() != player_id {
                    Err(LobbyError::NotHost)
                } else {
                    self.table
                        .start_hand()
                        .map_err(LobbyError::from)
                        .map(|events| self.fan_out(events))
                };
                if result.is_ok() {
                    self.persist();
                }
                let _ = reply.send(result);
            }
            TableCommand::Action {
                player_id,
                action,
                reply,
            } => {
                self.meta.touch();
                let result = self.apply_for(&player_id, action);
                if result.is_ok() {
                    self.persist();
                }
                let _ = reply.send(result);
            }
            TableCommand::View { viewer, reply } => {
                let view = sanitized_view(
                    &self.meta.id,
                    &self.meta.name,
                    &self.table,
                    viewer.as_deref(),
                );
                let _ = reply.send(Ok(view));
            }
            TableCommand::Summary { reply } => {
                let _ = reply.send(Ok(summary(&self.meta.id, &self.meta.name, &self.table)));
            }
            TableCommand::Close => return Disposition::Destroy("stale"),
        }
        Disposition::Continue
    }

    fn apply_for(&mut self, player_id: &str, action: PlayerAction) -> Result<(), LobbyError> {
        let seat_no = self
            .table
            .seat_of(player_id)
            .map(|s| s.seat_no)
            .ok_or_else(|| GameError::SeatNotFound {
                player_id: player_id.to_string(),
            })?;
        let events = self.table.apply_action(seat_no, action)?;
        self.fan_out(events);
        Ok(())
    }

    /// Acts for consecutive bot seats until a human is up, the hand ends or
    /// there is no turn. Commands queued meanwhile wait their turn; the
    /// queue is the serialization point.
    async fn drive_bots(&mut self) {
        loop {
            if !self.table.phase().is_betting() {
                return;
            }
            let Some(seat_no) = self.table.current_seat() else {
                return;
            };
            let Some(seat) = self.table.seat(seat_no) else {
                return;
            };
            if seat.player.is_human() {
                return;
            }
            let bot_id = seat.player.as_str().to_string();

            let (lo, hi) = self.config.bot_delay_ms;
            if hi > lo {
                let delay = rand::rng().random_range(lo..hi);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let Some(agent) = self.agents.get_mut(&bot_id) else {
                tracing::error!(table_id = %self.meta.id, %bot_id, "bot seat has no agent, folding");
                let _ = self.apply_for(&bot_id, PlayerAction::Fold);
                self.persist();
                continue;
            };
            let action = agent.decide(&self.table, seat_no);
            tracing::debug!(
                table_id = %self.meta.id,
                %bot_id,
                seat_no,
                ?action,
                "bot acting"
            );
            if let Err(e) = self.apply_for(&bot_id, action) {
                tracing::error!(
                    table_id = %self.meta.id,
                    %bot_id,
                    error = %e,
                    "bot produced an illegal action, folding"
                );
                let _ = self.apply_for(&bot_id, PlayerAction::Fold);
            }
            self.persist();
        }
    }

    fn fan_out(&mut self, events: Vec<HandEvent>) {
        for event in events {
            if let Some(winners) = self.recorder.observe(&event) {
                self.recorder.finish(&self.meta.id, &self.table, winners);
            }
            let table_id = self.meta.id.clone();
            let mapped = match event {
                HandEvent::HandStarted { hand_no, dealer } => TableEvent::HandStarted {
                    table_id,
                    hand_no,
                    dealer,
                },
                HandEvent::ActionApplied { seat_no, action } => TableEvent::ActionApplied {
                    table_id,
                    seat_no,
                    action,
                },
                HandEvent::StreetDealt { phase, cards } => TableEvent::StreetDealt {
                    table_id,
                    phase,
                    cards,
                },
                HandEvent::ShowdownReached { winners } => TableEvent::ShowdownReached {
                    table_id,
                    winners,
                },
                HandEvent::HandFinished { winners } => TableEvent::HandFinished {
                    table_id,
                    winners,
                },
            };
            self.bus.broadcast(&self.meta.id, mapped);
        }
    }

    fn broadcast(&self, event: TableEvent) {
        self.bus.broadcast(&self.meta.id, event);
    }

    fn persist(&self) {
        self.store.save(TableRecord::capture(
            &self.meta.id,
            &self.meta.name,
            &self.table,
            self.meta.created_at,
        ));
    }
}

enum Disposition {
    Continue,
    Destroy(&'static str),
}
