use cardroom_engine::cards::Card;
use cardroom_engine::seat::PlayerAction;
use cardroom_engine::table::{Phase, Winner};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::lobby::TableId;

// Bounded channel per subscriber; events for slow consumers are dropped
// rather than backing up the table actor.
const EVENT_CHANNEL_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<TableEvent>;
pub type EventReceiver = mpsc::Receiver<TableEvent>;

/// Everything observers can learn about a table without holding a seat.
/// Hole cards never travel through the bus; winners and board cards do.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TableEvent {
    PlayerJoined {
        table_id: TableId,
        seat_no: usize,
        name: String,
    },
    PlayerLeft {
        table_id: TableId,
        seat_no: usize,
        new_host: Option<String>,
    },
    BotAdded {
        table_id: TableId,
        bot_id: String,
        seat_no: usize,
    },
    BotRemoved {
        table_id: TableId,
        bot_id: String,
    },
    HandStarted {
        table_id: TableId,
        hand_no: u64,
        dealer: usize,
    },
    ActionApplied {
        table_id: TableId,
        seat_no: usize,
        action: PlayerAction,
    },
    StreetDealt {
        table_id: TableId,
        phase: Phase,
        cards: Vec<Card>,
    },
    ShowdownReached {
        table_id: TableId,
        winners: Vec<Winner>,
    },
    HandFinished {
        table_id: TableId,
        winners: Vec<Winner>,
    },
    TableClosed {
        table_id: TableId,
        reason: String,
    },
}

pub struct EventSubscription {
    bus: EventBus,
    table_id: TableId,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.table_id, self.subscriber_id);
    }
}

/// Fan-out of [`TableEvent`]s to per-table subscribers. This is the only
/// way anything outside a table's actor observes a hand in flight.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<TableId, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, table_id: TableId) -> EventSubscription {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        guard.entry(table_id.clone()).or_default().push((id, tx));

        tracing::debug!(table_id = %table_id, subscriber_id = id, "observer subscribed");

        EventSubscription {
            bus: self.clone(),
            table_id,
            subscriber_id: id,
            receiver: rx,
        }
    }

    pub fn broadcast(&self, table_id: &TableId, event: TableEvent) {
        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .expect("subscriber lock poisoned");
            guard.get(table_id).cloned()
        };

        let Some(list) = subscribers else {
            return;
        };
        for (id, sender) in list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    table_id = %table_id,
                    subscriber_id = id,
                    error = ?e,
                    "dropping event for slow subscriber"
                );
            }
        }
    }

    pub fn drop_table(&self, table_id: &TableId) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        guard.remove(table_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .map(|g| g.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn unsubscribe(&self, table_id: &TableId, subscriber_id: usize) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .expect("subscriber lock poisoned");
        if let Some(list) = guard.get_mut(table_id) {
            list.retain(|(id, _)| *id != subscriber_id);
            if list.is_empty() {
                guard.remove(table_id);
            }
        }
    }
}
