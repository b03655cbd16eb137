//! Persisted table records.
//!
//! Each table's actor writes a full record after every state change; the
//! store is the durable picture of the room used for the lobby listing and
//! for inspecting tables after the fact. Records carry the complete seat
//! state (hole cards included), so they are never served to clients
//! directly; the sanitized views in [`crate::view`] are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use cardroom_engine::cards::Card;
use cardroom_engine::seat::Seat;
use cardroom_engine::table::{Phase, Table, TableConfig, Winner};

use crate::lobby::TableId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    pub id: TableId,
    pub name: String,
    pub host_id: String,
    pub config: TableConfig,
    pub phase: Phase,
    pub hand_no: u64,
    pub pot: u32,
    pub community: Vec<Card>,
    pub winners: Vec<Winner>,
    pub seats: Vec<Seat>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableRecord {
    pub fn capture(
        id: &TableId,
        name: &str,
        table: &Table,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.clone(),
            name: name.to_string(),
            host_id: table.host().as_str().to_string(),
            config: table.config().clone(),
            phase: table.phase(),
            hand_no: table.hand_no(),
            pot: table.pot(),
            community: table.community().to_vec(),
            winners: table.winners().to_vec(),
            seats: table.seats().cloned().collect(),
            created_at,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TableStore {
    records: RwLock<HashMap<TableId, TableRecord>>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, record: TableRecord) {
        let mut guard = self.records.write().expect("store lock poisoned");
        guard.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &TableId) -> Option<TableRecord> {
        let guard = self.records.read().expect("store lock poisoned");
        guard.get(id).cloned()
    }

    pub fn remove(&self, id: &TableId) -> Option<TableRecord> {
        let mut guard = self.records.write().expect("store lock poisoned");
        guard.remove(id)
    }

    pub fn list(&self) -> Vec<TableRecord> {
        let guard = self.records.read().expect("store lock poisoned");
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardroom_engine::seat::PlayerId;

    fn record(id: &str) -> TableRecord {
        let table = Table::new(
            TableConfig::default(),
            PlayerId::Human("u1".into()),
            "Ann",
        );
        TableRecord::capture(&id.to_string(), "Test table", &table, Utc::now())
    }

    #[test]
    fn save_then_get_round_trips() {
        let store = TableStore::new();
        store.save(record("t1"));
        let found = store.get(&"t1".to_string()).unwrap();
        assert_eq!(found.name, "Test table");
        assert_eq!(found.host_id, "u1");
        assert_eq!(found.phase, Phase::Waiting);
    }

    #[test]
    fn save_overwrites_previous_record() {
        let store = TableStore::new();
        store.save(record("t1"));
        let mut updated = record("t1");
        updated.hand_no = 3;
        store.save(updated);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"t1".to_string()).unwrap().hand_no, 3);
    }

    #[test]
    fn remove_clears_the_record() {
        let store = TableStore::new();
        store.save(record("t1"));
        assert!(store.remove(&"t1".to_string()).is_some());
        assert!(store.is_empty());
    }
}
