use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::seat::PlayerAction;
use crate::table::{Phase, Winner};

/// One player action as it happened, tagged with the phase it occurred in.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub seat_no: usize,
    pub phase: Phase,
    pub action: PlayerAction,
}

/// Complete record of one hand: chronological actions, board and outcome.
/// Serialized one record per line (JSONL) for storage and replay.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    /// Identifier of the form `<table_id>-<hand_no>`.
    pub hand_id: String,
    /// Deck seed when the table was created with one (enables replay).
    pub seed: Option<u64>,
    pub actions: Vec<ActionRecord>,
    pub board: Vec<Card>,
    pub winners: Vec<Winner>,
    /// RFC3339 timestamp, injected at write time when absent.
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn format_hand_id(table_id: &str, hand_no: u64) -> String {
    format!("{}-{:06}", table_id, hand_no)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends [`HandRecord`]s to a JSONL file, one line per hand.
pub struct HandLogger {
    writer: Option<BufWriter<File>>,
}

impl HandLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                let _ = create_dir_all(parent);
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
        })
    }

    /// Sink that drops every record, for tables without history.
    pub fn discard() -> Self {
        Self { writer: None }
    }

    pub fn write(&mut self, record: &HandRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_id_is_zero_padded() {
        assert_eq!(format_hand_id("t1", 7), "t1-000007");
    }

    #[test]
    fn record_round_trips_through_json() {
        let rec = HandRecord {
            hand_id: "t1-000001".into(),
            seed: Some(42),
            actions: vec![ActionRecord {
                seat_no: 1,
                phase: Phase::Preflop,
                action: PlayerAction::Call,
            }],
            board: vec![],
            winners: vec![Winner {
                seat_no: 1,
                amount: 40,
                description: None,
            }],
            ts: None,
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: HandRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
