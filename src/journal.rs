use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::diff::field_changes;
use crate::types::{Snapshot, Thermostat};

/// How much of each record the message journal writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Every refresh and notification is written in full.
    #[default]
    Full,
    /// First sighting of a thermostat is written in full, then only changed fields.
    Changes,
}

/// NDJSON journal of refreshes, push notifications and monitor errors.
pub(crate) struct Journal {
    mode: JournalMode,
    file: File,
    known: HashMap<String, Map<String, Value>>,
}

impl Journal {
    pub fn open(mode: JournalMode, path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            known: HashMap::new(),
        })
    }

    pub fn log_refresh(&mut self, snapshot: &Snapshot) {
        let body = match self.mode {
            JournalMode::Full => serde_json::to_value(snapshot).unwrap_or(Value::Null),
            JournalMode::Changes => {
                let mut per_serial = serde_json::Map::new();
                for t in snapshot.thermostats() {
                    per_serial.insert(t.serial_number.clone(), self.track(t));
                }
                Value::Object(per_serial)
            }
        };
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "refresh",
            "ok": true,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_refresh_failed(&mut self, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "refresh",
            "ok": false,
            "error": error,
        });
        self.write_line(&entry);
    }

    pub fn log_notification(&mut self, record: &Thermostat, outcome: &str) {
        let body = match self.mode {
            JournalMode::Full => serde_json::to_value(record).unwrap_or(Value::Null),
            JournalMode::Changes => self.track(record),
        };
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "push",
            "serial": record.serial_number,
            "outcome": outcome,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_monitor_error(&mut self, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "push",
            "error": error,
        });
        self.write_line(&entry);
    }

    /// Remember `record` and return what should be written for it: the full
    /// record when unseen, otherwise the list of changed fields.
    fn track(&mut self, record: &Thermostat) -> Value {
        let current = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let out = match self.known.get(&record.serial_number) {
            None => json!({ "full": current }),
            Some(previous) => json!({ "changes": field_changes(previous, &current) }),
        };
        self.known.insert(record.serial_number.clone(), current);
        out
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write journal entry: {e}");
        }
    }
}
