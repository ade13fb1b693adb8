//! Durable codec for the visit-count backing file.
//!
//! The record is a small JSON object; the human-readable timestamp is
//! informational only and never drives any decision logic.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::core::errors::CounterError;

/// On-disk shape of the counter record. Unknown fields are ignored and
/// missing fields default, so older files still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    #[serde(default)]
    pub total_visits: u64,
    #[serde(default)]
    pub last_update: String,
    #[serde(default)]
    pub update_timestamp: f64,
}

impl VisitRecord {
    fn now(total_visits: u64) -> Self {
        Self {
            total_visits,
            last_update: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            update_timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }
}

/// Reads the persisted count from `path`. Absent, unreadable or malformed
/// files all reset the count to zero; none of them are fatal.
pub fn load(path: &Path) -> u64 {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("no usable visit count at {}, starting from 0: {}", path.display(), e);
            return 0;
        }
    };
    match serde_json::from_str::<VisitRecord>(&raw) {
        Ok(record) => record.total_visits,
        Err(e) => {
            warn!("malformed visit count at {}, resetting to 0: {}", path.display(), e);
            0
        }
    }
}

/// Atomically rewrites the full record at `path`, creating the parent
/// directory if needed. The write goes to a temporary sibling first and is
/// renamed into place, so a reader never observes a torn record.
pub fn save(path: &Path, count: u64) -> Result<(), CounterError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let record = VisitRecord::now(count);
    let encoded = serde_json::to_vec_pretty(&record)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, encoded)?;
    fs::rename(tmp, path)?;
    Ok(())
}
