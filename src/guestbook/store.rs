use super::error::StoreError;
use chrono::{DateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub message: String,
    /// RFC 3339 UTC, millisecond precision, `Z` suffix.
    pub time: String,
}

/// On-disk layouts. Older files wrap the list in `{"messages": [...]}`;
/// every write produces the flat array.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBook {
    Flat(Vec<Record>),
    Wrapped { messages: Vec<Record> },
}

impl StoredBook {
    fn into_records(self) -> Vec<Record> {
        match self {
            StoredBook::Flat(records) | StoredBook::Wrapped { messages: records } => records,
        }
    }
}

/// Append-only guestbook kept as one JSON file, rewritten whole on every
/// append. Appends within this process are serialised.
pub struct GuestbookStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl GuestbookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty guestbook.
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let book: StoredBook = serde_json::from_str(&raw)?;
        Ok(book.into_records())
    }

    pub fn append(&self, name: &str, message: &str) -> Result<Record, StoreError> {
        self.append_at(name, message, Utc::now())
    }

    /// Appends with `now` as the clock reading. A file that fails to parse is
    /// left untouched.
    pub fn append_at(&self, name: &str, message: &str, now: DateTime<Utc>) -> Result<Record, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut records = self.load()?;
        let time = next_time(records.last(), now);
        let record = Record {
            name: name.to_string(),
            message: message.to_string(),
            time: time.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        records.push(record.clone());

        let json = serde_json::to_string_pretty(&records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), total = records.len(), "guestbook written");
        Ok(record)
    }
}

/// Millisecond-truncated `now`, pushed past the last record's time so times
/// strictly increase.
fn next_time(last: Option<&Record>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(3);
    let last = last
        .and_then(|r| DateTime::parse_from_rfc3339(&r.time).ok())
        .map(|t| t.with_timezone(&Utc));
    match last {
        Some(last) if now <= last => last + TimeDelta::milliseconds(1),
        _ => now,
    }
}
