//! Journal data model

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::storage::BlobRef;

/// A single journal entry, stored as its own blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub date: DateTime<Utc>,
}

impl Entry {
    /// Build a new entry with a fresh id, dated now
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            date: now_millis(),
        }
    }

    /// Blob name this entry is stored under
    pub fn file_name(&self) -> String {
        entry_file_name(&self.id)
    }
}

/// Index row pointing at an entry blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: Uuid,
    pub title: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub date: DateTime<Utc>,
    pub file: BlobRef,
}

impl IndexRecord {
    pub fn for_entry(entry: &Entry, file: BlobRef) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            date: entry.date,
            file,
        }
    }
}

pub fn entry_file_name(id: &Uuid) -> String {
    format!("entry_{}.json", id)
}

/// Current time truncated to what the stored format can represent
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn serialize_iso_millis<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}
