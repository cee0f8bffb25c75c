//! DedupToken - event id が claim 済みであることの記録
//!
//! create に勝った配送が一度だけ作り、ここでは更新も削除もしない。
//! 保持期間は運用側に任せる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{DocumentData, StoredDocument};
use super::ids::EventId;

/// Field under which the event type is stored in a token document.
pub const EVENT_TYPE_FIELD: &str = "eventType";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupToken {
    pub event_id: EventId,
    /// Informational only.
    pub event_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DedupToken {
    /// Document body written when claiming an event.
    pub fn claim_data(event_type: &str) -> DocumentData {
        let mut data = DocumentData::new();
        data.insert(
            EVENT_TYPE_FIELD.to_string(),
            serde_json::Value::String(event_type.to_string()),
        );
        data
    }

    /// Reads a token back out of a stored document.
    pub fn from_document(event_id: EventId, doc: &StoredDocument) -> Self {
        let event_type = doc
            .data
            .get(EVENT_TYPE_FIELD)
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self {
            event_id,
            event_type,
            created_at: doc.created_at,
        }
    }
}
