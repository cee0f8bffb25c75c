//! Document - trigger に渡り、ストアに書かれるドキュメントの形

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field map of a single document.
pub type DocumentData = serde_json::Map<String, serde_json::Value>;

/// A document as seen by one event.
///
/// `data` is `None` when the document does not exist at that point in time
/// (the `before` side of a create, the `after` side of a delete).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DocumentData>,
}

impl DocumentSnapshot {
    pub fn new(path: impl Into<String>, data: DocumentData) -> Self {
        Self {
            path: path.into(),
            data: Some(data),
        }
    }

    /// Snapshot of a document that does not exist.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
        }
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&DocumentData> {
        self.data.as_ref()
    }

    /// Last path segment, i.e. the document id.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Before/after pair delivered for update and write events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub before: DocumentSnapshot,
    pub after: DocumentSnapshot,
}

impl Change {
    pub fn new(before: DocumentSnapshot, after: DocumentSnapshot) -> Self {
        Self { before, after }
    }
}

/// A document as held by a conditional store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub data: DocumentData,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> DocumentData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn snapshot_id_is_last_segment() {
        let snap = DocumentSnapshot::new("users/aric", data(json!({ "name": "aric" })));
        assert_eq!(snap.id(), "aric");
        assert!(snap.exists());
    }

    #[test]
    fn missing_snapshot_has_no_data() {
        let snap = DocumentSnapshot::missing("users/gone");
        assert!(!snap.exists());
        assert!(snap.data().is_none());

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json, json!({ "path": "users/gone" }));
    }
}
