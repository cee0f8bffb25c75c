//! Event - 配送されるイベント
//!
//! 二つの配送形式が並存する：
//! - 第一世代: ドキュメント（または変更）と、id と種別を持つ [`EventContext`] の組
//! - 第二世代: `data` にドキュメント（または変更）を入れた [`CloudEvent`] 一つ
//!
//! どちらもイベントシステムが作る。こちらは id と種別を読むだけで、値は
//! 手を加えずに handler へ渡す。

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{Change, DocumentSnapshot};
use super::ids::EventId;

/// Which document change a trigger listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Create,
    Update,
    Delete,
    /// Any of create, update or delete.
    Write,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 4] = [
        TriggerKind::Create,
        TriggerKind::Update,
        TriggerKind::Delete,
        TriggerKind::Write,
    ];

    /// Event type string used by first generation deliveries.
    pub fn legacy_event_type(self) -> &'static str {
        match self {
            TriggerKind::Create => "providers/cloud.firestore/eventTypes/document.create",
            TriggerKind::Update => "providers/cloud.firestore/eventTypes/document.update",
            TriggerKind::Delete => "providers/cloud.firestore/eventTypes/document.delete",
            TriggerKind::Write => "providers/cloud.firestore/eventTypes/document.write",
        }
    }

    /// Event type string used by second generation deliveries.
    pub fn cloud_event_type(self) -> &'static str {
        match self {
            TriggerKind::Create => "google.cloud.firestore.document.v1.created",
            TriggerKind::Update => "google.cloud.firestore.document.v1.updated",
            TriggerKind::Delete => "google.cloud.firestore.document.v1.deleted",
            TriggerKind::Write => "google.cloud.firestore.document.v1.written",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Create => "create",
            TriggerKind::Update => "update",
            TriggerKind::Delete => "delete",
            TriggerKind::Write => "write",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a first generation delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub event_id: EventId,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,

    /// Full resource name of the changed document.
    #[serde(default)]
    pub resource: String,

    /// Wildcard values matched in the trigger path, e.g. `userId`.
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl EventContext {
    pub fn new(event_id: impl Into<EventId>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            resource: String::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// First generation create/delete delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDelivery {
    pub snapshot: DocumentSnapshot,
    pub context: EventContext,
}

impl SnapshotDelivery {
    pub fn new(snapshot: DocumentSnapshot, context: EventContext) -> Self {
        Self { snapshot, context }
    }
}

/// First generation update/write delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDelivery {
    pub change: Change,
    pub context: EventContext,
}

impl ChangeDelivery {
    pub fn new(change: Change, context: EventContext) -> Self {
        Self { change, context }
    }
}

/// Second generation delivery envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent<T> {
    pub id: EventId,

    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub source: String,

    /// Path of the changed document relative to the database root.
    #[serde(default)]
    pub document: String,

    pub time: DateTime<Utc>,

    #[serde(default)]
    pub params: HashMap<String, String>,

    pub data: T,
}

impl<T> CloudEvent<T> {
    pub fn new(id: impl Into<EventId>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            source: String::new(),
            document: String::new(),
            time: Utc::now(),
            params: HashMap::new(),
            data,
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }
}
