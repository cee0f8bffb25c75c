//! EventPayload - 配送形式ごとのアダプタ
//!
//! 4 種類の trigger の違いは述語が何を見るかだけ：
//! - create/delete: スナップショットのデータ（[`SnapshotArgs`]）
//! - update/write: `(after, before)`（[`ChangeArgs`]）
//!
//! 世代（context + 値 か cloud event か）はアルゴリズムに関係しない。
//! 形式ごとにこの trait を一度実装するだけ。

use crate::domain::document::{Change, DocumentData, DocumentSnapshot};
use crate::domain::event::{ChangeDelivery, CloudEvent, SnapshotDelivery};
use crate::domain::ids::EventId;

/// Predicate input for create/delete triggers.
pub type SnapshotArgs = Option<DocumentData>;

/// Predicate input for update/write triggers: `(after, before)`.
pub type ChangeArgs = (Option<DocumentData>, Option<DocumentData>);

/// A delivered event, as far as the claim-then-run algorithm cares.
///
/// # Trait Bounds
/// - `Send + Sync + 'static`: the payload is moved into the handler after
///   being held across await points
pub trait EventPayload: Send + Sync + 'static {
    /// What `should_handle_event` receives.
    type Args: Send + 'static;

    fn event_id(&self) -> &EventId;

    fn event_type(&self) -> &str;

    fn predicate_args(&self) -> Self::Args;
}

fn snapshot_args(snapshot: &DocumentSnapshot) -> SnapshotArgs {
    snapshot.data.clone()
}

fn change_args(change: &Change) -> ChangeArgs {
    (change.after.data.clone(), change.before.data.clone())
}

impl EventPayload for SnapshotDelivery {
    type Args = SnapshotArgs;

    fn event_id(&self) -> &EventId {
        &self.context.event_id
    }

    fn event_type(&self) -> &str {
        &self.context.event_type
    }

    fn predicate_args(&self) -> SnapshotArgs {
        snapshot_args(&self.snapshot)
    }
}

impl EventPayload for ChangeDelivery {
    type Args = ChangeArgs;

    fn event_id(&self) -> &EventId {
        &self.context.event_id
    }

    fn event_type(&self) -> &str {
        &self.context.event_type
    }

    fn predicate_args(&self) -> ChangeArgs {
        change_args(&self.change)
    }
}

impl EventPayload for CloudEvent<DocumentSnapshot> {
    type Args = SnapshotArgs;

    fn event_id(&self) -> &EventId {
        &self.id
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn predicate_args(&self) -> SnapshotArgs {
        snapshot_args(&self.data)
    }
}

impl EventPayload for CloudEvent<Change> {
    type Args = ChangeArgs;

    fn event_id(&self) -> &EventId {
        &self.id
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn predicate_args(&self) -> ChangeArgs {
        change_args(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventContext, TriggerKind};
    use serde_json::json;

    fn data(value: serde_json::Value) -> DocumentData {
        value.as_object().cloned().unwrap()
    }

    fn change() -> Change {
        Change::new(
            DocumentSnapshot::new("users/aric", data(json!({ "age": 1 }))),
            DocumentSnapshot::new("users/aric", data(json!({ "age": 2 }))),
        )
    }

    #[test]
    fn change_args_put_after_first() {
        let delivery = ChangeDelivery::new(
            change(),
            EventContext::new("evt-1", TriggerKind::Update.legacy_event_type()),
        );

        let (after, before) = delivery.predicate_args();
        assert_eq!(after.unwrap()["age"], json!(2));
        assert_eq!(before.unwrap()["age"], json!(1));
        assert_eq!(delivery.event_id().as_str(), "evt-1");
    }

    #[test]
    fn cloud_events_read_id_and_type_from_the_envelope() {
        let event = CloudEvent::new(
            "evt-2",
            TriggerKind::Create.cloud_event_type(),
            DocumentSnapshot::new("users/aric", data(json!({ "name": "aric" }))),
        );

        assert_eq!(event.event_id().as_str(), "evt-2");
        assert_eq!(event.event_type(), TriggerKind::Create.cloud_event_type());
        assert_eq!(event.predicate_args().unwrap()["name"], json!("aric"));
    }

    #[test]
    fn deleted_document_yields_missing_after_data() {
        let event = CloudEvent::new(
            "evt-3",
            TriggerKind::Write.cloud_event_type(),
            Change::new(
                DocumentSnapshot::new("users/aric", data(json!({ "name": "aric" }))),
                DocumentSnapshot::missing("users/aric"),
            ),
        );

        let (after, before) = event.predicate_args();
        assert!(after.is_none());
        assert!(before.is_some());
    }
}
