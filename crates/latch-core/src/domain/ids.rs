//! IDs - イベント識別子
//!
//! イベントシステムが払い出す不透明な id で、同じ論理的変更の再配送では変わらない。
//! 中身は解釈せず、dedup token のドキュメントキーとしてだけ使う。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier correlating every delivery of one logical event.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_displays_raw_value() {
        let id = EventId::from("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn event_id_serializes_as_plain_string() {
        let id = EventId::new("evt-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"evt-1\"");

        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn empty_event_id_is_detectable() {
        assert!(EventId::new("").is_empty());
        assert!(!EventId::new("x").is_empty());
    }
}
