//! Domain - ドメインモデル（event id, ドキュメント, 配送, token, エラー）
//!
//! ここでは I/O をしない。配送ペイロードはイベントシステムのもので、
//! このクレートが永続化するのは [`DedupToken`] だけ。

pub mod document;
pub mod errors;
pub mod event;
pub mod ids;
pub mod token;

pub use self::document::{Change, DocumentData, DocumentSnapshot, StoredDocument};
pub use self::errors::{BoxError, ErrorKind, LatchError, StoreError};
pub use self::event::{
    ChangeDelivery, CloudEvent, EventContext, SnapshotDelivery, TriggerKind,
};
pub use self::ids::EventId;
pub use self::token::DedupToken;
