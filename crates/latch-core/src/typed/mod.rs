//! Typed - ペイロードと handler の型
//!
//! # 二層構造
//! - **payload**: [`EventPayload`] が各配送形式を `(event_id, event_type, 述語入力)` に揃える
//! - **handler**: [`EventHandler`] / [`EventFilter`]。trigger が `Arc<dyn ..>` で
//!   持てるようオブジェクト安全。素の async クロージャがどちらも実装する

pub mod handler;
pub mod payload;

pub use self::handler::{EventFilter, EventHandler, HandlerOutput, Verdict};
pub use self::payload::{ChangeArgs, EventPayload, SnapshotArgs};
