//! latch-core - at-least-once 配送の上で「効果は一度だけ」
//!
//! [`OnceTriggers`] のコンストラクタで包んだ handler は、同じ event id が
//! 何度・どれだけ並行に配送されても高々一度しか走らない。相互排他は
//! [`ConditionalStore`](ports::ConditionalStore) のアトミックな create-if-absent
//! だけに依る。
//!
//! # モジュール構成
//! - **domain**: event id, ドキュメント, 配送ペイロード, token, エラー
//! - **ports**: ConditionalStore, DocumentReader, Clock, EventIdGenerator
//! - **impls**: in-memory / Postgres (feature `postgres`) ストア, TimeBoundedReader
//! - **typed**: ペイロードアダプタ, handler / filter trait
//! - **app**: DedupGuard (`setnx`), `with_timeout`, OnceTriggers
//! - **config**: LatchConfig
//!
//! token は期限切れにも削除にもならない。保持期間は運用側の責任。

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{
    DedupGuard, Dispatch, OnceOptions, OnceTriggers, RuntimeOptions, SetNx, TimeLimited,
    TimeoutError, TriggerDefinition, with_timeout,
};
pub use config::LatchConfig;
pub use domain::{EventId, LatchError};
