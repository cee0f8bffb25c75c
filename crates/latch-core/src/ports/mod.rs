//! Ports - 抽象化レイヤー
//!
//! 外部との境界。正しさに関わるのはストアだけで、claim はすべて
//! [`ConditionalStore::create_if_absent`] を通る。このクレートはその上に
//! プロセス内ロックを重ねない。読み取り（[`DocumentReader`]）は claim とは別の口。

pub mod clock;
pub mod conditional_store;
pub mod document_reader;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::conditional_store::{ConditionalStore, CreateOutcome};
pub use self::document_reader::DocumentReader;
pub use self::id_generator::{EventIdGenerator, UlidGenerator};
pub use crate::domain::errors::StoreError;
