//! Impls - ポートの実装
//!
//! # 含まれる実装
//! - **InMemoryConditionalStore**: プロセス内ストア（テスト・デモ用）
//! - **TimeBoundedReader**: 読み取りに時間制限を付けるラッパー
//! - **PostgresConditionalStore** (feature `postgres`): 本番用ストア

pub mod bounded_reader;
pub mod inmem_store;
#[cfg(feature = "postgres")]
pub mod pg_store;

pub use self::bounded_reader::TimeBoundedReader;
pub use self::inmem_store::InMemoryConditionalStore;
#[cfg(feature = "postgres")]
pub use self::pg_store::PostgresConditionalStore;
