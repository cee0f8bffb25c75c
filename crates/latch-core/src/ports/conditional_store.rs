//! ConditionalStore port - アトミックな create-if-absent
//!
//! # 実装
//! - `InMemoryConditionalStore`: プロセス内。テスト・デモ用
//! - `PostgresConditionalStore` (feature `postgres`): `INSERT .. ON CONFLICT DO NOTHING`
//!
//! 結果は `Created` / `Conflict` / `StoreError` の三つだけ。時間制限で
//! 打ち切る実装は「失敗と報告したのに書き込まれた」第四の状態を生むので置かない。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::document::DocumentData;
use crate::domain::errors::StoreError;

/// Result of a successful round trip to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateOutcome {
    /// The document did not exist and now does, with our data.
    Created,
    /// The document already existed. Nothing was written.
    Conflict,
}

/// A document store with an atomic "create, fail if it exists" operation.
///
/// # 設計原則
/// - Concurrent callers racing on one `(collection, key)` see exactly one
///   `Created`; every other caller sees `Conflict`.
/// - No caller may observe an "exists" state that later disappears.
/// - A check followed by a separate insert does not satisfy this contract.
/// - Any failure other than the key existing is a [`StoreError`].
#[async_trait]
pub trait ConditionalStore: Send + Sync {
    async fn create_if_absent(
        &self,
        collection: &str,
        key: &str,
        data: DocumentData,
    ) -> Result<CreateOutcome, StoreError>;
}

#[async_trait]
impl<S: ConditionalStore + ?Sized> ConditionalStore for Arc<S> {
    async fn create_if_absent(
        &self,
        collection: &str,
        key: &str,
        data: DocumentData,
    ) -> Result<CreateOutcome, StoreError> {
        (**self).create_if_absent(collection, key, data).await
    }
}
