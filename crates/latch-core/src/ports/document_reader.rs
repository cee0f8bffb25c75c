//! DocumentReader port - 単一ドキュメントの読み取り
//!
//! claim 経路（[`ConditionalStore`](super::ConditionalStore)）とは独立した読み取り専用の口。
//! 副作用がないので、時間制限（[`with_timeout`](crate::app::with_timeout)）を
//! かけて途中で見捨てても状態は変わらない。
//!
//! # 実装
//! - `InMemoryConditionalStore`
//! - `PostgresConditionalStore` (feature `postgres`)
//! - `TimeBoundedReader`: 他の reader に時間制限を付ける

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::document::StoredDocument;
use crate::domain::errors::StoreError;

/// `collection/key` を読む。存在しなければ `Ok(None)`。
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError>;
}

#[async_trait]
impl<R: DocumentReader + ?Sized> DocumentReader for Arc<R> {
    async fn read(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        (**self).read(collection, key).await
    }
}
