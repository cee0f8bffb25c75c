//! InMemoryConditionalStore - 開発用の条件付きストア
//!
//! マップ全体を一つの `tokio::sync::Mutex` で守り、存在確認と挿入を同じ
//! クリティカルセクションで行う。create-if-absent の原子性はこれだけに依る。
//! 一プロセス内でのみ有効。

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::document::{DocumentData, StoredDocument};
use crate::domain::errors::StoreError;
use crate::ports::{Clock, ConditionalStore, CreateOutcome, DocumentReader, SystemClock};

type Collections = HashMap<String, HashMap<String, StoredDocument>>;

pub struct InMemoryConditionalStore<C = SystemClock> {
    collections: Mutex<Collections>,
    clock: C,
}

impl InMemoryConditionalStore {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryConditionalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryConditionalStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub async fn get(&self, collection: &str, key: &str) -> Option<StoredDocument> {
        let collections = self.collections.lock().await;
        collections.get(collection)?.get(key).cloned()
    }

    pub async fn contains(&self, collection: &str, key: &str) -> bool {
        self.get(collection, key).await.is_some()
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.lock().await;
        collections.get(collection).map_or(0, HashMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl<C: Clock> ConditionalStore for InMemoryConditionalStore<C> {
    async fn create_if_absent(
        &self,
        collection: &str,
        key: &str,
        data: DocumentData,
    ) -> Result<CreateOutcome, StoreError> {
        let mut collections = self.collections.lock().await;
        let documents = collections.entry(collection.to_string()).or_default();

        match documents.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(CreateOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(StoredDocument {
                    data,
                    created_at: self.clock.now(),
                });
                Ok(CreateOutcome::Created)
            }
        }
    }
}

#[async_trait]
impl<C: Clock> DocumentReader for InMemoryConditionalStore<C> {
    async fn read(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self.get(collection, key).await)
    }
}
