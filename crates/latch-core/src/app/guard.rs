//! DedupGuard - 「キーごとに高々一度」
//!
//! `setnx` はストアのアトミックな create を claim に変える。create に勝った
//! 呼び出しがそのキーの最初で唯一の claimant。負けるのは正常系でありエラーではない。
//! guard 自身はロックを持たない（claim は別プロセスからも来るので、判定者はストアだけ）。

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::document::DocumentData;
use crate::domain::errors::LatchError;
use crate::ports::{ConditionalStore, CreateOutcome};

/// Outcome of [`DedupGuard::setnx`]. Converts to `1` / `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SetNx {
    /// Someone else already created the document.
    Exists = 0,
    /// This call created the document.
    Created = 1,
}

impl SetNx {
    pub fn is_created(self) -> bool {
        self == SetNx::Created
    }
}

impl From<SetNx> for u8 {
    fn from(value: SetNx) -> Self {
        value as u8
    }
}

impl From<CreateOutcome> for SetNx {
    fn from(outcome: CreateOutcome) -> Self {
        match outcome {
            CreateOutcome::Created => SetNx::Created,
            CreateOutcome::Conflict => SetNx::Exists,
        }
    }
}

/// [`ConditionalStore`] 経由でキーを claim する。
///
/// clone は安価で、同じストアハンドルを共有する。
#[derive(Clone)]
pub struct DedupGuard {
    store: Arc<dyn ConditionalStore>,
}

impl DedupGuard {
    pub fn new(store: Arc<dyn ConditionalStore>) -> Self {
        Self { store }
    }

    /// Creates `collection_path/document_path` with `data` unless it exists.
    ///
    /// # Errors
    /// - [`LatchError::Validation`] when either path is empty (no I/O done)
    /// - [`LatchError::Storage`] for any store failure other than conflict
    #[instrument(level = "debug", skip(self, data))]
    pub async fn setnx(
        &self,
        collection_path: &str,
        document_path: &str,
        data: DocumentData,
    ) -> Result<SetNx, LatchError> {
        if collection_path.is_empty() {
            return Err(LatchError::validation(
                "\"collectionPath\" is not allowed to be empty",
            ));
        }
        if document_path.is_empty() {
            return Err(LatchError::validation(
                "\"documentPath\" is not allowed to be empty",
            ));
        }

        let outcome = self
            .store
            .create_if_absent(collection_path, document_path, data)
            .await?;

        if outcome == CreateOutcome::Conflict {
            debug!("document already exists");
        }
        Ok(outcome.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreError;
    use crate::impls::InMemoryConditionalStore;
    use crate::ports::UlidGenerator;
    use crate::ports::{EventIdGenerator, SystemClock};

    use async_trait::async_trait;
    use futures::future::join_all;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pet(name: &str) -> DocumentData {
        json!({ "name": name }).as_object().cloned().unwrap()
    }

    fn sum(results: Vec<Result<SetNx, LatchError>>) -> u32 {
        results
            .into_iter()
            .map(|r| u32::from(u8::from(r.unwrap())))
            .sum()
    }

    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConditionalStore for FailingStore {
        async fn create_if_absent(
            &self,
            _collection: &str,
            _key: &str,
            _data: DocumentData,
        ) -> Result<CreateOutcome, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("permission denied".into()))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_documents_are_all_created() {
        let guard = DedupGuard::new(Arc::new(InMemoryConditionalStore::new()));
        let ids = UlidGenerator::new(SystemClock);

        let results = join_all([
            guard.setnx("pets", ids.next_event_id().as_str(), pet("juice")),
            guard.setnx("pets", ids.next_event_id().as_str(), pet("aric")),
            guard.setnx("pets", ids.next_event_id().as_str(), pet("miko")),
        ])
        .await;

        assert_eq!(sum(results), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_document_is_created_once() {
        let guard = DedupGuard::new(Arc::new(InMemoryConditionalStore::new()));
        let id = UlidGenerator::new(SystemClock).next_event_id();

        let results = join_all([
            guard.setnx("pets", id.as_str(), pet("juice")),
            guard.setnx("pets", id.as_str(), pet("aric")),
            guard.setnx("pets", id.as_str(), pet("miko")),
        ])
        .await;

        assert_eq!(sum(results), 1);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(32)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exactly_one_of_n_claimants_wins(#[case] n: usize) {
        let store = Arc::new(InMemoryConditionalStore::new());
        let guard = DedupGuard::new(store.clone());

        let handles: Vec<_> = (0..n)
            .map(|i| {
                let guard = guard.clone();
                tokio::spawn(async move {
                    guard
                        .setnx("events", "evt-shared", pet(&format!("claimant-{i}")))
                        .await
                })
            })
            .collect();

        let results: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(sum(results), 1);
        assert_eq!(store.len("events").await, 1);
    }

    #[rstest]
    #[case("", "doc", "\"collectionPath\" is not allowed to be empty")]
    #[case("pets", "", "\"documentPath\" is not allowed to be empty")]
    #[tokio::test]
    async fn empty_paths_fail_before_touching_storage(
        #[case] collection: &str,
        #[case] document: &str,
        #[case] message: &str,
    ) {
        let store = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let guard = DedupGuard::new(store.clone());

        let err = guard.setnx(collection, document, pet("aric")).await.unwrap_err();

        assert!(matches!(err, LatchError::Validation(_)));
        assert_eq!(err.to_string(), message);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unexpected_storage_errors_propagate() {
        let guard = DedupGuard::new(Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        }));

        let err = guard.setnx("pets", "doc", pet("aric")).await.unwrap_err();

        assert!(matches!(
            err,
            LatchError::Storage(StoreError::Backend(ref msg)) if msg == "permission denied"
        ));
    }

    #[tokio::test]
    async fn conflict_leaves_the_first_document_untouched() {
        let store = Arc::new(InMemoryConditionalStore::new());
        let guard = DedupGuard::new(store.clone());

        assert_eq!(guard.setnx("pets", "p1", pet("juice")).await.unwrap(), SetNx::Created);
        assert_eq!(guard.setnx("pets", "p1", pet("aric")).await.unwrap(), SetNx::Exists);

        let doc = store.get("pets", "p1").await.unwrap();
        assert_eq!(doc.data, pet("juice"));
    }
}
