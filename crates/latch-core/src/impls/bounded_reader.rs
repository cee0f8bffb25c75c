//! TimeBoundedReader - 読み取りの時間制限
//!
//! 内側の reader への `read` を [`with_timeout`] で包む。制限を超えた呼び出しは
//! [`StoreError::Unavailable`] で失敗するが、読み取り自体はキャンセルされず
//! バックグラウンドで走り切る。読み取りには副作用がないので見捨てても安全。
//!
//! claim（`create_if_absent`）には使わないこと。書き込みを途中で見捨てると
//! 「失敗と報告したのに claim 済み」になり、handler が一度も走らなくなる。

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::timeout::{TimeoutError, with_timeout};
use crate::domain::document::StoredDocument;
use crate::domain::errors::StoreError;
use crate::ports::DocumentReader;

pub struct TimeBoundedReader<R: ?Sized> {
    inner: Arc<R>,
    millis: Option<u64>,
}

impl<R: ?Sized> TimeBoundedReader<R> {
    /// `millis` は [`with_timeout`] と同じ扱い（`None` / `Some(0)` は既定値）。
    pub fn new(inner: Arc<R>, millis: Option<u64>) -> Self {
        Self { inner, millis }
    }
}

#[async_trait]
impl<R: DocumentReader + ?Sized + 'static> DocumentReader for TimeBoundedReader<R> {
    async fn read(&self, collection: &str, key: &str) -> Result<Option<StoredDocument>, StoreError> {
        let inner = Arc::clone(&self.inner);
        let bounded = with_timeout(
            move |(collection, key): (String, String)| {
                let inner = Arc::clone(&inner);
                async move { inner.read(&collection, &key).await }
            },
            self.millis,
        );

        match bounded.call_with((collection.to_string(), key.to_string())).await {
            Ok(found) => Ok(found),
            Err(TimeoutError::Failed(err)) => Err(err),
            Err(err) => Err(StoreError::Unavailable(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentData;
    use crate::impls::InMemoryConditionalStore;
    use crate::ports::ConditionalStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Delays every read, then forwards it.
    struct SlowReader {
        delay: Duration,
        finished: AtomicUsize,
        inner: InMemoryConditionalStore,
    }

    #[async_trait]
    impl DocumentReader for SlowReader {
        async fn read(
            &self,
            collection: &str,
            key: &str,
        ) -> Result<Option<StoredDocument>, StoreError> {
            tokio::time::sleep(self.delay).await;
            let found = self.inner.read(collection, key).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            found
        }
    }

    async fn slow(ms: u64) -> Arc<SlowReader> {
        let inner = InMemoryConditionalStore::new();
        inner
            .create_if_absent("events", "e1", DocumentData::new())
            .await
            .unwrap();
        Arc::new(SlowReader {
            delay: Duration::from_millis(ms),
            finished: AtomicUsize::new(0),
            inner,
        })
    }

    #[tokio::test]
    async fn fast_reads_pass_through() {
        let reader = TimeBoundedReader::new(slow(5).await, Some(500));

        assert!(reader.read("events", "e1").await.unwrap().is_some());
        assert!(reader.read("events", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slow_read_fails_as_unavailable() {
        let reader = TimeBoundedReader::new(slow(300).await, Some(50));

        let err = reader.read("events", "e1").await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.to_string().contains("more than 50 ms"));
    }

    #[tokio::test]
    async fn timed_out_read_still_finishes_in_background() {
        let inner = slow(150).await;
        let reader = TimeBoundedReader::new(Arc::clone(&inner), Some(20));

        assert!(reader.read("events", "e1").await.is_err());
        assert_eq!(inner.finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(inner.finished.load(Ordering::SeqCst), 1);
    }
}
