//! Handler / Filter - handler と述語の trait
//!
//! # 学習ポイント
//! - オブジェクト安全な async trait（`Arc<dyn EventHandler<P>>` で保持）
//! - blanket impl により `|payload| async move { .. }` がそのまま handler になる
//! - 出力変換 trait（[`Verdict`], [`HandlerOutput`]）でクロージャは素の値でも
//!   `Result` でも返せる

use std::future::Future;

use async_trait::async_trait;

use crate::domain::errors::BoxError;

/// The caller supplied side effect. Runs at most once per event id.
///
/// Its error propagates to whoever invoked the trigger; nothing here
/// retries it.
#[async_trait]
pub trait EventHandler<P>: Send + Sync {
    async fn handle(&self, payload: P) -> Result<(), BoxError>;
}

/// The `should_handle_event` predicate. Runs before any claim is written,
/// possibly several times for duplicate deliveries, so it must not have
/// side effects that matter.
#[async_trait]
pub trait EventFilter<A>: Send + Sync {
    async fn should_handle(&self, args: A) -> Result<bool, BoxError>;
}

/// What a filter closure may resolve to.
pub trait Verdict {
    fn into_verdict(self) -> Result<bool, BoxError>;
}

impl Verdict for bool {
    fn into_verdict(self) -> Result<bool, BoxError> {
        Ok(self)
    }
}

impl<E: Into<BoxError>> Verdict for Result<bool, E> {
    fn into_verdict(self) -> Result<bool, BoxError> {
        self.map_err(Into::into)
    }
}

/// What a handler closure may resolve to.
pub trait HandlerOutput {
    fn into_result(self) -> Result<(), BoxError>;
}

impl HandlerOutput for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> HandlerOutput for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

#[async_trait]
impl<P, F, Fut> EventHandler<P> for F
where
    P: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: HandlerOutput,
{
    async fn handle(&self, payload: P) -> Result<(), BoxError> {
        (self)(payload).await.into_result()
    }
}

#[async_trait]
impl<A, F, Fut> EventFilter<A> for F
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Verdict,
{
    async fn should_handle(&self, args: A) -> Result<bool, BoxError> {
        (self)(args).await.into_verdict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Even;

    #[async_trait]
    impl EventFilter<u32> for Even {
        async fn should_handle(&self, args: u32) -> Result<bool, BoxError> {
            Ok(args % 2 == 0)
        }
    }

    #[tokio::test]
    async fn closures_returning_bool_are_filters() {
        let filter: Arc<dyn EventFilter<u32>> = Arc::new(|n: u32| async move { n > 3 });
        assert!(filter.should_handle(4).await.unwrap());
        assert!(!filter.should_handle(1).await.unwrap());
    }

    #[tokio::test]
    async fn closures_returning_result_are_filters() {
        let filter: Arc<dyn EventFilter<u32>> = Arc::new(|_n: u32| async move {
            Err::<bool, _>(std::io::Error::other("lookup failed"))
        });
        let err = filter.should_handle(1).await.unwrap_err();
        assert_eq!(err.to_string(), "lookup failed");
    }

    #[tokio::test]
    async fn struct_filters_work_through_dyn() {
        let filter: Arc<dyn EventFilter<u32>> = Arc::new(Even);
        assert!(filter.should_handle(2).await.unwrap());
    }

    #[tokio::test]
    async fn unit_and_result_handlers_both_convert() {
        let ok: Arc<dyn EventHandler<String>> = Arc::new(|_s: String| async move {});
        assert!(ok.handle("x".into()).await.is_ok());

        let failing: Arc<dyn EventHandler<String>> = Arc::new(|s: String| async move {
            Err::<(), BoxError>(format!("cannot handle {s}").into())
        });
        let err = failing.handle("x".into()).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot handle x");
    }
}
