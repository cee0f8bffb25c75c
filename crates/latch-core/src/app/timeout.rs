//! Timeout - 時間制限付き実行
//!
//! [`with_timeout`] は操作とタイマーを競争させる。操作は独立した tokio タスクとして
//! 走り、タイマーが先に切れたらタスクは abort せず切り離すだけ（誰にも観測されずに
//! 最後まで走る）。時間切れになった操作の副作用は防がれも巻き戻されもしない。

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Limit used when none (or zero) is given.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum TimeoutError<E> {
    /// The timer fired first. The operation is still running.
    #[error("Function execution took more than {millis} ms")]
    Elapsed { millis: u64 },

    /// The operation settled first, with this error.
    #[error("{0}")]
    Failed(E),

    /// The runtime dropped the operation task before it settled.
    #[error("operation was cancelled before it settled")]
    Cancelled,
}

impl<E> TimeoutError<E> {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed { .. })
    }

    /// The operation's own error, if that is what this is.
    pub fn into_failed(self) -> Option<E> {
        match self {
            TimeoutError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// `operation` の各呼び出しを `millis` で制限する。
///
/// `None` と `Some(0)` はどちらも [`DEFAULT_TIMEOUT_MS`]。
///
/// ```ignore
/// let read = with_timeout(|| async { store.load("pets").await }, Some(100));
/// match read.call().await {
///     Ok(pets) => ...,
///     Err(TimeoutError::Elapsed { millis }) => ...,
///     Err(TimeoutError::Failed(e)) => ...,
///     Err(TimeoutError::Cancelled) => ...,
/// }
/// ```
pub fn with_timeout<F>(operation: F, millis: Option<u64>) -> TimeLimited<F> {
    let millis = match millis {
        Some(ms) if ms > 0 => ms,
        _ => DEFAULT_TIMEOUT_MS,
    };
    TimeLimited { operation, millis }
}

/// An operation with a latency bound. See [`with_timeout`].
#[derive(Debug, Clone)]
pub struct TimeLimited<F> {
    operation: F,
    millis: u64,
}

impl<F> TimeLimited<F> {
    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.millis)
    }

    /// Runs a zero-argument operation. Each call is an independent race.
    pub async fn call<Fut, T, E>(&self) -> Result<T, TimeoutError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        race((self.operation)(), self.millis).await
    }

    /// Runs the operation with `args`. Each call is an independent race.
    pub async fn call_with<A, Fut, T, E>(&self, args: A) -> Result<T, TimeoutError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        race((self.operation)(args), self.millis).await
    }
}

async fn race<Fut, T, E>(operation: Fut, millis: u64) -> Result<T, TimeoutError<E>>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut task = tokio::spawn(operation);

    tokio::select! {
        biased;

        joined = &mut task => match joined {
            Ok(result) => result.map_err(TimeoutError::Failed),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(TimeoutError::Cancelled),
        },
        _ = tokio::time::sleep(Duration::from_millis(millis)) => {
            // JoinHandle を捨てるとタスクは切り離される（abort はしない）
            drop(task);
            warn!(millis, "operation exceeded its time limit; left running in background");
            Err(TimeoutError::Elapsed { millis })
        }
    }
}
