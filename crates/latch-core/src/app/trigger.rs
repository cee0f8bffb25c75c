//! Triggers - event id ごとに handler を高々一度実行
//!
//! # フロー（1 配送あたり）
//! 1. `should_handle_event` があれば評価。false なら終了（token は書かない）
//! 2. `setnx(events_path, event_id, { eventType })` で claim
//! 3. 既に存在すれば終了（重複配送）
//! 4. claim できたら handler に元のペイロードを渡す
//!
//! event id ごとの遷移は `Unclaimed -> Claimed` のみで、決めるのはストア。
//! 4 つの `on_*_once` は同じアルゴリズムで、違うのはペイロードが述語に渡す入力
//! （[`SnapshotArgs`] か [`ChangeArgs`]）だけ。

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span};

use crate::app::guard::{DedupGuard, SetNx};
use crate::app::options::{OnceOptions, RuntimeOptions};
use crate::config::LatchConfig;
use crate::domain::errors::LatchError;
use crate::domain::event::TriggerKind;
use crate::domain::token::DedupToken;
use crate::typed::{ChangeArgs, EventFilter, EventHandler, EventPayload, SnapshotArgs};

/// 1 配送の結果。どれも失敗ではない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// This delivery claimed the event and the handler succeeded.
    Handled,
    /// `should_handle_event` said no. Nothing was written.
    Filtered,
    /// Another delivery already claimed this event.
    Duplicate,
}

/// 一つの DedupGuard と既定設定を共有する trigger を作る。
///
/// # 使用例
/// ```ignore
/// let triggers = OnceTriggers::new(DedupGuard::new(store), LatchConfig::default());
/// let welcome: TriggerDefinition<SnapshotDelivery> = triggers.on_create_once(
///     "users/{userId}",
///     |delivery: SnapshotDelivery| async move { send_welcome(delivery).await },
///     OnceOptions::new(),
/// )?;
/// welcome.invoke(delivery).await?;
/// ```
#[derive(Clone)]
pub struct OnceTriggers {
    guard: DedupGuard,
    config: LatchConfig,
}

impl OnceTriggers {
    pub fn new(guard: DedupGuard, config: LatchConfig) -> Self {
        Self { guard, config }
    }

    /// Document created for the first time.
    pub fn on_create_once<P, H>(
        &self,
        path: &str,
        handler: H,
        options: OnceOptions<SnapshotArgs>,
    ) -> Result<TriggerDefinition<P>, LatchError>
    where
        P: EventPayload<Args = SnapshotArgs>,
        H: EventHandler<P> + 'static,
    {
        self.build(TriggerKind::Create, path, Arc::new(handler), options)
    }

    /// Existing document changed.
    pub fn on_update_once<P, H>(
        &self,
        path: &str,
        handler: H,
        options: OnceOptions<ChangeArgs>,
    ) -> Result<TriggerDefinition<P>, LatchError>
    where
        P: EventPayload<Args = ChangeArgs>,
        H: EventHandler<P> + 'static,
    {
        self.build(TriggerKind::Update, path, Arc::new(handler), options)
    }

    /// Document deleted.
    pub fn on_delete_once<P, H>(
        &self,
        path: &str,
        handler: H,
        options: OnceOptions<SnapshotArgs>,
    ) -> Result<TriggerDefinition<P>, LatchError>
    where
        P: EventPayload<Args = SnapshotArgs>,
        H: EventHandler<P> + 'static,
    {
        self.build(TriggerKind::Delete, path, Arc::new(handler), options)
    }

    /// Any create, update or delete.
    pub fn on_write_once<P, H>(
        &self,
        path: &str,
        handler: H,
        options: OnceOptions<ChangeArgs>,
    ) -> Result<TriggerDefinition<P>, LatchError>
    where
        P: EventPayload<Args = ChangeArgs>,
        H: EventHandler<P> + 'static,
    {
        self.build(TriggerKind::Write, path, Arc::new(handler), options)
    }

    fn build<P: EventPayload>(
        &self,
        kind: TriggerKind,
        path: &str,
        handler: Arc<dyn EventHandler<P>>,
        options: OnceOptions<P::Args>,
    ) -> Result<TriggerDefinition<P>, LatchError> {
        if path.is_empty() {
            return Err(LatchError::validation("\"path\" must be a non-empty string"));
        }

        let events_path = match options.events_path {
            Some(p) if p.is_empty() => {
                return Err(LatchError::validation(
                    "\"options.events_path\" must be a non-empty string",
                ));
            }
            Some(p) => p,
            None => self.config.events_path.clone(),
        };

        Ok(TriggerDefinition {
            kind,
            path: path.to_string(),
            runtime_options: options.runtime_options,
            run: Arc::new(RunOnce {
                guard: self.guard.clone(),
                events_path,
                filter: options.should_handle_event,
                handler,
            }),
        })
    }
}

/// 検証済みの trigger。イベントシステムに登録し、配送ごとに呼ぶ。
pub struct TriggerDefinition<P: EventPayload> {
    kind: TriggerKind,
    path: String,
    runtime_options: RuntimeOptions,
    run: Arc<RunOnce<P>>,
}

impl<P: EventPayload> TriggerDefinition<P> {
    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Watched document path, e.g. `users/{userId}`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn runtime_options(&self) -> &RuntimeOptions {
        &self.runtime_options
    }

    /// Collection the dedup tokens go to.
    pub fn events_path(&self) -> &str {
        &self.run.events_path
    }

    /// Handles one delivery.
    ///
    /// # Errors
    /// - [`LatchError::Filter`] if `should_handle_event` failed
    /// - [`LatchError::Storage`] / [`LatchError::Validation`] from the claim
    /// - [`LatchError::Handler`] if the handler failed after the claim; a
    ///   redelivery of the same event id is then dropped as a duplicate
    pub async fn invoke(&self, payload: P) -> Result<Dispatch, LatchError> {
        let span = info_span!(
            "trigger",
            kind = %self.kind,
            path = %self.path,
            event_id = %payload.event_id(),
        );
        self.run.run(payload).instrument(span).await
    }
}

impl<P: EventPayload> Clone for TriggerDefinition<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            path: self.path.clone(),
            runtime_options: self.runtime_options.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<P: EventPayload> fmt::Debug for TriggerDefinition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerDefinition")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("events_path", &self.run.events_path)
            .field("runtime_options", &self.runtime_options)
            .finish()
    }
}

/// 全 trigger 種別で共通の claim → 実行アルゴリズム。
struct RunOnce<P: EventPayload> {
    guard: DedupGuard,
    events_path: String,
    filter: Option<Arc<dyn EventFilter<P::Args>>>,
    handler: Arc<dyn EventHandler<P>>,
}

impl<P: EventPayload> RunOnce<P> {
    async fn run(&self, payload: P) -> Result<Dispatch, LatchError> {
        // claim より先に filter: 弾いたイベントは token を残さない
        if let Some(filter) = &self.filter {
            let should = filter
                .should_handle(payload.predicate_args())
                .await
                .map_err(LatchError::Filter)?;
            if !should {
                debug!("event filtered out by shouldHandleEvent");
                return Ok(Dispatch::Filtered);
            }
        }

        let claim = self
            .guard
            .setnx(
                &self.events_path,
                payload.event_id().as_str(),
                DedupToken::claim_data(payload.event_type()),
            )
            .await?;

        if claim == SetNx::Exists {
            debug!("event already claimed; dropping duplicate delivery");
            return Ok(Dispatch::Duplicate);
        }

        info!("event claimed; running handler");
        self.handler
            .handle(payload)
            .await
            .map_err(LatchError::Handler)?;

        Ok(Dispatch::Handled)
    }
}
