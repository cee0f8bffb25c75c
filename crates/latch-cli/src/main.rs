use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use latch_core::domain::{
    Change, ChangeDelivery, CloudEvent, DedupToken, DocumentData, DocumentSnapshot, EventContext,
    EventId, SnapshotDelivery, TriggerKind,
};
use latch_core::impls::{InMemoryConditionalStore, TimeBoundedReader};
use latch_core::ports::{
    ConditionalStore, DocumentReader, EventIdGenerator, SystemClock, UlidGenerator,
};
use latch_core::typed::{ChangeArgs, EventPayload, SnapshotArgs};
use latch_core::{
    DedupGuard, Dispatch, LatchConfig, OnceOptions, OnceTriggers, TriggerDefinition,
};

/// Fire duplicate deliveries at the four once-only triggers and report what ran.
#[derive(Debug, Parser)]
#[command(name = "latch", version)]
struct Args {
    /// Collection for dedup tokens (overrides LATCH_EVENTS_PATH).
    #[arg(long)]
    events_path: Option<String>,

    /// Time limit in ms for reading tokens back (overrides LATCH_TIMEOUT_MS).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Concurrent deliveries per event.
    #[arg(long, default_value_t = 3)]
    deliveries: usize,

    /// Watched document path.
    #[arg(long, default_value = "users/{userId}")]
    path: String,

    /// Use Postgres instead of the in-memory store.
    #[cfg(feature = "postgres")]
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

/// handler 呼び出し回数
#[derive(Default)]
struct Counter(AtomicUsize);

impl Counter {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn user(name: &str) -> DocumentData {
    let mut data = DocumentData::new();
    data.insert("name".into(), json!(name));
    data
}

fn user_snapshot(name: &str) -> DocumentSnapshot {
    DocumentSnapshot::new(format!("users/{name}"), user(name))
}

/// 同じストアを claim 用と読み取り用の二つの口で返す
type Store = (Arc<dyn ConditionalStore>, Arc<dyn DocumentReader>);

#[cfg(feature = "postgres")]
async fn open_postgres(url: &str) -> Result<Store> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    let store = latch_core::impls::PostgresConditionalStore::new(pool);
    store.ensure_schema().await.context("Failed to create schema")?;
    let store = Arc::new(store);
    let claims: Arc<dyn ConditionalStore> = store.clone();
    let reads: Arc<dyn DocumentReader> = store;
    Ok((claims, reads))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_url: &str) -> Result<Store> {
    anyhow::bail!("built without the postgres feature")
}

async fn open_store(args: &Args) -> Result<Store> {
    #[cfg(feature = "postgres")]
    let database_url = args.database_url.as_deref();
    #[cfg(not(feature = "postgres"))]
    let database_url: Option<&str> = {
        let _ = args;
        None
    };

    if let Some(url) = database_url {
        tracing::info!("Using Postgres store");
        return open_postgres(url).await;
    }

    tracing::info!("Using in-memory store");
    let store = Arc::new(InMemoryConditionalStore::new());
    let claims: Arc<dyn ConditionalStore> = store.clone();
    let reads: Arc<dyn DocumentReader> = store;
    Ok((claims, reads))
}

/// Delivers `make(id)` `n` times concurrently for one id, then once each for
/// `n` fresh ids. Returns the shared id and (handled, duplicate, filtered).
async fn fire<P, F>(
    trigger: &TriggerDefinition<P>,
    ids: &dyn EventIdGenerator,
    n: usize,
    make: F,
) -> Result<(EventId, (usize, usize, usize))>
where
    P: EventPayload + Clone,
    F: Fn(&str) -> P,
{
    let shared_id = ids.next_event_id();
    let mut payloads: Vec<P> = std::iter::repeat_n(make(shared_id.as_str()), n).collect();
    payloads.extend((0..n).map(|_| make(ids.next_event_id().as_str())));

    let results = join_all(payloads.into_iter().map(|p| trigger.invoke(p))).await;

    let mut tally = (0, 0, 0);
    for result in results {
        match result.with_context(|| format!("{} trigger failed", trigger.kind()))? {
            Dispatch::Handled => tally.0 += 1,
            Dispatch::Duplicate => tally.1 += 1,
            Dispatch::Filtered => tally.2 += 1,
        }
    }
    Ok((shared_id, tally))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,latch_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // (A) 設定: env → CLI フラグで上書き
    let mut config = LatchConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = &args.events_path {
        config.events_path = path.clone();
    }
    if let Some(ms) = args.timeout_ms {
        config.timeout_ms = ms;
    }
    tracing::info!(
        events_path = %config.events_path,
        timeout_ms = config.effective_timeout_ms(),
        "Configuration loaded"
    );

    // (B) ストアと trigger を用意（claim は時間制限なしでストアへ直接）
    let (store, reader) = open_store(&args).await?;
    let reader = TimeBoundedReader::new(reader, Some(config.timeout_ms));
    let triggers = OnceTriggers::new(DedupGuard::new(store), config);
    let ids = UlidGenerator::new(SystemClock);
    let n = args.deliveries.max(1);

    let created = Arc::new(Counter::default());
    let updated = Arc::new(Counter::default());
    let deleted = Arc::new(Counter::default());
    let written = Arc::new(Counter::default());

    let on_create: TriggerDefinition<SnapshotDelivery> = triggers.on_create_once(
        &args.path,
        {
            let created = Arc::clone(&created);
            move |delivery: SnapshotDelivery| {
                let created = Arc::clone(&created);
                async move {
                    tracing::info!(user = delivery.snapshot.id(), "welcome mail sent");
                    created.hit();
                }
            }
        },
        OnceOptions::new().should_handle_event(|data: SnapshotArgs| async move {
            data.is_some_and(|d| d.contains_key("name"))
        }),
    )?;

    let on_update: TriggerDefinition<ChangeDelivery> = triggers.on_update_once(
        &args.path,
        {
            let updated = Arc::clone(&updated);
            move |_delivery: ChangeDelivery| {
                let updated = Arc::clone(&updated);
                async move { updated.hit() }
            }
        },
        OnceOptions::new().should_handle_event(|(after, before): ChangeArgs| async move {
            after != before
        }),
    )?;

    let on_delete: TriggerDefinition<CloudEvent<DocumentSnapshot>> = triggers.on_delete_once(
        &args.path,
        {
            let deleted = Arc::clone(&deleted);
            move |_event: CloudEvent<DocumentSnapshot>| {
                let deleted = Arc::clone(&deleted);
                async move { deleted.hit() }
            }
        },
        OnceOptions::new(),
    )?;

    let on_write: TriggerDefinition<CloudEvent<Change>> = triggers.on_write_once(
        &args.path,
        {
            let written = Arc::clone(&written);
            move |_event: CloudEvent<Change>| {
                let written = Arc::clone(&written);
                async move { written.hit() }
            }
        },
        OnceOptions::new(),
    )?;

    // (C) 重複配送を同時に投げる
    let create_tally = fire(&on_create, &ids, n, |id| {
        SnapshotDelivery::new(
            user_snapshot("aric"),
            EventContext::new(id, TriggerKind::Create.legacy_event_type())
                .with_resource("projects/demo/databases/(default)/documents/users/aric")
                .with_param("userId", "aric"),
        )
    })
    .await?;

    let update_tally = fire(&on_update, &ids, n, |id| {
        ChangeDelivery::new(
            Change::new(user_snapshot("aric"), user_snapshot("juice")),
            EventContext::new(id, TriggerKind::Update.legacy_event_type()),
        )
    })
    .await?;

    let delete_tally = fire(&on_delete, &ids, n, |id| {
        CloudEvent::new(id, TriggerKind::Delete.cloud_event_type(), user_snapshot("miko"))
    })
    .await?;

    let write_tally = fire(&on_write, &ids, n, |id| {
        CloudEvent::new(
            id,
            TriggerKind::Write.cloud_event_type(),
            Change::new(DocumentSnapshot::missing("users/miko"), user_snapshot("miko")),
        )
    })
    .await?;

    // (D) 結果: 1 + n 回（共有 id 1 回 + 個別 id n 回）が期待値
    let expected = 1 + n;
    for (kind, events_path, (shared_id, (handled, duplicate, filtered)), counter) in [
        (TriggerKind::Create, on_create.events_path(), create_tally, &created),
        (TriggerKind::Update, on_update.events_path(), update_tally, &updated),
        (TriggerKind::Delete, on_delete.events_path(), delete_tally, &deleted),
        (TriggerKind::Write, on_write.events_path(), write_tally, &written),
    ] {
        // (E) 共有 id の token を時間制限付きで読み戻す
        let stored = reader
            .read(events_path, shared_id.as_str())
            .await
            .with_context(|| format!("Failed to read {kind} token"))?
            .with_context(|| format!("{kind} token {shared_id} is missing"))?;
        let token = DedupToken::from_document(shared_id, &stored);
        tracing::debug!(
            event_id = %token.event_id,
            event_type = token.event_type.as_deref().unwrap_or("-"),
            created_at = %token.created_at,
            "token read back"
        );

        tracing::info!(
            %kind,
            handled,
            duplicate,
            filtered,
            handler_calls = counter.get(),
            expected,
            "trigger summary"
        );
        anyhow::ensure!(
            counter.get() == expected,
            "{kind} handler ran {} times, expected {expected}",
            counter.get()
        );
    }

    tracing::info!("every event was handled exactly once");
    Ok(())
}
