//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **DedupGuard**: ConditionalStore 上の `setnx`
//! - **with_timeout**: キャンセルしない時間制限
//! - **OnceTriggers**: 4 種類の `on_*_once` コンストラクタ
//! - **TriggerDefinition**: 配送ごとの claim → 実行

pub mod guard;
pub mod options;
pub mod timeout;
pub mod trigger;

pub use self::guard::{DedupGuard, SetNx};
pub use self::options::{OnceOptions, RuntimeOptions};
pub use self::timeout::{DEFAULT_TIMEOUT_MS, TimeLimited, TimeoutError, with_timeout};
pub use self::trigger::{Dispatch, OnceTriggers, TriggerDefinition};
