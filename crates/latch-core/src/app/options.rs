//! OnceOptions - trigger 構築オプション

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::typed::EventFilter;

/// Deployment settings handed verbatim to the event system that registers
/// the trigger. Nothing in this crate interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_instances: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
}

/// Per-trigger options. `A` is the predicate input of the trigger kind.
///
/// # 使用例
/// ```ignore
/// let options = OnceOptions::new()
///     .should_handle_event(|data: SnapshotArgs| async move { data.is_some() })
///     .events_path("billing-events");
/// ```
pub struct OnceOptions<A> {
    pub(crate) should_handle_event: Option<Arc<dyn EventFilter<A>>>,
    pub(crate) events_path: Option<String>,
    pub(crate) runtime_options: RuntimeOptions,
}

impl<A: Send + 'static> OnceOptions<A> {
    pub fn new() -> Self {
        Self {
            should_handle_event: None,
            events_path: None,
            runtime_options: RuntimeOptions::default(),
        }
    }

    /// Filter evaluated before the event is claimed.
    pub fn should_handle_event<F>(mut self, filter: F) -> Self
    where
        F: EventFilter<A> + 'static,
    {
        self.should_handle_event = Some(Arc::new(filter));
        self
    }

    /// Collection that holds dedup tokens for this trigger.
    pub fn events_path(mut self, path: impl Into<String>) -> Self {
        self.events_path = Some(path.into());
        self
    }

    pub fn runtime_options(mut self, runtime_options: RuntimeOptions) -> Self {
        self.runtime_options = runtime_options;
        self
    }
}

impl<A: Send + 'static> Default for OnceOptions<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for OnceOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceOptions")
            .field("should_handle_event", &self.should_handle_event.is_some())
            .field("events_path", &self.events_path)
            .field("runtime_options", &self.runtime_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::SnapshotArgs;
    use serde_json::json;

    #[test]
    fn runtime_options_use_camel_case() {
        let opts = RuntimeOptions {
            memory: Some("256MB".into()),
            timeout_seconds: Some(60),
            ..Default::default()
        };
        let value = serde_json::to_value(&opts).unwrap();
        assert_eq!(value, json!({ "memory": "256MB", "timeoutSeconds": 60 }));
    }

    #[test]
    fn builder_records_every_option() {
        let opts = OnceOptions::<SnapshotArgs>::new()
            .should_handle_event(|_data: SnapshotArgs| async move { true })
            .events_path("custom-events")
            .runtime_options(RuntimeOptions {
                regions: vec!["asia-northeast1".into()],
                ..Default::default()
            });

        assert!(opts.should_handle_event.is_some());
        assert_eq!(opts.events_path.as_deref(), Some("custom-events"));
        assert_eq!(opts.runtime_options.regions, vec!["asia-northeast1".to_string()]);
    }
}
