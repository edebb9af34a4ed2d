//! Per-instance widget runtime.
//!
//! A [`Widget`] is the host's handle to one placed widget. Spawning it starts
//! a task that merges the initial fetch, manual refreshes, the periodic timer
//! and realtime pushes into a single [`WidgetState`], published through a
//! `watch` channel.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera_widgets::{JsonWidget, MockDataProvider, Widget, WidgetContext, WidgetDataSource, WidgetInputs};
//!
//! # async fn example() {
//! let ctx = WidgetContext::new(Arc::new(MockDataProvider::default()));
//! let inputs = WidgetInputs::new("kpi-1")
//!     .with_data_source(WidgetDataSource::endpoint("/api/kpi/revenue").with_refresh_interval(30_000));
//! let widget = Widget::spawn(JsonWidget::default(), inputs, &ctx);
//!
//! let mut state = widget.subscribe();
//! let loaded = state.wait_for(|s| s.data.is_some()).await;
//! # let _ = loaded;
//! # }
//! ```

mod context;
mod runtime;

pub use context::{OverlapPolicy, WidgetContext};

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{WidgetError, WidgetResult};
use crate::types::{ConfigChange, WidgetDataSource, WidgetDefinition, merge_config};

use runtime::{Command, Runtime};

/// What a concrete widget type supplies.
pub trait WidgetBehavior: Send + Sync + 'static {
    /// Type-specific configuration.
    type Config: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    /// Type-specific data model.
    type Data: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Default configuration for this widget type.
    fn default_config(&self) -> Self::Config;

    /// Reshape a raw payload into the widget's data model.
    ///
    /// The default decodes the payload as [`Self::Data`].
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Transform`] if the payload does not fit.
    fn transform_data(&self, raw: Value) -> WidgetResult<Self::Data> {
        Ok(serde_json::from_value(raw)?)
    }

    /// Turn a failure into the message shown on the widget.
    fn handle_error(&self, error: &WidgetError) -> String {
        error.display_message()
    }
}

/// Untyped widget working on raw JSON, used for placements resolved from
/// the registry at run time.
#[derive(Debug, Clone)]
pub struct JsonWidget {
    default_config: Value,
}

impl JsonWidget {
    /// Widget with the given default configuration.
    #[must_use]
    pub const fn new(default_config: Value) -> Self {
        Self { default_config }
    }

    /// Widget using a definition's default configuration.
    #[must_use]
    pub fn from_definition(definition: &WidgetDefinition) -> Self {
        Self::new(definition.default_config.clone())
    }
}

impl Default for JsonWidget {
    fn default() -> Self {
        Self::new(Value::Object(serde_json::Map::new()))
    }
}

impl WidgetBehavior for JsonWidget {
    type Config = Value;
    type Data = Value;

    fn default_config(&self) -> Value {
        self.default_config.clone()
    }

    fn transform_data(&self, raw: Value) -> WidgetResult<Value> {
        Ok(raw)
    }
}

/// Conceptual phase of a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    /// Nothing loaded and nothing in flight.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last update succeeded.
    Loaded,
    /// The last fetch failed after all retries.
    Failed,
}

/// Observable state of one widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState<D> {
    /// Last known value.
    pub data: Option<D>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Last error message, cleared when a new fetch starts.
    pub error: Option<String>,
    /// Epoch milliseconds of the last successful data assignment.
    pub last_updated: Option<i64>,
}

impl<D> Default for WidgetState<D> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

impl<D> WidgetState<D> {
    /// Phase derived from the state fields.
    #[must_use]
    pub const fn phase(&self) -> WidgetPhase {
        if self.loading {
            WidgetPhase::Loading
        } else if self.error.is_some() {
            WidgetPhase::Failed
        } else if self.data.is_some() {
            WidgetPhase::Loaded
        } else {
            WidgetPhase::Idle
        }
    }
}

/// Host-supplied inputs for one widget instance.
#[derive(Debug, Clone)]
pub struct WidgetInputs<D> {
    /// Unique placement id.
    pub instance_id: String,
    /// Instance configuration overrides (a JSON object).
    pub config: Value,
    /// Optional data source.
    pub data_source: Option<WidgetDataSource>,
    /// Whether the dashboard is in edit mode. Rendering only.
    pub is_editing: bool,
    /// Pre-fetched value that replaces any network loading.
    pub initial_data: Option<D>,
}

impl<D> WidgetInputs<D> {
    /// Inputs with an empty config and no data source.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            config: Value::Object(serde_json::Map::new()),
            data_source: None,
            is_editing: false,
            initial_data: None,
        }
    }

    /// Set the configuration overrides.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Set the data source.
    #[must_use]
    pub fn with_data_source(mut self, source: WidgetDataSource) -> Self {
        self.data_source = Some(source);
        self
    }

    /// Set the initial data.
    #[must_use]
    pub fn with_initial_data(mut self, data: D) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Set edit mode.
    #[must_use]
    pub const fn editing(mut self, is_editing: bool) -> Self {
        self.is_editing = is_editing;
        self
    }
}

/// Host handle to a running widget instance.
///
/// Dropping the handle stops the runtime, its timer and its realtime
/// subscription.
pub struct Widget<B: WidgetBehavior> {
    instance_id: String,
    behavior: Arc<B>,
    config: Value,
    is_editing: bool,
    state: watch::Receiver<WidgetState<B::Data>>,
    commands: mpsc::UnboundedSender<Command<B::Data>>,
    config_changes: broadcast::Sender<ConfigChange>,
    task: Option<JoinHandle<()>>,
}

impl<B: WidgetBehavior> Widget<B> {
    /// Spawn the runtime for one instance.
    ///
    /// Initial data, if given, is applied before this returns. Must be
    /// called from within a Tokio runtime.
    pub fn spawn(behavior: B, inputs: WidgetInputs<B::Data>, ctx: &WidgetContext) -> Self {
        let WidgetInputs {
            instance_id,
            config,
            data_source,
            is_editing,
            initial_data,
        } = inputs;

        let has_initial_data = initial_data.is_some();
        let initial_state = match initial_data {
            Some(data) => WidgetState {
                data: Some(data),
                last_updated: Some(chrono::Utc::now().timestamp_millis()),
                ..WidgetState::default()
            },
            None => WidgetState::default(),
        };

        let behavior = Arc::new(behavior);
        let (state_tx, state_rx) = watch::channel(initial_state);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (config_tx, _) = broadcast::channel(64);

        let runtime = Runtime::new(
            instance_id.clone(),
            Arc::clone(&behavior),
            ctx.clone(),
            data_source,
            has_initial_data,
            state_tx,
        );
        let task = tokio::spawn(runtime.run(command_rx));

        debug!(instance_id = %instance_id, "widget spawned");

        Self {
            instance_id,
            behavior,
            config,
            is_editing,
            state: state_rx,
            commands: command_tx,
            config_changes: config_tx,
            task: Some(task),
        }
    }

    /// Placement id.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The widget type's behavior.
    #[must_use]
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> WidgetState<B::Data> {
        self.state.borrow().clone()
    }

    /// Last known value.
    #[must_use]
    pub fn data(&self) -> Option<B::Data> {
        self.state.borrow().data.clone()
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Last error message.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Epoch milliseconds of the last successful update.
    #[must_use]
    pub fn last_updated(&self) -> Option<i64> {
        self.state.borrow().last_updated
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WidgetPhase {
        self.state.borrow().phase()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WidgetState<B::Data>> {
        self.state.clone()
    }

    /// Fetch now. The periodic timer keeps its schedule.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Closed`] if the runtime has stopped.
    pub fn refresh(&self) -> WidgetResult<()> {
        self.send(Command::Refresh)
    }

    /// Replace the data source. Triggers a fresh load unless initial data
    /// overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Closed`] if the runtime has stopped.
    pub fn set_data_source(&self, source: Option<WidgetDataSource>) -> WidgetResult<()> {
        self.send(Command::SetDataSource(source))
    }

    /// Replace the initial-data override. `None` returns the widget to
    /// loading from its data source.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Closed`] if the runtime has stopped.
    pub fn set_initial_data(&self, data: Option<B::Data>) -> WidgetResult<()> {
        self.send(Command::SetInitialData(data))
    }

    /// Configuration resolved over the type defaults.
    ///
    /// Falls back to the defaults if the overrides do not fit the type.
    #[must_use]
    pub fn config(&self) -> B::Config {
        let defaults = self.behavior.default_config();
        let Ok(default_json) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        match serde_json::from_value(merge_config(&default_json, &self.config)) {
            Ok(config) => config,
            Err(e) => {
                warn!(instance_id = %self.instance_id, error = %e, "invalid widget config, using defaults");
                defaults
            }
        }
    }

    /// Raw configuration overrides as supplied by the host.
    #[must_use]
    pub fn raw_config(&self) -> &Value {
        &self.config
    }

    /// Replace the configuration overrides.
    pub fn set_config(&mut self, config: Value) {
        self.config = config;
    }

    /// Whether the dashboard is in edit mode.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.is_editing
    }

    /// Set edit mode. Data behaviour is unaffected.
    pub fn set_editing(&mut self, is_editing: bool) {
        self.is_editing = is_editing;
    }

    /// Emit a configuration-change request for the host to persist.
    ///
    /// Returns the number of listeners that received it.
    pub fn request_config_change(&self, changes: Value) -> usize {
        let change = ConfigChange {
            instance_id: self.instance_id.clone(),
            changes,
        };
        self.config_changes.send(change).unwrap_or(0)
    }

    /// Listen for configuration-change requests.
    #[must_use]
    pub fn config_changes(&self) -> broadcast::Receiver<ConfigChange> {
        self.config_changes.subscribe()
    }

    /// Whether the runtime task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the runtime and wait for it to finish.
    pub async fn destroy(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(instance_id = %self.instance_id, error = %e, "widget runtime ended abnormally");
            }
        }
    }

    fn send(&self, command: Command<B::Data>) -> WidgetResult<()> {
        self.commands.send(command).map_err(|_| WidgetError::Closed)
    }
}

impl<B: WidgetBehavior> Drop for Widget<B> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<B: WidgetBehavior> std::fmt::Debug for Widget<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("instance_id", &self.instance_id)
            .field("is_editing", &self.is_editing)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticDataProvider;
    use crate::realtime::BroadcastRealtimeProvider;
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use std::time::Duration;

    fn make_ctx(provider: &Arc<StaticDataProvider>) -> WidgetContext {
        WidgetContext::new(provider.clone())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_phase_from_state() {
        let mut state = WidgetState::<Value>::default();
        assert_eq!(state.phase(), WidgetPhase::Idle);

        state.loading = true;
        assert_eq!(state.phase(), WidgetPhase::Loading);

        state.loading = false;
        state.data = Some(json!(1));
        assert_eq!(state.phase(), WidgetPhase::Loaded);

        state.error = Some("down".into());
        assert_eq!(state.phase(), WidgetPhase::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_loads_data() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/kpi", json!({ "value": 10 }));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &make_ctx(&provider),
        );

        let mut rx = widget.subscribe();
        rx.wait_for(|s| s.data.is_some()).await.unwrap();

        assert_eq!(widget.data(), Some(json!({ "value": 10 })));
        assert!(!widget.loading());
        assert!(widget.error().is_none());
        assert!(widget.last_updated().is_some());
        assert_eq!(provider.call_count("/api/kpi"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_source_never_fetches() {
        let provider = Arc::new(StaticDataProvider::new());

        let widget = Widget::spawn(JsonWidget::default(), WidgetInputs::new("w1"), &make_ctx(&provider));
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(widget.phase(), WidgetPhase::Idle);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_data_skips_network() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/kpi", json!({ "value": 1 }));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1")
                .with_data_source(WidgetDataSource::endpoint("/api/kpi").with_refresh_interval(1000))
                .with_initial_data(json!({ "value": 99 })),
            &make_ctx(&provider),
        );

        assert_eq!(widget.data(), Some(json!({ "value": 99 })));
        assert!(widget.last_updated().is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(provider.total_calls(), 0);
        assert_eq!(widget.data(), Some(json!({ "value": 99 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_stale_data() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/kpi", json!({ "value": 1 }));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &make_ctx(&provider),
        );
        let mut rx = widget.subscribe();
        rx.wait_for(|s| s.data.is_some()).await.unwrap();

        provider.fail("/api/kpi", "Service down");
        widget.refresh().unwrap();
        rx.wait_for(|s| s.error.is_some()).await.unwrap();

        let state = widget.state();
        assert_eq!(state.error.as_deref(), Some("Service down"));
        assert_eq!(state.data, Some(json!({ "value": 1 })));
        assert!(!state.loading);
        assert_eq!(state.phase(), WidgetPhase::Failed);
        assert_eq!(provider.call_count("/api/kpi"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_retry_policy() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.fail("/api/kpi", "down");
        let ctx = make_ctx(&provider).with_retry_policy(RetryPolicy::none());

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &ctx,
        );
        widget.subscribe().wait_for(|s| s.error.is_some()).await.unwrap();

        assert_eq!(provider.call_count("/api/kpi"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_keeps_timer_schedule() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/kpi", json!(1));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1")
                .with_data_source(WidgetDataSource::endpoint("/api/kpi").with_refresh_interval(1000)),
            &make_ctx(&provider),
        );
        settle().await;
        assert_eq!(provider.call_count("/api/kpi"), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        widget.refresh().unwrap();
        settle().await;
        assert_eq!(provider.call_count("/api/kpi"), 2);

        // The timer still fires one interval after spawn, not after the refresh.
        tokio::time::sleep(Duration::from_millis(450)).await;
        settle().await;
        assert_eq!(provider.call_count("/api/kpi"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_push_applies_directly() {
        let provider = Arc::new(StaticDataProvider::new());
        let realtime = Arc::new(BroadcastRealtimeProvider::new());
        let ctx = make_ctx(&provider).with_realtime_provider(realtime.clone());

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::default().with_ws_channel("orders")),
            &ctx,
        );
        settle().await;

        assert_eq!(realtime.publish("orders", json!({ "count": 5 })), 1);
        widget.subscribe().wait_for(|s| s.data.is_some()).await.unwrap();

        assert_eq!(widget.data(), Some(json!({ "count": 5 })));
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_subscription_and_timer() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/kpi", json!(1));
        let realtime = Arc::new(BroadcastRealtimeProvider::new());
        let ctx = make_ctx(&provider).with_realtime_provider(realtime.clone());

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(
                WidgetDataSource::endpoint("/api/kpi")
                    .with_refresh_interval(1000)
                    .with_ws_channel("orders"),
            ),
            &ctx,
        );
        settle().await;
        assert_eq!(realtime.subscriber_count("orders"), 1);

        drop(widget);
        settle().await;

        assert_eq!(realtime.subscriber_count("orders"), 0);
        let calls = provider.call_count("/api/kpi");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.call_count("/api/kpi"), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_stops_runtime() {
        let provider = Arc::new(StaticDataProvider::new());
        let widget = Widget::spawn(JsonWidget::default(), WidgetInputs::new("w1"), &make_ctx(&provider));
        let rx = widget.subscribe();

        widget.destroy().await;

        assert!(rx.has_changed().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_data_source_triggers_load() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.set_response("/api/b", json!("b"));

        let widget = Widget::spawn(JsonWidget::default(), WidgetInputs::new("w1"), &make_ctx(&provider));
        widget
            .set_data_source(Some(WidgetDataSource::endpoint("/api/b")))
            .unwrap();
        widget.subscribe().wait_for(|s| s.data.is_some()).await.unwrap();

        assert_eq!(widget.data(), Some(json!("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_data_source_drops_fetch_for_previous_endpoint() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.push_delayed("/api/old", Duration::from_secs(5), Ok(json!("old-endpoint")));
        provider.set_response("/api/new", json!("new-endpoint"));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/old")),
            &make_ctx(&provider),
        );
        settle().await;
        assert!(widget.loading());

        widget
            .set_data_source(Some(WidgetDataSource::endpoint("/api/new")))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(widget.data(), Some(json!("new-endpoint")));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(widget.data(), Some(json!("new-endpoint")));
        assert!(!widget.loading());
        assert_eq!(provider.call_count("/api/old"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_data_source_keeps_widget_idle() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.push_delayed("/api/kpi", Duration::from_secs(5), Ok(json!("old")));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &make_ctx(&provider),
        );
        settle().await;
        assert!(widget.loading());

        widget.set_data_source(None).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let state = widget.state();
        assert_eq!(state.data, None);
        assert!(!state.loading);
        assert_eq!(state.phase(), WidgetPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_data_provider_warns_once() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1")
                .with_data_source(WidgetDataSource::endpoint("/api/kpi").with_refresh_interval(1000)),
            &WidgetContext::default(),
        );
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(widget.phase(), WidgetPhase::Idle);
        assert_eq!(logs.contents().matches("no data provider registered").count(), 1);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_latest_discards_superseded_fetch() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.push_delayed("/api/kpi", Duration::from_secs(5), Ok(json!("stale")));
        provider.push_delayed("/api/kpi", Duration::from_millis(10), Ok(json!("fresh")));
        let ctx = make_ctx(&provider).with_overlap_policy(OverlapPolicy::SwitchLatest);

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &ctx,
        );
        settle().await;
        widget.refresh().unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(widget.data(), Some(json!("fresh")));
        assert!(!widget.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolved_wins_by_default() {
        let provider = Arc::new(StaticDataProvider::new());
        provider.push_delayed("/api/kpi", Duration::from_secs(5), Ok(json!("slow")));
        provider.push_delayed("/api/kpi", Duration::from_millis(10), Ok(json!("fast")));

        let widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").with_data_source(WidgetDataSource::endpoint("/api/kpi")),
            &make_ctx(&provider),
        );
        settle().await;
        widget.refresh().unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(widget.data(), Some(json!("fast")));
        assert!(widget.loading());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(widget.data(), Some(json!("slow")));
        assert!(!widget.loading());
    }

    #[tokio::test]
    async fn test_config_resolves_over_defaults() {
        let widget = Widget::spawn(
            JsonWidget::new(json!({ "title": "KPI", "format": "number" })),
            WidgetInputs::new("w1").with_config(json!({ "title": "Revenue" })),
            &WidgetContext::default(),
        );

        assert_eq!(widget.config(), json!({ "title": "Revenue", "format": "number" }));
    }

    #[tokio::test]
    async fn test_config_change_is_forwarded() {
        let widget = Widget::spawn(JsonWidget::default(), WidgetInputs::new("w1"), &WidgetContext::default());
        let mut changes = widget.config_changes();

        assert_eq!(widget.request_config_change(json!({ "title": "New" })), 1);

        let change = changes.recv().await.unwrap();
        assert_eq!(change.instance_id, "w1");
        assert_eq!(change.changes, json!({ "title": "New" }));
        // The runtime does not apply the change itself.
        assert_eq!(widget.raw_config(), &json!({}));
    }

    #[tokio::test]
    async fn test_editing_flag() {
        let mut widget = Widget::spawn(
            JsonWidget::default(),
            WidgetInputs::new("w1").editing(true),
            &WidgetContext::default(),
        );
        assert!(widget.is_editing());

        widget.set_editing(false);
        assert!(!widget.is_editing());
    }
}
