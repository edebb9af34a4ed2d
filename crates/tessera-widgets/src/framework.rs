//! Framework bootstrap: wires providers, registry and policies together.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::builtin::builtin_widgets;
use crate::mock::{MockDataConfig, MockDataProvider};
use crate::provider::{DataProvider, RealtimeProvider, StorageProvider};
use crate::realtime::NoopRealtimeProvider;
use crate::registry::WidgetRegistry;
use crate::retry::RetryPolicy;
use crate::storage::{DEFAULT_STORAGE_DIR, LocalStorageProvider};
use crate::types::{WidgetDefinition, WidgetInstance};
use crate::viewer::DashboardViewer;
use crate::widget::{JsonWidget, OverlapPolicy, Widget, WidgetBehavior, WidgetContext, WidgetInputs};

/// Configuration for [`WidgetFramework::provide`].
#[derive(Clone)]
pub struct FrameworkConfig {
    data_provider: Arc<dyn DataProvider>,
    storage: Option<Arc<dyn StorageProvider>>,
    realtime: Option<Arc<dyn RealtimeProvider>>,
    widgets: Vec<WidgetDefinition>,
    retry_policy: RetryPolicy,
    overlap_policy: OverlapPolicy,
    storage_dir: PathBuf,
}

impl FrameworkConfig {
    /// Configuration with the required data provider and defaults for the rest.
    pub fn new(data_provider: Arc<dyn DataProvider>) -> Self {
        Self {
            data_provider,
            storage: None,
            realtime: None,
            widgets: Vec::new(),
            retry_policy: RetryPolicy::default(),
            overlap_policy: OverlapPolicy::default(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }

    /// Use `storage` instead of file-backed storage.
    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn StorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use `realtime` for push channels.
    #[must_use]
    pub fn with_realtime(mut self, realtime: Arc<dyn RealtimeProvider>) -> Self {
        self.realtime = Some(realtime);
        self
    }

    /// Register additional widget definitions after the built-ins.
    ///
    /// A custom definition with a built-in id replaces the built-in.
    #[must_use]
    pub fn with_widgets(mut self, widgets: impl IntoIterator<Item = WidgetDefinition>) -> Self {
        self.widgets.extend(widgets);
        self
    }

    /// Set the fetch retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the overlapping-fetch policy.
    #[must_use]
    pub const fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Directory for the default file-backed storage.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}

impl fmt::Debug for FrameworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkConfig")
            .field("storage", &self.storage.is_some())
            .field("realtime", &self.realtime.is_some())
            .field("widgets", &self.widgets.len())
            .field("retry_policy", &self.retry_policy)
            .field("overlap_policy", &self.overlap_policy)
            .field("storage_dir", &self.storage_dir)
            .finish_non_exhaustive()
    }
}

/// Composition root handed to the host.
///
/// Cloning is cheap; clones share providers and the registry.
#[derive(Clone)]
pub struct WidgetFramework {
    storage: Arc<dyn StorageProvider>,
    realtime: Arc<dyn RealtimeProvider>,
    registry: Arc<WidgetRegistry>,
    context: WidgetContext,
}

impl WidgetFramework {
    /// Build the framework from `config`.
    ///
    /// Registers the built-in widgets, then any custom ones.
    pub fn provide(config: FrameworkConfig) -> Self {
        let FrameworkConfig {
            data_provider,
            storage,
            realtime,
            widgets,
            retry_policy,
            overlap_policy,
            storage_dir,
        } = config;

        let registry = Arc::new(WidgetRegistry::new());
        registry.register_many(builtin_widgets());
        let custom = widgets.len();
        registry.register_many(widgets);

        let storage = storage.unwrap_or_else(|| {
            debug!(dir = %storage_dir.display(), "using file-backed dashboard storage");
            Arc::new(LocalStorageProvider::new(storage_dir))
        });

        let mut context = WidgetContext::new(data_provider)
            .with_retry_policy(retry_policy)
            .with_overlap_policy(overlap_policy);
        if let Some(realtime) = &realtime {
            context = context.with_realtime_provider(Arc::clone(realtime));
        }
        let realtime = realtime.unwrap_or_else(|| Arc::new(NoopRealtimeProvider));

        info!(
            widgets = registry.len(),
            custom,
            realtime_connected = realtime.is_connected(),
            "widget framework ready"
        );

        Self {
            storage,
            realtime,
            registry,
            context,
        }
    }

    /// Framework backed by [`MockDataProvider`] with default settings.
    pub fn mock() -> Self {
        Self::mock_with(MockDataConfig::default(), FrameworkConfig::new)
    }

    /// Framework backed by a [`MockDataProvider`] with `mock` settings.
    ///
    /// `configure` receives the mock provider and returns the rest of the
    /// configuration.
    pub fn mock_with<F>(mock: MockDataConfig, configure: F) -> Self
    where
        F: FnOnce(Arc<dyn DataProvider>) -> FrameworkConfig,
    {
        let provider: Arc<dyn DataProvider> = Arc::new(MockDataProvider::new(mock));
        Self::provide(configure(provider))
    }

    /// The data provider.
    #[must_use]
    pub fn data_provider(&self) -> Option<&Arc<dyn DataProvider>> {
        self.context.data_provider()
    }

    /// The storage provider.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    /// The realtime provider, no-op unless one was configured.
    #[must_use]
    pub fn realtime(&self) -> &Arc<dyn RealtimeProvider> {
        &self.realtime
    }

    /// The widget registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    /// Context handed to every widget runtime.
    #[must_use]
    pub fn context(&self) -> &WidgetContext {
        &self.context
    }

    /// Spawn a typed widget runtime.
    pub fn spawn_widget<B: WidgetBehavior>(&self, behavior: B, inputs: WidgetInputs<B::Data>) -> Widget<B> {
        Widget::spawn(behavior, inputs, &self.context)
    }

    /// Spawn an untyped runtime for a dashboard placement.
    ///
    /// Returns `None` if the placement's widget type is not registered.
    pub fn spawn_placement(&self, placement: &WidgetInstance) -> Option<Widget<JsonWidget>> {
        let definition = self.registry.get(&placement.widget_id)?;

        let mut inputs = WidgetInputs::new(placement.instance_id.clone()).with_config(placement.config.clone());
        if let Some(source) = &placement.data_source {
            inputs = inputs.with_data_source(source.clone());
        }

        Some(Widget::spawn(JsonWidget::from_definition(&definition), inputs, &self.context))
    }

    /// Dashboard viewer bound to this framework.
    #[must_use]
    pub fn viewer(&self) -> DashboardViewer {
        DashboardViewer::new(self.clone())
    }
}

impl fmt::Debug for WidgetFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetFramework")
            .field("widgets", &self.registry.len())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::KpiWidget;
    use crate::mock::StaticDataProvider;
    use crate::realtime::BroadcastRealtimeProvider;
    use crate::storage::MemoryStorageProvider;
    use crate::types::{ComponentRef, WidgetCategory, WidgetDataSource, WidgetPosition};
    use serde_json::json;

    fn make_config() -> FrameworkConfig {
        FrameworkConfig::new(Arc::new(StaticDataProvider::new())).with_storage(Arc::new(MemoryStorageProvider::new()))
    }

    #[test]
    fn test_provide_registers_builtins() {
        let framework = WidgetFramework::provide(make_config());

        for id in ["kpi", "chart", "table", "list", "progress"] {
            assert!(framework.registry().has(id), "missing built-in {id}");
        }
        assert!(framework.data_provider().is_some());
        assert!(!framework.realtime().is_connected());
        assert!(framework.context().realtime_provider().is_none());
    }

    #[test]
    fn test_custom_widgets_override_builtins() {
        let custom = WidgetDefinition::new("kpi", "Host KPI", WidgetCategory::Custom, ComponentRef::new("HostKpi"));
        let extra = WidgetDefinition::new("weather", "Weather", WidgetCategory::Display, ComponentRef::new("Weather"));

        let framework = WidgetFramework::provide(make_config().with_widgets([custom, extra]));

        assert_eq!(framework.registry().len(), 6);
        assert_eq!(framework.registry().get("kpi").unwrap().name, "Host KPI");
        assert!(framework.registry().has("weather"));
    }

    #[test]
    fn test_configured_policies_reach_context() {
        let policy = RetryPolicy::none();
        let framework = WidgetFramework::provide(
            make_config()
                .with_retry_policy(policy)
                .with_overlap_policy(OverlapPolicy::SwitchLatest)
                .with_realtime(Arc::new(BroadcastRealtimeProvider::new())),
        );

        assert_eq!(framework.context().retry_policy(), policy);
        assert_eq!(framework.context().overlap_policy(), OverlapPolicy::SwitchLatest);
        assert!(framework.context().realtime_provider().is_some());
        assert!(framework.realtime().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_framework_loads_kpi() {
        let framework = WidgetFramework::mock_with(MockDataConfig::default().with_seed(1), |provider| {
            FrameworkConfig::new(provider).with_storage(Arc::new(MemoryStorageProvider::new()))
        });

        let widget = framework.spawn_widget(
            KpiWidget,
            WidgetInputs::new("kpi-1").with_data_source(WidgetDataSource::endpoint("/api/kpi/revenue")),
        );
        widget.subscribe().wait_for(|s| s.data.is_some()).await.unwrap();

        assert!(widget.data().unwrap().value > 0.0);
        assert_eq!(widget.config().title, "KPI");
    }

    #[tokio::test]
    async fn test_spawn_placement_resolves_registry() {
        let framework = WidgetFramework::provide(make_config());
        let placement = WidgetInstance {
            instance_id: "w1".to_string(),
            widget_id: "kpi".to_string(),
            position: WidgetPosition { x: 0, y: 0, cols: 1, rows: 1 },
            config: json!({ "title": "Revenue" }),
            data_source: None,
        };

        let widget = framework.spawn_placement(&placement).unwrap();
        assert_eq!(widget.config()["title"], json!("Revenue"));
        assert_eq!(widget.config()["currency"], json!("USD"));

        let unknown = WidgetInstance {
            widget_id: "missing".to_string(),
            ..placement
        };
        assert!(framework.spawn_placement(&unknown).is_none());
    }
}
