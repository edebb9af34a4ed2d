//! Catalog, data-source, and dashboard layout types.
//!
//! Wire names are camelCase so dashboards saved by browser hosts load
//! unchanged.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Grouping used by widget pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    /// Single-value indicators.
    Metrics,
    /// Series visualisations.
    Charts,
    /// Tabular and list data.
    Data,
    /// Progress and gauge indicators.
    Progress,
    /// Static or informational tiles.
    Display,
    /// Host-defined widgets.
    Custom,
}

impl fmt::Display for WidgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Metrics => "metrics",
            Self::Charts => "charts",
            Self::Data => "data",
            Self::Progress => "progress",
            Self::Display => "display",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Opaque handle the host UI maps to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(String);

impl ComponentRef {
    /// Create a component handle.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The handle as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Size in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    /// Columns spanned.
    pub cols: u32,
    /// Rows spanned.
    pub rows: u32,
}

impl GridSize {
    /// Create a grid size.
    #[must_use]
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }
}

/// Size constraints for a widget type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSizes {
    /// Smallest allowed size.
    pub min_size: GridSize,
    /// Largest allowed size.
    pub max_size: GridSize,
    /// Size used when the widget is first placed.
    pub default_size: GridSize,
}

impl Default for WidgetSizes {
    fn default() -> Self {
        Self {
            min_size: GridSize::new(1, 1),
            max_size: GridSize::new(4, 4),
            default_size: GridSize::new(1, 1),
        }
    }
}

/// Static catalog entry describing a widget type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    /// Unique widget type id (e.g. `kpi`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Icon name for pickers.
    pub icon: String,
    /// Picker grouping.
    pub category: WidgetCategory,
    /// Extra search keywords.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Renderer handle.
    pub component: ComponentRef,
    /// Grid size constraints.
    #[serde(default)]
    pub sizes: WidgetSizes,
    /// Type-level configuration defaults (a JSON object).
    #[serde(default)]
    pub default_config: Value,
}

impl WidgetDefinition {
    /// Create a definition with default sizes, no tags and an empty default config.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: WidgetCategory,
        component: ComponentRef,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            category,
            tags: Vec::new(),
            component,
            sizes: WidgetSizes::default(),
            default_config: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Add a search tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the size constraints.
    #[must_use]
    pub const fn with_sizes(mut self, sizes: WidgetSizes) -> Self {
        self.sizes = sizes;
        self
    }

    /// Set the default configuration.
    #[must_use]
    pub fn with_default_config(mut self, config: Value) -> Self {
        self.default_config = config;
        self
    }

    /// Whether `needle` (already lowercased) occurs in the name, description, or a tag.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// How a widget instance obtains its data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDataSource {
    /// Backend resource to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Parameters passed with every fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, Value>>,
    /// Periodic refresh interval in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
    /// Realtime channel to subscribe to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_channel: Option<String>,
}

impl WidgetDataSource {
    /// Data source fetching a single endpoint.
    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Set the refresh interval in milliseconds.
    #[must_use]
    pub const fn with_refresh_interval(mut self, millis: u64) -> Self {
        self.refresh_interval = Some(millis);
        self
    }

    /// Add a fetch parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Set the realtime channel.
    #[must_use]
    pub fn with_ws_channel(mut self, channel: impl Into<String>) -> Self {
        self.ws_channel = Some(channel.into());
        self
    }

    /// Refresh period, if periodic refresh is enabled.
    #[must_use]
    pub fn refresh_period(&self) -> Option<Duration> {
        self.refresh_interval
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    /// Whether the source names any remote origin at all.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.endpoint.is_some() || self.ws_channel.is_some()
    }
}

/// Grid placement of a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WidgetPosition {
    /// Column offset.
    pub x: u32,
    /// Row offset.
    pub y: u32,
    /// Columns spanned.
    pub cols: u32,
    /// Rows spanned.
    pub rows: u32,
}

/// One placed widget on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    /// Unique placement id.
    pub instance_id: String,
    /// Widget type id, resolved against the registry.
    pub widget_id: String,
    /// Grid placement.
    pub position: WidgetPosition,
    /// Instance configuration, merged over the type defaults.
    #[serde(default)]
    pub config: Value,
    /// Optional data source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<WidgetDataSource>,
}

const fn default_columns() -> u32 {
    4
}

const fn default_row_height() -> u32 {
    160
}

const fn default_gap() -> u32 {
    16
}

/// A saved dashboard layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Unique dashboard id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grid columns.
    #[serde(default = "default_columns")]
    pub columns: u32,
    /// Row height in pixels.
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    /// Gap between widgets in pixels.
    #[serde(default = "default_gap")]
    pub gap: u32,
    /// Placed widgets, in layout order.
    #[serde(default)]
    pub widgets: Vec<WidgetInstance>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl DashboardConfig {
    /// Create an empty dashboard with default layout parameters.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            columns: default_columns(),
            row_height: default_row_height(),
            gap: default_gap(),
            widgets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a widget placement.
    #[must_use]
    pub fn with_widget(mut self, widget: WidgetInstance) -> Self {
        self.widgets.push(widget);
        self
    }

    /// Summary used by dashboard listings.
    #[must_use]
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            widget_count: self.widgets.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry for a stored dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Dashboard id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of placed widgets.
    pub widget_count: usize,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A configuration edit requested by the host UI for one instance.
///
/// The runtime only forwards these; persisting them is the host's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChange {
    /// Instance the edit applies to.
    pub instance_id: String,
    /// Partial configuration (a JSON object of changed keys).
    pub changes: Value,
}

/// Shallow-merge `overrides` over `defaults`.
///
/// Both must be JSON objects for keys to merge; a non-object override
/// replaces the defaults wholesale, and a `null` override keeps them.
#[must_use]
pub fn merge_config(defaults: &Value, overrides: &Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base.clone(),
        (_, patch) => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_period_ignores_zero() {
        let source = WidgetDataSource::endpoint("/api/kpi").with_refresh_interval(0);
        assert!(source.refresh_period().is_none());

        let source = WidgetDataSource::endpoint("/api/kpi").with_refresh_interval(5000);
        assert_eq!(source.refresh_period(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_is_remote() {
        assert!(!WidgetDataSource::default().is_remote());
        assert!(WidgetDataSource::endpoint("/a").is_remote());
        assert!(WidgetDataSource::default().with_ws_channel("kpi").is_remote());
    }

    #[test]
    fn test_dashboard_defaults_from_json() {
        let json = json!({
            "id": "main",
            "name": "Overview",
            "widgets": [{
                "instanceId": "kpi-1",
                "widgetId": "kpi",
                "position": { "x": 0, "y": 0, "cols": 1, "rows": 1 },
                "config": { "title": "Revenue" },
                "dataSource": { "endpoint": "/api/kpi/revenue", "refreshInterval": 30000 }
            }],
            "createdAt": "2024-01-15T00:00:00Z",
            "updatedAt": "2024-01-15T00:00:00Z"
        });

        let dashboard: DashboardConfig = serde_json::from_value(json).unwrap();

        assert_eq!(dashboard.columns, 4);
        assert_eq!(dashboard.row_height, 160);
        assert_eq!(dashboard.gap, 16);
        assert_eq!(dashboard.widgets.len(), 1);
        let source = dashboard.widgets[0].data_source.as_ref().unwrap();
        assert_eq!(source.endpoint.as_deref(), Some("/api/kpi/revenue"));
        assert_eq!(source.refresh_interval, Some(30000));
    }

    #[test]
    fn test_summary_counts_widgets() {
        let dashboard = DashboardConfig::new("ops", "Operations").with_widget(WidgetInstance {
            instance_id: "a".into(),
            widget_id: "kpi".into(),
            position: WidgetPosition::default(),
            config: json!({}),
            data_source: None,
        });

        let summary = dashboard.summary();
        assert_eq!(summary.id, "ops");
        assert_eq!(summary.widget_count, 1);
    }

    #[test]
    fn test_merge_config_overrides_win() {
        let defaults = json!({ "title": "KPI", "format": "number", "showTrend": true });
        let overrides = json!({ "title": "Revenue", "format": "currency" });

        let merged = merge_config(&defaults, &overrides);

        assert_eq!(
            merged,
            json!({ "title": "Revenue", "format": "currency", "showTrend": true })
        );
    }

    #[test]
    fn test_merge_config_null_keeps_defaults() {
        let defaults = json!({ "title": "KPI" });
        assert_eq!(merge_config(&defaults, &Value::Null), defaults);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(WidgetCategory::Metrics.to_string(), "metrics");
        assert_eq!(
            serde_json::to_string(&WidgetCategory::Charts).unwrap(),
            "\"charts\""
        );
    }
}
