//! Built-in widget catalog and typed behaviors.
//!
//! Each built-in pairs a [`WidgetDefinition`] with a [`WidgetBehavior`]
//! whose config and data types mirror the JSON shapes hosts already use.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::WidgetResult;
use crate::types::{ComponentRef, GridSize, WidgetCategory, WidgetDefinition, WidgetSizes};
use crate::widget::WidgetBehavior;

/// Id of the built-in KPI widget.
pub const KPI_WIDGET_ID: &str = "kpi";
/// Id of the built-in chart widget.
pub const CHART_WIDGET_ID: &str = "chart";
/// Id of the built-in table widget.
pub const TABLE_WIDGET_ID: &str = "table";
/// Id of the built-in list widget.
pub const LIST_WIDGET_ID: &str = "list";
/// Id of the built-in progress widget.
pub const PROGRESS_WIDGET_ID: &str = "progress";

/// Definitions for every built-in widget, in catalog order.
#[must_use]
pub fn builtin_widgets() -> Vec<WidgetDefinition> {
    vec![
        WidgetDefinition::new(KPI_WIDGET_ID, "KPI Card", WidgetCategory::Metrics, ComponentRef::new("KpiWidget"))
            .with_description("Single key metric with trend indicator")
            .with_icon("trending_up")
            .with_tag("metric")
            .with_tag("number")
            .with_tag("stat")
            .with_sizes(sizes((1, 1), (2, 2), (1, 1)))
            .with_default_config(config_json(&KpiConfig::default())),
        WidgetDefinition::new(CHART_WIDGET_ID, "Chart", WidgetCategory::Charts, ComponentRef::new("ChartWidget"))
            .with_description("Line, bar, area or donut chart")
            .with_icon("show_chart")
            .with_tag("graph")
            .with_tag("trend")
            .with_tag("visualization")
            .with_sizes(sizes((2, 2), (4, 4), (2, 2)))
            .with_default_config(config_json(&ChartConfig::default())),
        WidgetDefinition::new(TABLE_WIDGET_ID, "Data Table", WidgetCategory::Data, ComponentRef::new("TableWidget"))
            .with_description("Paged table of records")
            .with_icon("table_chart")
            .with_tag("grid")
            .with_tag("rows")
            .with_sizes(sizes((2, 2), (4, 6), (4, 3)))
            .with_default_config(config_json(&TableConfig::default())),
        WidgetDefinition::new(LIST_WIDGET_ID, "List", WidgetCategory::Data, ComponentRef::new("ListWidget"))
            .with_description("Compact list of recent items")
            .with_icon("list")
            .with_tag("activity")
            .with_tag("feed")
            .with_sizes(sizes((1, 2), (2, 4), (1, 3)))
            .with_default_config(config_json(&ListConfig::default())),
        WidgetDefinition::new(
            PROGRESS_WIDGET_ID,
            "Progress",
            WidgetCategory::Progress,
            ComponentRef::new("ProgressWidget"),
        )
        .with_description("Linear, circular or gauge progress toward a target")
        .with_icon("donut_large")
        .with_tag("gauge")
        .with_tag("goal")
        .with_tag("percent")
        .with_sizes(sizes((1, 1), (2, 2), (1, 1)))
        .with_default_config(config_json(&ProgressConfig::default())),
    ]
}

fn sizes(min: (u32, u32), max: (u32, u32), default: (u32, u32)) -> WidgetSizes {
    WidgetSizes {
        min_size: GridSize::new(min.0, min.1),
        max_size: GridSize::new(max.0, max.1),
        default_size: GridSize::new(default.0, default.1),
    }
}

fn config_json<C: Serialize>(config: &C) -> Value {
    serde_json::to_value(config).unwrap_or_default()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_number<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }
}

/// Accepts `42` or `"42"`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_number()
}

/// Accepts `3.2`, `"3.2"` or a missing/null value.
fn lenient_optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_number)
        .transpose()
}

/// Wrap a bare array payload as `{ "items": [...] }`.
fn items_envelope(raw: Value) -> Value {
    match raw {
        Value::Array(items) => serde_json::json!({ "items": items }),
        other => other,
    }
}

// ==================== KPI ====================

/// Number formatting for KPI values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Plain number.
    #[default]
    Number,
    /// Currency amount.
    Currency,
    /// Percentage.
    Percent,
}

/// Direction of a KPI change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Increasing.
    Up,
    /// Decreasing.
    Down,
    /// Flat.
    Neutral,
}

/// KPI widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KpiConfig {
    /// Card title.
    pub title: String,
    /// Secondary line under the title.
    pub subtitle: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Value format.
    pub format: ValueFormat,
    /// ISO currency code for [`ValueFormat::Currency`].
    pub currency: String,
    /// Whether to show the change and trend.
    pub show_trend: bool,
    /// Accent color.
    pub color: Option<String>,
    /// Decimal places.
    pub decimals: u32,
    /// Abbreviate large values (`1.2K`).
    pub compact: bool,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            title: "KPI".to_string(),
            subtitle: None,
            icon: None,
            format: ValueFormat::Number,
            currency: "USD".to_string(),
            show_trend: true,
            color: None,
            decimals: 0,
            compact: false,
        }
    }
}

/// KPI widget data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiData {
    /// Current value.
    #[serde(deserialize_with = "lenient_number")]
    pub value: f64,
    /// Percentage change against the previous period.
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub change: Option<f64>,
    /// Trend direction.
    #[serde(default)]
    pub trend: Option<Trend>,
    /// Label for the comparison period.
    #[serde(default)]
    pub previous_label: Option<String>,
    /// Recent values for a sparkline.
    #[serde(default)]
    pub sparkline: Vec<f64>,
}

impl KpiData {
    /// Explicit trend, or one derived from the sign of `change`.
    #[must_use]
    pub fn effective_trend(&self) -> Trend {
        if let Some(trend) = self.trend {
            return trend;
        }
        match self.change {
            Some(c) if c > 0.0 => Trend::Up,
            Some(c) if c < 0.0 => Trend::Down,
            _ => Trend::Neutral,
        }
    }
}

/// Single-metric card.
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiWidget;

impl WidgetBehavior for KpiWidget {
    type Config = KpiConfig;
    type Data = KpiData;

    fn default_config(&self) -> KpiConfig {
        KpiConfig::default()
    }
}

// ==================== Chart ====================

/// Chart rendering type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Line chart.
    #[default]
    Line,
    /// Bar chart.
    Bar,
    /// Area chart.
    Area,
    /// Donut chart.
    Donut,
}

/// Chart widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    /// Chart title.
    pub title: String,
    /// Rendering type.
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Whether to show the legend.
    pub show_legend: bool,
    /// Stack series on top of each other.
    pub stacked: bool,
    /// Series colors, applied in order.
    pub colors: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            chart_type: ChartType::Line,
            show_legend: true,
            stacked: false,
            colors: Vec::new(),
        }
    }
}

/// One named data series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartSeries {
    /// Series name.
    pub name: String,
    /// One value per label.
    pub data: Vec<f64>,
    /// Series color override.
    #[serde(default)]
    pub color: Option<String>,
}

/// Chart widget data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartData {
    /// Category labels.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Series plotted against the labels.
    #[serde(default)]
    pub series: Vec<ChartSeries>,
}

/// Series chart.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartWidget;

impl WidgetBehavior for ChartWidget {
    type Config = ChartConfig;
    type Data = ChartData;

    fn default_config(&self) -> ChartConfig {
        ChartConfig::default()
    }
}

// ==================== Table ====================

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Row field shown in this column.
    pub key: String,
    /// Header text.
    pub label: String,
    /// Whether the column can be sorted.
    #[serde(default)]
    pub sortable: bool,
}

/// Table widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    /// Table title.
    pub title: String,
    /// Columns; empty means one per row field.
    pub columns: Vec<TableColumn>,
    /// Rows per page.
    pub page_size: u32,
    /// Alternate row shading.
    pub striped: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            title: "Table".to_string(),
            columns: Vec::new(),
            page_size: 10,
            striped: true,
        }
    }
}

/// Table widget data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableData {
    /// Rows on the current page.
    #[serde(default)]
    pub items: Vec<serde_json::Map<String, Value>>,
    /// Total rows across all pages.
    #[serde(default)]
    pub total: Option<u64>,
}

impl TableData {
    /// Total rows, defaulting to the rows on this page.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.total.unwrap_or(self.items.len() as u64)
    }
}

/// Paged record table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableWidget;

impl WidgetBehavior for TableWidget {
    type Config = TableConfig;
    type Data = TableData;

    fn default_config(&self) -> TableConfig {
        TableConfig::default()
    }

    fn transform_data(&self, raw: Value) -> WidgetResult<TableData> {
        Ok(serde_json::from_value(items_envelope(raw))?)
    }
}

// ==================== List ====================

/// List widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListConfig {
    /// List title.
    pub title: String,
    /// Items shown before truncating.
    pub max_items: u32,
    /// Whether to show item icons.
    pub show_icons: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            title: "List".to_string(),
            max_items: 5,
            show_icons: true,
        }
    }
}

/// One list entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItem {
    /// Item id.
    pub id: String,
    /// Primary text.
    pub title: String,
    /// Secondary text.
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Status badge.
    #[serde(default)]
    pub status: Option<String>,
}

/// List widget data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListData {
    /// Items on the current page.
    #[serde(default)]
    pub items: Vec<ListItem>,
    /// Total items across all pages.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Compact item list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListWidget;

impl WidgetBehavior for ListWidget {
    type Config = ListConfig;
    type Data = ListData;

    fn default_config(&self) -> ListConfig {
        ListConfig::default()
    }

    fn transform_data(&self, raw: Value) -> WidgetResult<ListData> {
        Ok(serde_json::from_value(items_envelope(raw))?)
    }
}

// ==================== Progress ====================

/// Progress rendering type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressType {
    /// Horizontal bar.
    #[default]
    Linear,
    /// Ring.
    Circular,
    /// Half-circle gauge.
    Gauge,
}

/// Color band starting at `value` percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Lower bound, in percent.
    pub value: f64,
    /// Color used at or above the bound.
    pub color: String,
}

/// Progress widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressConfig {
    /// Widget title.
    pub title: String,
    /// Rendering type.
    #[serde(rename = "type")]
    pub progress_type: ProgressType,
    /// Value representing 100%, unless the data overrides it.
    pub max: f64,
    /// Whether to print the percentage.
    pub show_value: bool,
    /// Color bands, ascending.
    pub thresholds: Vec<Threshold>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            title: "Progress".to_string(),
            progress_type: ProgressType::Linear,
            max: 100.0,
            show_value: true,
            thresholds: Vec::new(),
        }
    }
}

impl ProgressConfig {
    /// Color of the highest threshold at or below `percent`.
    #[must_use]
    pub fn color_for(&self, percent: f64) -> Option<&str> {
        self.thresholds
            .iter()
            .filter(|t| percent >= t.value)
            .max_by(|a, b| a.value.total_cmp(&b.value))
            .map(|t| t.color.as_str())
    }
}

/// Progress widget data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressData {
    /// Current value.
    #[serde(deserialize_with = "lenient_number")]
    pub value: f64,
    /// Target value, overriding the configured max.
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub max: Option<f64>,
    /// Caption.
    #[serde(default)]
    pub label: Option<String>,
}

impl ProgressData {
    /// Completion in percent, clamped to `0..=100`.
    #[must_use]
    pub fn percent(&self, config: &ProgressConfig) -> f64 {
        let max = self.max.unwrap_or(config.max);
        if max <= 0.0 {
            return 0.0;
        }
        (self.value / max * 100.0).clamp(0.0, 100.0)
    }
}

/// Progress toward a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressWidget;

impl WidgetBehavior for ProgressWidget {
    type Config = ProgressConfig;
    type Data = ProgressData;

    fn default_config(&self) -> ProgressConfig {
        ProgressConfig::default()
    }

    fn transform_data(&self, raw: Value) -> WidgetResult<ProgressData> {
        let raw = match raw {
            Value::Number(n) => serde_json::json!({ "value": n }),
            other => other,
        };
        Ok(serde_json::from_value(raw)?)
    }
}
