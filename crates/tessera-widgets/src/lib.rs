//! # tessera-widgets
//!
//! Core of a dashboard widget framework: the contracts a host implements to
//! supply data, persistence and push updates, a catalog of widget types, and
//! a per-instance runtime that keeps each placed widget's data current.
//!
//! ## Features
//!
//! - **Provider contracts**: object-safe [`DataProvider`], [`StorageProvider`]
//!   and [`RealtimeProvider`] traits
//! - **Registry**: register, look up, filter and search widget definitions
//! - **Widget runtime**: initial load, interval refresh, manual refresh and
//!   realtime pushes merged into one observable [`WidgetState`], with bounded
//!   retry
//! - **Built-ins**: KPI, chart, table, list and progress widgets
//! - **Mock data**: a latency-simulating [`MockDataProvider`] for demos
//!
//! ## Example
//!
//! ```rust,no_run
//! use tessera_widgets::{KpiWidget, WidgetDataSource, WidgetFramework, WidgetInputs};
//!
//! #[tokio::main]
//! async fn main() {
//!     let framework = WidgetFramework::mock();
//!
//!     let widget = framework.spawn_widget(
//!         KpiWidget,
//!         WidgetInputs::new("revenue")
//!             .with_data_source(WidgetDataSource::endpoint("/api/kpi/revenue").with_refresh_interval(30_000)),
//!     );
//!
//!     let mut state = widget.subscribe();
//!     while state.changed().await.is_ok() {
//!         println!("{:?}", state.borrow().data);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtin;
pub mod error;
pub mod framework;
pub mod mock;
pub mod provider;
pub mod realtime;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod types;
pub mod viewer;
pub mod widget;

// Re-export main types
pub use builtin::{
    ChartWidget, KpiWidget, ListWidget, ProgressWidget, TableWidget, builtin_widgets,
};
pub use error::{ProviderError, ProviderResult, ViewerError, WidgetError, WidgetResult};
pub use framework::{FrameworkConfig, WidgetFramework};
pub use mock::{MockDataConfig, MockDataProvider, StaticDataProvider};
pub use provider::{DataProvider, Params, ProviderFuture, RealtimeProvider, StorageProvider, ValueStream};
pub use realtime::{BroadcastRealtimeProvider, NoopRealtimeProvider};
pub use registry::WidgetRegistry;
pub use retry::{RetryPolicy, fetch_with_retry};
pub use storage::{LocalStorageProvider, MemoryStorageProvider};
pub use types::{
    ComponentRef, ConfigChange, DashboardConfig, DashboardSummary, GridSize, WidgetCategory,
    WidgetDataSource, WidgetDefinition, WidgetInstance, WidgetPosition, WidgetSizes, merge_config,
};
pub use viewer::{DashboardViewer, ViewerState};
pub use widget::{
    JsonWidget, OverlapPolicy, Widget, WidgetBehavior, WidgetContext, WidgetInputs, WidgetPhase,
    WidgetState,
};
