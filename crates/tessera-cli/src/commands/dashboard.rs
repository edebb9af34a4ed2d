//! Dashboard storage command implementation.

use std::io::Write;
use std::path::Path;

use serde_json::json;
use tessera_widgets::builtin::{CHART_WIDGET_ID, KPI_WIDGET_ID, LIST_WIDGET_ID, PROGRESS_WIDGET_ID, TABLE_WIDGET_ID};
use tessera_widgets::{
    DashboardConfig, LocalStorageProvider, StorageProvider, WidgetDataSource, WidgetInstance, WidgetPosition,
};
use tracing::info;

use crate::cli::DashboardCommands;
use crate::error::CliError;
use crate::output::{DashboardList, Notice, OutputFormat};

/// Sample dashboard placing every built-in widget against mock endpoints.
#[must_use]
pub fn sample_dashboard(id: &str, name: &str) -> DashboardConfig {
    fn place(
        instance_id: &str,
        widget_id: &str,
        position: WidgetPosition,
        config: serde_json::Value,
        source: WidgetDataSource,
    ) -> WidgetInstance {
        WidgetInstance {
            instance_id: instance_id.to_string(),
            widget_id: widget_id.to_string(),
            position,
            config,
            data_source: Some(source),
        }
    }

    let mut dashboard = DashboardConfig::new(id, name)
        .with_widget(place(
            "revenue",
            KPI_WIDGET_ID,
            WidgetPosition { x: 0, y: 0, cols: 1, rows: 1 },
            json!({ "title": "Revenue", "format": "currency" }),
            WidgetDataSource::endpoint("/api/kpi/revenue").with_refresh_interval(5_000),
        ))
        .with_widget(place(
            "quota",
            PROGRESS_WIDGET_ID,
            WidgetPosition { x: 1, y: 0, cols: 1, rows: 1 },
            json!({ "title": "Quota", "type": "gauge" }),
            WidgetDataSource::endpoint("/api/progress/quota").with_refresh_interval(5_000),
        ))
        .with_widget(place(
            "sales",
            CHART_WIDGET_ID,
            WidgetPosition { x: 2, y: 0, cols: 2, rows: 2 },
            json!({ "title": "Sales", "type": "bar" }),
            WidgetDataSource::endpoint("/api/chart/sales").with_refresh_interval(10_000),
        ))
        .with_widget(place(
            "orders",
            TABLE_WIDGET_ID,
            WidgetPosition { x: 0, y: 2, cols: 4, rows: 3 },
            json!({ "title": "Recent orders", "pageSize": 5 }),
            WidgetDataSource::endpoint("/api/table/orders")
                .with_param("page", json!(1))
                .with_param("pageSize", json!(5)),
        ))
        .with_widget(place(
            "activity",
            LIST_WIDGET_ID,
            WidgetPosition { x: 0, y: 1, cols: 2, rows: 1 },
            json!({ "title": "Activity" }),
            WidgetDataSource::endpoint("/api/list/activity").with_refresh_interval(15_000),
        ));
    dashboard.description = Some("Sample dashboard using every built-in widget".to_string());
    dashboard
}

/// Handler for dashboard subcommands.
#[derive(Debug)]
pub struct DashboardCommand {
    storage: LocalStorageProvider,
}

impl DashboardCommand {
    /// Creates a dashboard command over `storage_dir`.
    #[must_use]
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            storage: LocalStorageProvider::new(storage_dir),
        }
    }

    /// Executes the dashboard subcommand.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        command: &DashboardCommands,
    ) -> Result<(), CliError> {
        match command {
            DashboardCommands::Init { id, name, force } => {
                self.init(out, format, id, name.as_deref(), *force).await
            }
            DashboardCommands::List => self.list(out, format).await,
            DashboardCommands::Show { id } => self.show(out, format, id).await,
            DashboardCommands::Delete { id } => self.delete(out, format, id).await,
        }
    }

    async fn init<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: &str,
        name: Option<&str>,
        force: bool,
    ) -> Result<(), CliError> {
        if !force && self.storage.load(id).await?.is_some() {
            return Err(CliError::AlreadyExists(id.to_string()));
        }

        let dashboard = sample_dashboard(id, name.unwrap_or(id));
        self.storage.save(id, &dashboard).await?;
        info!(dashboard_id = %id, dir = %self.storage.dir().display(), "sample dashboard written");

        let notice = Notice {
            message: format!(
                "Created dashboard '{id}' with {} widgets in {}",
                dashboard.widgets.len(),
                self.storage.dir().display()
            ),
            dashboard_id: id.to_string(),
        };
        format.write(out, &notice)
    }

    async fn list<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let dashboards = self.storage.list().await?;
        format.write(out, &DashboardList { dashboards })
    }

    async fn show<W: Write>(&self, out: &mut W, format: &OutputFormat, id: &str) -> Result<(), CliError> {
        let dashboard = self
            .storage
            .load(id)
            .await?
            .ok_or_else(|| CliError::NotFound(id.to_string()))?;
        format.write(out, &dashboard)
    }

    async fn delete<W: Write>(&self, out: &mut W, format: &OutputFormat, id: &str) -> Result<(), CliError> {
        if self.storage.load(id).await?.is_none() {
            return Err(CliError::NotFound(id.to_string()));
        }
        self.storage.delete(id).await?;

        let notice = Notice {
            message: format!("Deleted dashboard '{id}'"),
            dashboard_id: id.to_string(),
        };
        format.write(out, &notice)
    }
}
