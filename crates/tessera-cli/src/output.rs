//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tessera_widgets::{DashboardConfig, DashboardSummary, WidgetDefinition, WidgetPhase, WidgetState};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write one value per line: compact JSON or a single table row.
    pub fn write_line<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Write a serializable value to a string.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Widget catalog listing.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogList {
    /// Matching definitions.
    pub widgets: Vec<WidgetDefinition>,
}

impl TableDisplay for CatalogList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.widgets.is_empty() {
            writeln!(writer, "No matching widgets")?;
            return Ok(());
        }

        writeln!(writer, "{:<12} {:<14} {:<10} {:<8} DESCRIPTION", "ID", "NAME", "CATEGORY", "SIZE")?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for w in &self.widgets {
            let size = format!("{}x{}", w.sizes.default_size.cols, w.sizes.default_size.rows);
            writeln!(
                writer,
                "{:<12} {:<14} {:<10} {:<8} {}",
                w.id, w.name, w.category, size, w.description
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} widget(s)", self.widgets.len())?;
        Ok(())
    }
}

/// Stored dashboard listing.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardList {
    /// Stored dashboards, ordered by id.
    pub dashboards: Vec<DashboardSummary>,
}

impl TableDisplay for DashboardList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.dashboards.is_empty() {
            writeln!(writer, "No stored dashboards")?;
            return Ok(());
        }

        writeln!(writer, "{:<20} {:<24} {:<8} UPDATED", "ID", "NAME", "WIDGETS")?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for d in &self.dashboards {
            writeln!(
                writer,
                "{:<20} {:<24} {:<8} {}",
                d.id,
                d.name,
                d.widget_count,
                d.updated_at.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} dashboard(s)", self.dashboards.len())?;
        Ok(())
    }
}

impl TableDisplay for DashboardConfig {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Dashboard: {}", self.id)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Name:     {}", self.name)?;
        if let Some(description) = &self.description {
            writeln!(writer, "About:    {description}")?;
        }
        writeln!(writer, "Grid:     {} columns, {}px rows, {}px gap", self.columns, self.row_height, self.gap)?;
        writeln!(writer)?;

        if self.widgets.is_empty() {
            writeln!(writer, "Widgets: None")?;
            return Ok(());
        }
        writeln!(writer, "Widgets ({}):", self.widgets.len())?;
        for w in &self.widgets {
            let endpoint = w
                .data_source
                .as_ref()
                .and_then(|s| s.endpoint.as_deref())
                .unwrap_or("-");
            writeln!(
                writer,
                "  {} ({}) at {},{} size {}x{} <- {}",
                w.instance_id, w.widget_id, w.position.x, w.position.y, w.position.cols, w.position.rows, endpoint
            )?;
        }
        Ok(())
    }
}

/// A one-line confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    /// What happened.
    pub message: String,
    /// The dashboard it concerns.
    pub dashboard_id: String,
}

impl TableDisplay for Notice {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// One observed widget state during a run.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetUpdate {
    /// Placement id.
    pub instance_id: String,
    /// Phase name.
    pub phase: &'static str,
    /// Current data.
    pub data: Option<Value>,
    /// Current error message.
    pub error: Option<String>,
    /// Epoch milliseconds of the last successful update.
    pub last_updated: Option<i64>,
}

impl WidgetUpdate {
    /// Snapshot `state` for `instance_id`.
    #[must_use]
    pub fn new(instance_id: impl Into<String>, state: &WidgetState<Value>) -> Self {
        let phase = match state.phase() {
            WidgetPhase::Idle => "idle",
            WidgetPhase::Loading => "loading",
            WidgetPhase::Loaded => "loaded",
            WidgetPhase::Failed => "failed",
        };
        Self {
            instance_id: instance_id.into(),
            phase,
            data: state.data.clone(),
            error: state.error.clone(),
            last_updated: state.last_updated,
        }
    }
}

impl TableDisplay for WidgetUpdate {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let detail = match (&self.error, &self.data) {
            (Some(error), _) => format!("error: {error}"),
            (None, Some(data)) => data.to_string(),
            (None, None) => String::new(),
        };
        writeln!(writer, "[{}] {:<8} {}", self.instance_id, self.phase, detail)?;
        Ok(())
    }
}
