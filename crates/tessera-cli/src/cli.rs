//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tessera_widgets::WidgetCategory;

/// Tessera - dashboard widget framework tooling.
#[derive(Parser, Debug, Clone)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding stored dashboards.
    #[arg(short, long, env = "TESSERA_STORAGE_DIR", default_value = tessera_widgets::storage::DEFAULT_STORAGE_DIR)]
    pub storage_dir: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Widget category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Single-value indicators.
    Metrics,
    /// Series visualisations.
    Charts,
    /// Tabular and list data.
    Data,
    /// Progress and gauges.
    Progress,
    /// Informational tiles.
    Display,
    /// Host-defined widgets.
    Custom,
}

impl From<CategoryArg> for WidgetCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Metrics => Self::Metrics,
            CategoryArg::Charts => Self::Charts,
            CategoryArg::Data => Self::Data,
            CategoryArg::Progress => Self::Progress,
            CategoryArg::Display => Self::Display,
            CategoryArg::Custom => Self::Custom,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List or search the widget catalog.
    Catalog(CatalogArgs),

    /// Dashboard storage commands.
    Dashboard {
        /// Dashboard subcommand to execute.
        #[command(subcommand)]
        command: DashboardCommands,
    },

    /// Run a stored dashboard against mock data and print widget updates.
    Run(RunArgs),
}

/// Arguments for the catalog command.
#[derive(Parser, Debug, Clone)]
pub struct CatalogArgs {
    /// Only show widgets in this category.
    #[arg(short, long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Case-insensitive search over name, description and tags.
    #[arg(short = 'q', long)]
    pub search: Option<String>,
}

/// Dashboard subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DashboardCommands {
    /// Write a sample dashboard using every built-in widget.
    Init {
        /// Dashboard ID.
        id: String,

        /// Display name.
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing dashboard.
        #[arg(long)]
        force: bool,
    },

    /// List stored dashboards.
    List,

    /// Show a stored dashboard.
    Show {
        /// Dashboard ID.
        id: String,
    },

    /// Delete a stored dashboard.
    Delete {
        /// Dashboard ID.
        id: String,
    },
}

/// Arguments for the run command.
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Dashboard ID.
    pub id: String,

    /// Seconds to run before exiting.
    #[arg(short, long, default_value_t = 10)]
    pub duration: u64,

    /// Mock provider latency in milliseconds.
    #[arg(long, env = "TESSERA_MOCK_LATENCY_MS", default_value_t = 500)]
    pub latency_ms: u64,

    /// Seed for reproducible mock data.
    #[arg(long)]
    pub seed: Option<u64>,
}
