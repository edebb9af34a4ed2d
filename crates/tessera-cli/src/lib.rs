//! # tessera-cli
//!
//! Command-line tooling for the Tessera widget framework.
//!
//! Provides commands for:
//! - Listing and searching the built-in widget catalog
//! - Scaffolding, listing, showing and deleting stored dashboards
//! - Running a stored dashboard against the mock data provider
//!
//! Dashboards are stored as JSON files under `--storage-dir`
//! (default `.tessera/dashboards`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{CatalogArgs, Cli, Commands, DashboardCommands, Format, RunArgs};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
