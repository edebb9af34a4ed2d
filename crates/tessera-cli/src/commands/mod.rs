//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`catalog`] - Widget catalog listing and search
//! - [`dashboard`] - Stored dashboard management
//! - [`run`] - Mock-data dashboard runs

pub mod catalog;
pub mod dashboard;
pub mod run;

pub use catalog::CatalogCommand;
pub use dashboard::{DashboardCommand, sample_dashboard};
pub use run::RunCommand;
