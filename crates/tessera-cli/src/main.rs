//! Tessera CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tessera_cli::cli::{Cli, Commands};
use tessera_cli::commands::{CatalogCommand, DashboardCommand, RunCommand};
use tessera_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Catalog(args) => {
            CatalogCommand::new().execute(&mut stdout, &format, args)?;
        }
        Commands::Dashboard { command } => {
            DashboardCommand::new(&cli.storage_dir)
                .execute(&mut stdout, &format, command)
                .await
                .with_context(|| format!("dashboard storage at {}", cli.storage_dir.display()))?;
        }
        Commands::Run(args) => {
            RunCommand::new(&cli.storage_dir)
                .execute(&mut stdout, &format, args)
                .await
                .with_context(|| format!("running dashboard '{}'", args.id))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_catalog() {
        let cli = Cli::parse_from(["tessera", "catalog"]);
        assert!(matches!(cli.command, Commands::Catalog(_)));
    }

    #[tokio::test]
    async fn run_catalog_command() {
        let cli = Cli::parse_from(["tessera", "--format", "json", "catalog"]);
        assert!(run(cli).await.is_ok());
    }

    #[tokio::test]
    async fn run_missing_dashboard_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage_dir = dir.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from(["tessera", "--storage-dir", &storage_dir, "dashboard", "show", "nope"]);
        let err = run(cli).await.unwrap_err();

        assert!(format!("{err:#}").contains("dashboard not found: nope"));
    }
}
