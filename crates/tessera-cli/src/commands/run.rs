//! Dashboard run command implementation.
//!
//! Mounts a stored dashboard against the mock data provider and prints every
//! widget state change until the run duration elapses or Ctrl+C is pressed.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tessera_widgets::{
    FrameworkConfig, LocalStorageProvider, MockDataConfig, StorageProvider, WidgetFramework,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, WidgetUpdate};

/// Run command executor.
#[derive(Debug)]
pub struct RunCommand<'a> {
    storage_dir: &'a Path,
}

impl<'a> RunCommand<'a> {
    /// Create a run command reading dashboards from `storage_dir`.
    #[must_use]
    pub const fn new(storage_dir: &'a Path) -> Self {
        Self { storage_dir }
    }

    fn framework(&self, args: &RunArgs) -> WidgetFramework {
        let mut mock = MockDataConfig::default().with_latency(Duration::from_millis(args.latency_ms));
        if let Some(seed) = args.seed {
            mock = mock.with_seed(seed);
        }
        let storage: Arc<dyn StorageProvider> = Arc::new(LocalStorageProvider::new(self.storage_dir));
        WidgetFramework::mock_with(mock, |provider| FrameworkConfig::new(provider).with_storage(storage))
    }

    /// Execute the run command.
    pub async fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat, args: &RunArgs) -> Result<(), CliError> {
        let framework = self.framework(args);
        let mut viewer = framework.viewer();
        viewer.load(args.id.as_str()).await?;

        for instance_id in viewer.unknown_widgets() {
            warn!(instance_id = %instance_id, "placement skipped: widget type not in catalog");
        }
        info!(
            dashboard_id = %args.id,
            widgets = viewer.widgets().len(),
            duration_secs = args.duration,
            "running dashboard"
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        for widget in viewer.widgets() {
            let mut state = widget.subscribe();
            let instance_id = widget.instance_id().to_string();
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    let update = WidgetUpdate::new(instance_id.as_str(), &state.borrow_and_update());
                    if tx.send(update).is_err() || state.changed().await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let deadline = tokio::time::sleep(Duration::from_secs(args.duration));
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(deadline, interrupt);

        let mut updates = 0_usize;
        loop {
            tokio::select! {
                () = &mut deadline => break,
                _ = &mut interrupt => {
                    info!("interrupted");
                    break;
                }
                update = rx.recv() => match update {
                    Some(update) => {
                        debug!(instance_id = %update.instance_id, phase = update.phase, "widget update");
                        format.write_line(out, &update)?;
                        updates += 1;
                    }
                    None => break,
                },
            }
        }

        info!(updates, "run finished");
        if !format.is_json() {
            writeln!(out)?;
            writeln!(out, "{updates} update(s) from {} widget(s)", viewer.widgets().len())?;
        }
        Ok(())
    }
}
