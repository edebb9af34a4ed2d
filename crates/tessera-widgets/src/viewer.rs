//! Loads a dashboard and runs one widget runtime per placement.

use tracing::{debug, info, warn};

use crate::error::ViewerError;
use crate::framework::WidgetFramework;
use crate::types::DashboardConfig;
use crate::widget::{JsonWidget, Widget};

/// Load state of a [`DashboardViewer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerState {
    /// Nothing requested yet, or a load is in progress.
    Loading,
    /// The dashboard is mounted.
    Ready(DashboardConfig),
    /// Storage has no dashboard with the requested id.
    NotFound(String),
    /// Storage failed; carries the display message.
    Failed(String),
}

#[derive(Debug, Clone)]
enum ViewerSource {
    Id(String),
    Config(DashboardConfig),
}

/// Owns the widget runtimes of one displayed dashboard.
///
/// Loading a new dashboard, or dropping the viewer, tears down the
/// runtimes of the previous one.
#[derive(Debug)]
pub struct DashboardViewer {
    framework: WidgetFramework,
    source: Option<ViewerSource>,
    state: ViewerState,
    widgets: Vec<Widget<JsonWidget>>,
    unknown: Vec<String>,
}

impl DashboardViewer {
    /// Viewer with nothing loaded.
    #[must_use]
    pub const fn new(framework: WidgetFramework) -> Self {
        Self {
            framework,
            source: None,
            state: ViewerState::Loading,
            widgets: Vec::new(),
            unknown: Vec::new(),
        }
    }

    /// Load dashboard `id` from storage and mount it.
    pub async fn load(&mut self, id: impl Into<String>) -> Result<(), ViewerError> {
        self.source = Some(ViewerSource::Id(id.into()));
        self.reload().await
    }

    /// Mount `config` directly, bypassing storage.
    pub fn show(&mut self, config: DashboardConfig) {
        self.source = Some(ViewerSource::Config(config.clone()));
        self.mount(config);
    }

    /// Repeat the last load.
    pub async fn retry(&mut self) -> Result<(), ViewerError> {
        self.reload().await
    }

    async fn reload(&mut self) -> Result<(), ViewerError> {
        self.unmount();
        self.state = ViewerState::Loading;

        let id = match &self.source {
            None => return Err(ViewerError::NoSource),
            Some(ViewerSource::Config(config)) => {
                let config = config.clone();
                self.mount(config);
                return Ok(());
            }
            Some(ViewerSource::Id(id)) => id.clone(),
        };

        match self.framework.storage().load(&id).await {
            Ok(Some(config)) => {
                self.mount(config);
                Ok(())
            }
            Ok(None) => {
                let err = ViewerError::NotFound(id);
                info!(error = %err, "dashboard not found");
                self.state = ViewerState::NotFound(err.to_string());
                Err(err)
            }
            Err(e) => {
                let err = ViewerError::Load(e);
                warn!(dashboard_id = %id, error = %err, "dashboard load failed");
                self.state = ViewerState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    fn mount(&mut self, config: DashboardConfig) {
        self.unmount();

        for placement in &config.widgets {
            match self.framework.spawn_placement(placement) {
                Some(widget) => self.widgets.push(widget),
                None => {
                    warn!(
                        instance_id = %placement.instance_id,
                        widget_id = %placement.widget_id,
                        "unknown widget type, skipping placement"
                    );
                    self.unknown.push(placement.instance_id.clone());
                }
            }
        }

        debug!(
            dashboard_id = %config.id,
            widgets = self.widgets.len(),
            unknown = self.unknown.len(),
            "dashboard mounted"
        );
        self.state = ViewerState::Ready(config);
    }

    fn unmount(&mut self) {
        self.widgets.clear();
        self.unknown.clear();
    }

    /// Current load state.
    #[must_use]
    pub const fn state(&self) -> &ViewerState {
        &self.state
    }

    /// The mounted dashboard, if ready.
    #[must_use]
    pub const fn dashboard(&self) -> Option<&DashboardConfig> {
        match &self.state {
            ViewerState::Ready(config) => Some(config),
            _ => None,
        }
    }

    /// Running widget runtimes, in placement order.
    #[must_use]
    pub fn widgets(&self) -> &[Widget<JsonWidget>] {
        &self.widgets
    }

    /// Runtime for a placement.
    #[must_use]
    pub fn widget(&self, instance_id: &str) -> Option<&Widget<JsonWidget>> {
        self.widgets.iter().find(|w| w.instance_id() == instance_id)
    }

    /// Placements whose widget type is not registered.
    #[must_use]
    pub fn unknown_widgets(&self) -> &[String] {
        &self.unknown
    }
}
