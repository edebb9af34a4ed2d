//! Dashboard storage backends.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{ProviderFuture, StorageProvider};
use crate::types::{DashboardConfig, DashboardSummary};

/// Default directory for file-backed dashboards, relative to the working
/// directory.
pub const DEFAULT_STORAGE_DIR: &str = ".tessera/dashboards";

const EXTENSION: &str = "json";

/// Stores each dashboard as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    dir: PathBuf,
}

impl Default for LocalStorageProvider {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_DIR)
    }
}

impl LocalStorageProvider {
    /// Store dashboards under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> ProviderResult<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ProviderError::request(id, "invalid dashboard id"));
        }
        Ok(self.dir.join(format!("{id}.{EXTENSION}")))
    }

    async fn read_config(path: &Path) -> ProviderResult<Option<DashboardConfig>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl StorageProvider for LocalStorageProvider {
    fn load<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, Option<DashboardConfig>> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            let config = Self::read_config(&path).await?;
            debug!(dashboard_id = %id, found = config.is_some(), "loaded dashboard");
            Ok(config)
        })
    }

    fn save<'a>(&'a self, id: &'a str, config: &'a DashboardConfig) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            let json = serde_json::to_vec_pretty(config)?;

            tokio::fs::create_dir_all(&self.dir).await?;
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, json).await?;
            tokio::fs::rename(&tmp, &path).await?;

            debug!(dashboard_id = %id, path = %path.display(), "saved dashboard");
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(id)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(dashboard_id = %id, "deleted dashboard");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn list(&self) -> ProviderFuture<'_, Vec<DashboardSummary>> {
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(&self.dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut summaries = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                    continue;
                };
                match Self::read_config(&path).await {
                    Ok(Some(config)) => summaries.push(DashboardSummary {
                        id: stem,
                        ..config.summary()
                    }),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable dashboard");
                    }
                }
            }

            summaries.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(summaries)
        })
    }
}

/// Keeps dashboards in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorageProvider {
    dashboards: RwLock<HashMap<String, DashboardConfig>>,
}

impl MemoryStorageProvider {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `configs`, keyed by their ids.
    pub fn with_dashboards(configs: impl IntoIterator<Item = DashboardConfig>) -> Self {
        let dashboards = configs.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            dashboards: RwLock::new(dashboards),
        }
    }

    /// Number of stored dashboards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dashboards.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dashboards.read().is_empty()
    }
}

impl StorageProvider for MemoryStorageProvider {
    fn load<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, Option<DashboardConfig>> {
        Box::pin(async move { Ok(self.dashboards.read().get(id).cloned()) })
    }

    fn save<'a>(&'a self, id: &'a str, config: &'a DashboardConfig) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.dashboards.write().insert(id.to_string(), config.clone());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            self.dashboards.write().remove(id);
            Ok(())
        })
    }

    fn list(&self) -> ProviderFuture<'_, Vec<DashboardSummary>> {
        Box::pin(async move {
            let mut summaries: Vec<_> = self
                .dashboards
                .read()
                .iter()
                .map(|(id, config)| DashboardSummary {
                    id: id.clone(),
                    ..config.summary()
                })
                .collect();
            summaries.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(summaries)
        })
    }
}
