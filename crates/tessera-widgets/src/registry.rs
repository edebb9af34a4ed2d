//! In-memory catalog of widget definitions.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::types::{WidgetCategory, WidgetDefinition};

/// Catalog of widget types, keyed by definition id.
///
/// Written at startup and read afterwards; lookups return clones so no lock
/// is held by callers. Definitions keep their first-registration order, and
/// an overwrite keeps the original slot.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    definitions: RwLock<Vec<Arc<WidgetDefinition>>>,
}

impl WidgetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any previous one with the same id.
    pub fn register(&self, definition: WidgetDefinition) {
        let mut definitions = self.definitions.write();

        if let Some(slot) = definitions.iter_mut().find(|d| d.id == definition.id) {
            warn!(widget_id = %definition.id, "widget already registered, overwriting");
            *slot = Arc::new(definition);
            return;
        }

        debug!(widget_id = %definition.id, category = %definition.category, "registered widget");
        definitions.push(Arc::new(definition));
    }

    /// Register each definition in order.
    pub fn register_many(&self, definitions: impl IntoIterator<Item = WidgetDefinition>) {
        for definition in definitions {
            self.register(definition);
        }
    }

    /// Look up a definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<WidgetDefinition>> {
        self.definitions.read().iter().find(|d| d.id == id).cloned()
    }

    /// Whether a definition with this id exists.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.definitions.read().iter().any(|d| d.id == id)
    }

    /// All definitions in registration order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<WidgetDefinition>> {
        self.definitions.read().clone()
    }

    /// Definitions in `category`.
    #[must_use]
    pub fn get_by_category(&self, category: WidgetCategory) -> Vec<Arc<WidgetDefinition>> {
        self.definitions
            .read()
            .iter()
            .filter(|d| d.category == category)
            .cloned()
            .collect()
    }

    /// Definitions whose name, description, or any tag contains `query`,
    /// ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Arc<WidgetDefinition>> {
        let needle = query.to_lowercase();
        self.definitions
            .read()
            .iter()
            .filter(|d| d.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Remove every definition.
    pub fn clear(&self) {
        self.definitions.write().clear();
    }
}
