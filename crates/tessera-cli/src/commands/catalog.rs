//! Widget catalog command implementation.

use std::io::Write;

use tessera_widgets::{WidgetCategory, WidgetRegistry, builtin_widgets};

use crate::cli::CatalogArgs;
use crate::error::CliError;
use crate::output::{CatalogList, OutputFormat};

/// Catalog command executor.
#[derive(Debug)]
pub struct CatalogCommand {
    registry: WidgetRegistry,
}

impl Default for CatalogCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCommand {
    /// Create a catalog command over the built-in widgets.
    #[must_use]
    pub fn new() -> Self {
        let registry = WidgetRegistry::new();
        registry.register_many(builtin_widgets());
        Self { registry }
    }

    /// Execute the catalog command.
    pub fn execute<W: Write>(&self, out: &mut W, format: &OutputFormat, args: &CatalogArgs) -> Result<(), CliError> {
        let list = self.list(args.search.as_deref(), args.category.map(WidgetCategory::from));
        format.write(out, &list)
    }

    /// Definitions matching the optional search and category filters.
    #[must_use]
    pub fn list(&self, search: Option<&str>, category: Option<WidgetCategory>) -> CatalogList {
        let found = match search {
            Some(query) => self.registry.search(query),
            None => self.registry.get_all(),
        };

        let widgets = found
            .into_iter()
            .filter(|d| category.is_none_or(|c| d.category == c))
            .map(|d| (*d).clone())
            .collect();

        CatalogList { widgets }
    }
}
