//! Capability contracts the framework depends on but never implements.
//!
//! All three traits are object safe: async operations return boxed futures
//! and push channels return boxed streams, so hosts can hand the framework
//! `Arc<dyn DataProvider>` without the framework knowing the concrete type.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use futures::Stream;
use serde_json::Value;

use crate::error::ProviderResult;
use crate::types::{DashboardConfig, DashboardSummary};

/// Boxed future returned by provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

/// Long-lived sequence of pushed values. Dropping it cancels the subscription.
pub type ValueStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// Fetch parameters.
pub type Params = HashMap<String, Value>;

/// Fetches widget data from a backend.
pub trait DataProvider: Send + Sync {
    /// Fetch the value behind `endpoint`.
    ///
    /// Implementations must always complete, successfully or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or times out.
    fn fetch<'a>(&'a self, endpoint: &'a str, params: Option<&'a Params>)
    -> ProviderFuture<'a, Value>;

    /// Subscribe to push updates on `channel`, if this provider supports it.
    fn subscribe(&self, _channel: &str) -> Option<ValueStream> {
        None
    }
}

/// Loads and saves dashboard layouts.
pub trait StorageProvider: Send + Sync {
    /// Load a dashboard. `Ok(None)` means it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    fn load<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, Option<DashboardConfig>>;

    /// Save a dashboard under `id`, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn save<'a>(&'a self, id: &'a str, config: &'a DashboardConfig) -> ProviderFuture<'a, ()>;

    /// Delete a dashboard. Deleting a missing dashboard is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn delete<'a>(&'a self, id: &'a str) -> ProviderFuture<'a, ()>;

    /// List stored dashboards.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    fn list(&self) -> ProviderFuture<'_, Vec<DashboardSummary>>;
}

/// Delivers pushed values on named channels.
///
/// There is no error channel: a provider that loses its connection simply
/// stops emitting.
pub trait RealtimeProvider: Send + Sync {
    /// Subscribe to `channel`.
    fn subscribe(&self, channel: &str) -> ValueStream;

    /// Release any upstream resources held for `channel`.
    fn unsubscribe(&self, _channel: &str) {}

    /// Whether the upstream connection is currently established.
    fn is_connected(&self) -> bool {
        false
    }
}
