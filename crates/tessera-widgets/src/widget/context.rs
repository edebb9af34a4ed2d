//! Providers and policies shared by every widget runtime.

use std::fmt;
use std::sync::Arc;

use crate::provider::{DataProvider, RealtimeProvider};
use crate::retry::RetryPolicy;

/// How a fetch triggered while another is in flight is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Both attempts run; whichever resolves last sets the state.
    ///
    /// A slow early fetch can overwrite a faster later one.
    #[default]
    LastResolvedWins,
    /// A new trigger cancels any attempt still in flight.
    SwitchLatest,
}

/// Everything a widget runtime needs from its environment.
#[derive(Clone, Default)]
pub struct WidgetContext {
    data_provider: Option<Arc<dyn DataProvider>>,
    realtime_provider: Option<Arc<dyn RealtimeProvider>>,
    retry_policy: RetryPolicy,
    overlap_policy: OverlapPolicy,
}

impl WidgetContext {
    /// Context with the given data provider and default policies.
    pub fn new(data_provider: Arc<dyn DataProvider>) -> Self {
        Self {
            data_provider: Some(data_provider),
            ..Self::default()
        }
    }

    /// Set the realtime provider.
    #[must_use]
    pub fn with_realtime_provider(mut self, provider: Arc<dyn RealtimeProvider>) -> Self {
        self.realtime_provider = Some(provider);
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the overlap policy.
    #[must_use]
    pub const fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Data provider, if one is registered.
    #[must_use]
    pub fn data_provider(&self) -> Option<&Arc<dyn DataProvider>> {
        self.data_provider.as_ref()
    }

    /// Realtime provider, if one is registered.
    #[must_use]
    pub fn realtime_provider(&self) -> Option<&Arc<dyn RealtimeProvider>> {
        self.realtime_provider.as_ref()
    }

    /// Retry policy for fetches.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Overlap policy for fetches.
    #[must_use]
    pub const fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap_policy
    }
}

impl fmt::Debug for WidgetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetContext")
            .field("data_provider", &self.data_provider.is_some())
            .field("realtime_provider", &self.realtime_provider.is_some())
            .field("retry_policy", &self.retry_policy)
            .field("overlap_policy", &self.overlap_policy)
            .finish()
    }
}
