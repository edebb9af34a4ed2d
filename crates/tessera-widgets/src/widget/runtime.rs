//! The per-instance event loop.
//!
//! One task owns the state sender and is its only writer. Host commands,
//! timer ticks, realtime pushes and fetch completions are all handled by
//! this loop, one event at a time.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::error::{ProviderResult, WidgetError};
use crate::provider::{RealtimeProvider, ValueStream};
use crate::retry::fetch_with_retry;
use crate::types::WidgetDataSource;

use super::context::{OverlapPolicy, WidgetContext};
use super::{WidgetBehavior, WidgetState};

/// Messages from the widget handle to its runtime.
pub(crate) enum Command<D> {
    /// Fetch now, without touching the timer.
    Refresh,
    /// Replace the data source and re-arm triggers.
    SetDataSource(Option<WidgetDataSource>),
    /// Replace the initial-data override.
    SetInitialData(Option<D>),
    /// Stop the loop.
    Shutdown,
}

/// What caused a fetch, for logging.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Initial,
    Manual,
    Timer,
}

type FetchFuture = BoxFuture<'static, (u64, ProviderResult<Value>)>;

/// An open realtime channel. Dropping it unsubscribes.
struct Subscription {
    channel: String,
    stream: ValueStream,
    provider: Option<Arc<dyn RealtimeProvider>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(provider) = &self.provider {
            provider.unsubscribe(&self.channel);
        }
    }
}

pub(crate) struct Runtime<B: WidgetBehavior> {
    instance_id: String,
    behavior: Arc<B>,
    ctx: WidgetContext,
    source: Option<WidgetDataSource>,
    has_initial_data: bool,
    state: watch::Sender<WidgetState<B::Data>>,
    in_flight: FuturesUnordered<FetchFuture>,
    next_seq: u64,
    ticker: Option<Interval>,
    subscription: Option<Subscription>,
}

impl<B: WidgetBehavior> Runtime<B> {
    pub(crate) fn new(
        instance_id: String,
        behavior: Arc<B>,
        ctx: WidgetContext,
        source: Option<WidgetDataSource>,
        has_initial_data: bool,
        state: watch::Sender<WidgetState<B::Data>>,
    ) -> Self {
        Self {
            instance_id,
            behavior,
            ctx,
            source,
            has_initial_data,
            state,
            in_flight: FuturesUnordered::new(),
            next_seq: 0,
            ticker: None,
            subscription: None,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<B::Data>>) {
        self.resolve_configuration();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some((seq, result)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.apply_fetch(seq, result);
                }
                () = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    self.start_fetch(Trigger::Timer);
                }
                message = next_push(&mut self.subscription), if self.subscription.is_some() => {
                    match message {
                        Some(value) => self.apply_push(value),
                        None => {
                            debug!(instance_id = %self.instance_id, "realtime stream ended");
                            self.subscription = None;
                        }
                    }
                }
            }
        }

        debug!(instance_id = %self.instance_id, "widget runtime stopped");
    }

    fn handle_command(&mut self, command: Command<B::Data>) {
        match command {
            Command::Refresh => self.start_fetch(Trigger::Manual),
            Command::SetDataSource(source) => {
                self.source = source;
                self.resolve_configuration();
            }
            Command::SetInitialData(Some(data)) => {
                self.has_initial_data = true;
                self.discard_in_flight();
                self.apply_data(data, false);
                self.resolve_configuration();
            }
            Command::SetInitialData(None) => {
                self.has_initial_data = false;
                self.resolve_configuration();
            }
            Command::Shutdown => {}
        }
    }

    /// Re-arm timer and realtime for the current source, and issue the
    /// initial fetch unless initial data overrides it.
    ///
    /// Fetches started for a previous source never reach the state.
    fn resolve_configuration(&mut self) {
        self.ticker = None;
        self.subscription = None;
        self.discard_in_flight();

        if self.has_initial_data {
            return;
        }
        let Some(source) = self.source.clone() else {
            return;
        };

        let fetchable = match (&source.endpoint, self.ctx.data_provider()) {
            (Some(endpoint), None) => {
                warn!(
                    instance_id = %self.instance_id,
                    endpoint = %endpoint,
                    "no data provider registered, widget will not load data"
                );
                false
            }
            (endpoint, _) => endpoint.is_some(),
        };

        if fetchable {
            if let Some(period) = source.refresh_period() {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
        }

        if let Some(channel) = &source.ws_channel {
            self.subscription = self.open_subscription(channel);
        }

        if fetchable {
            self.start_fetch(Trigger::Initial);
        }
    }

    fn discard_in_flight(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }
        debug!(instance_id = %self.instance_id, pending = self.in_flight.len(), "discarding in-flight fetches");
        self.in_flight = FuturesUnordered::new();
        self.state.send_modify(|state| state.loading = false);
    }

    fn open_subscription(&self, channel: &str) -> Option<Subscription> {
        if let Some(provider) = self.ctx.realtime_provider() {
            return Some(Subscription {
                channel: channel.to_string(),
                stream: provider.subscribe(channel),
                provider: Some(Arc::clone(provider)),
            });
        }

        let stream = self
            .ctx
            .data_provider()
            .and_then(|provider| provider.subscribe(channel));
        if stream.is_none() {
            debug!(instance_id = %self.instance_id, channel, "no realtime provider for channel");
        }
        stream.map(|stream| Subscription {
            channel: channel.to_string(),
            stream,
            provider: None,
        })
    }

    fn start_fetch(&mut self, trigger: Trigger) {
        let Some(endpoint) = self.source.as_ref().and_then(|s| s.endpoint.clone()) else {
            return;
        };
        let Some(provider) = self.ctx.data_provider().cloned() else {
            debug!(instance_id = %self.instance_id, endpoint = %endpoint, "refresh ignored without a data provider");
            return;
        };

        if self.ctx.overlap_policy() == OverlapPolicy::SwitchLatest && !self.in_flight.is_empty() {
            debug!(instance_id = %self.instance_id, "cancelling superseded fetch");
            self.in_flight = FuturesUnordered::new();
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let params = self.source.as_ref().and_then(|s| s.params.clone());
        let policy = self.ctx.retry_policy();

        debug!(instance_id = %self.instance_id, endpoint = %endpoint, ?trigger, seq, "starting fetch");
        self.in_flight.push(
            async move { (seq, fetch_with_retry(provider, endpoint, params, policy).await) }.boxed(),
        );

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn apply_fetch(&mut self, seq: u64, result: ProviderResult<Value>) {
        let still_loading = !self.in_flight.is_empty();
        debug!(instance_id = %self.instance_id, seq, ok = result.is_ok(), "fetch resolved");

        let outcome = result
            .map_err(WidgetError::from)
            .and_then(|raw| self.behavior.transform_data(raw));

        match outcome {
            Ok(data) => {
                self.apply_data(data, still_loading);
            }
            Err(e) => {
                let message = self.behavior.handle_error(&e);
                self.state.send_modify(|state| {
                    state.loading = still_loading;
                    state.error = Some(message);
                });
            }
        }
    }

    fn apply_push(&mut self, raw: Value) {
        match self.behavior.transform_data(raw) {
            Ok(data) => {
                let loading = !self.in_flight.is_empty();
                self.apply_data(data, loading);
            }
            Err(e) => {
                warn!(instance_id = %self.instance_id, error = %e, "dropping malformed realtime message");
            }
        }
    }

    fn apply_data(&self, data: B::Data, loading: bool) {
        let now = chrono::Utc::now().timestamp_millis();
        self.state.send_modify(|state| {
            state.data = Some(data);
            state.loading = loading;
            state.error = None;
            state.last_updated = Some(now);
        });
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_push(subscription: &mut Option<Subscription>) -> Option<Value> {
    match subscription {
        Some(subscription) => subscription.stream.next().await,
        None => std::future::pending().await,
    }
}
