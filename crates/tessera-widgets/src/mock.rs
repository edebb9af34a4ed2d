//! Data providers that need no backend.
//!
//! [`MockDataProvider`] generates plausible payloads for the built-in widget
//! types, keyed by substrings of the endpoint. [`StaticDataProvider`] returns
//! scripted responses and counts calls, for host tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{DataProvider, Params, ProviderFuture};

const MOCK_TOTAL_ROWS: u64 = 47;
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Settings for [`MockDataProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDataConfig {
    /// Artificial latency before every response.
    pub latency: Duration,
    /// Seed for reproducible payloads. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MockDataConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(500),
            seed: None,
        }
    }
}

impl MockDataConfig {
    /// Set the artificial latency.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Payload family chosen from an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockKind {
    Kpi,
    Chart,
    Table,
    List,
    Progress,
    Unknown,
}

impl MockKind {
    fn from_endpoint(endpoint: &str) -> Self {
        let endpoint = endpoint.to_lowercase();
        if endpoint.contains("kpi") || endpoint.contains("stats") {
            Self::Kpi
        } else if endpoint.contains("chart") || endpoint.contains("trend") {
            Self::Chart
        } else if endpoint.contains("table") {
            Self::Table
        } else if endpoint.contains("list") {
            Self::List
        } else if endpoint.contains("progress") {
            Self::Progress
        } else {
            Self::Unknown
        }
    }
}

/// Generates random widget payloads after a fixed latency.
///
/// Endpoints are matched by substring: `kpi`/`stats`, `chart`/`trend`,
/// `table`, `list`, `progress`. Anything else yields an empty object.
#[derive(Debug)]
pub struct MockDataProvider {
    config: MockDataConfig,
    rng: Mutex<StdRng>,
}

impl Default for MockDataProvider {
    fn default() -> Self {
        Self::new(MockDataConfig::default())
    }
}

impl MockDataProvider {
    /// Create a provider with the given settings.
    #[must_use]
    pub fn new(config: MockDataConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    /// The provider's settings.
    #[must_use]
    pub const fn config(&self) -> &MockDataConfig {
        &self.config
    }

    /// Build the payload for `endpoint` without waiting.
    pub fn generate(&self, endpoint: &str, params: Option<&Params>) -> Value {
        let mut rng = self.rng.lock();
        match MockKind::from_endpoint(endpoint) {
            MockKind::Kpi => kpi_payload(&mut *rng),
            MockKind::Chart => chart_payload(&mut *rng),
            MockKind::Table => table_payload(&mut *rng, params),
            MockKind::List => list_payload(&mut *rng, params),
            MockKind::Progress => progress_payload(&mut *rng),
            MockKind::Unknown => Value::Object(serde_json::Map::new()),
        }
    }
}

impl DataProvider for MockDataProvider {
    fn fetch<'a>(&'a self, endpoint: &'a str, params: Option<&'a Params>) -> ProviderFuture<'a, Value> {
        Box::pin(async move {
            if !self.config.latency.is_zero() {
                tokio::time::sleep(self.config.latency).await;
            }
            debug!(endpoint, "serving mock payload");
            Ok(self.generate(endpoint, params))
        })
    }
}

fn kpi_payload(rng: &mut impl Rng) -> Value {
    let value = rng.gen_range(1_000..100_000);
    let change = f64::from(rng.gen_range(-150..=150)) / 10.0;
    let trend = if change > 0.0 {
        "up"
    } else if change < 0.0 {
        "down"
    } else {
        "neutral"
    };
    let sparkline: Vec<u32> = (0..12).map(|_| rng.gen_range(10..100)).collect();

    json!({
        "value": value,
        "change": change,
        "trend": trend,
        "previousLabel": "vs last month",
        "sparkline": sparkline,
    })
}

fn chart_payload(rng: &mut impl Rng) -> Value {
    let labels = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
    let series: Vec<Value> = ["Revenue", "Expenses"]
        .iter()
        .map(|name| {
            let data: Vec<u32> = labels.iter().map(|_| rng.gen_range(100..1_000)).collect();
            json!({ "name": name, "data": data })
        })
        .collect();

    json!({ "labels": labels, "series": series })
}

/// One-based page and page size from fetch params.
fn paging(params: Option<&Params>) -> (u64, u64) {
    let read = |keys: &[&str]| {
        params.and_then(|p| keys.iter().find_map(|k| p.get(*k)).and_then(Value::as_u64))
    };
    let page = read(&["page"]).filter(|p| *p > 0).unwrap_or(1);
    let size = read(&["pageSize", "page_size"])
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (page, size)
}

fn page_range(params: Option<&Params>) -> (u64, u64, std::ops::Range<u64>) {
    let (page, size) = paging(params);
    let start = (page - 1).saturating_mul(size).min(MOCK_TOTAL_ROWS);
    let end = start.saturating_add(size).min(MOCK_TOTAL_ROWS);
    (page, size, start..end)
}

fn table_payload(rng: &mut impl Rng, params: Option<&Params>) -> Value {
    const STATUSES: [&str; 3] = ["active", "pending", "inactive"];
    let (page, size, rows) = page_range(params);
    let items: Vec<Value> = rows
        .map(|i| {
            json!({
                "id": i + 1,
                "name": format!("Item {}", i + 1),
                "status": STATUSES[rng.gen_range(0..STATUSES.len())],
                "value": rng.gen_range(10..10_000),
            })
        })
        .collect();

    json!({ "items": items, "total": MOCK_TOTAL_ROWS, "page": page, "pageSize": size })
}

fn list_payload(rng: &mut impl Rng, params: Option<&Params>) -> Value {
    let (page, size, rows) = page_range(params);
    let items: Vec<Value> = rows
        .map(|i| {
            json!({
                "id": (i + 1).to_string(),
                "title": format!("Entry {}", i + 1),
                "subtitle": format!("{} minutes ago", rng.gen_range(1..60)),
            })
        })
        .collect();

    json!({ "items": items, "total": MOCK_TOTAL_ROWS, "page": page, "pageSize": size })
}

fn progress_payload(rng: &mut impl Rng) -> Value {
    json!({ "value": rng.gen_range(0..=100), "max": 100, "label": "Completion" })
}

/// Scripted response for an endpoint.
#[derive(Debug, Clone)]
enum Scripted {
    Value(Value),
    Fail(String),
}

impl Scripted {
    fn to_result(&self, endpoint: &str) -> ProviderResult<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Fail(message) => Err(ProviderError::request(endpoint, message.clone())),
        }
    }
}

#[derive(Debug, Default)]
struct EndpointScript {
    queued: VecDeque<(Duration, ProviderResult<Value>)>,
    fallback: Option<Scripted>,
    calls: usize,
}

/// Provider returning scripted responses.
///
/// Queued responses are served first, in order; once the queue is empty the
/// standing response set with [`set_response`](Self::set_response) or
/// [`fail`](Self::fail) is returned. Unscripted endpoints fail.
#[derive(Debug, Default)]
pub struct StaticDataProvider {
    scripts: Mutex<HashMap<String, EndpointScript>>,
    latency: Duration,
}

impl StaticDataProvider {
    /// Create a provider with no scripted endpoints and no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every standing response by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Always answer `endpoint` with `value`.
    pub fn set_response(&self, endpoint: impl Into<String>, value: Value) {
        self.scripts.lock().entry(endpoint.into()).or_default().fallback = Some(Scripted::Value(value));
    }

    /// Always fail `endpoint` with `message`.
    pub fn fail(&self, endpoint: impl Into<String>, message: impl Into<String>) {
        self.scripts.lock().entry(endpoint.into()).or_default().fallback = Some(Scripted::Fail(message.into()));
    }

    /// Queue a one-shot response served with the provider's latency.
    pub fn push_result(&self, endpoint: impl Into<String>, result: ProviderResult<Value>) {
        self.push_delayed(endpoint, self.latency, result);
    }

    /// Queue a one-shot response served after `delay`.
    pub fn push_delayed(&self, endpoint: impl Into<String>, delay: Duration, result: ProviderResult<Value>) {
        self.scripts
            .lock()
            .entry(endpoint.into())
            .or_default()
            .queued
            .push_back((delay, result));
    }

    /// Calls made against `endpoint`.
    #[must_use]
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.scripts.lock().get(endpoint).map_or(0, |s| s.calls)
    }

    /// Calls made against every endpoint.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.scripts.lock().values().map(|s| s.calls).sum()
    }

    fn next_response(&self, endpoint: &str) -> (Duration, ProviderResult<Value>) {
        let mut scripts = self.scripts.lock();
        let script = scripts.entry(endpoint.to_string()).or_default();
        script.calls += 1;

        if let Some(queued) = script.queued.pop_front() {
            return queued;
        }
        match &script.fallback {
            Some(scripted) => (self.latency, scripted.to_result(endpoint)),
            None => (
                self.latency,
                Err(ProviderError::request(endpoint, "no response scripted")),
            ),
        }
    }
}

impl DataProvider for StaticDataProvider {
    fn fetch<'a>(&'a self, endpoint: &'a str, _params: Option<&'a Params>) -> ProviderFuture<'a, Value> {
        Box::pin(async move {
            let (delay, result) = self.next_response(endpoint);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn seeded() -> MockDataProvider {
        MockDataProvider::new(MockDataConfig::default().with_latency(Duration::ZERO).with_seed(7))
    }

    #[test_case("/api/kpi/revenue", MockKind::Kpi ; "kpi")]
    #[test_case("/stats/revenue", MockKind::Kpi ; "stats")]
    #[test_case("/api/chart/sales", MockKind::Chart ; "chart")]
    #[test_case("/api/trend", MockKind::Chart ; "trend")]
    #[test_case("/api/table/orders", MockKind::Table ; "table")]
    #[test_case("/api/list/activity", MockKind::List ; "list")]
    #[test_case("/api/progress", MockKind::Progress ; "progress")]
    #[test_case("/api/other", MockKind::Unknown ; "unknown")]
    fn test_kind_from_endpoint(endpoint: &str, expected: MockKind) {
        assert_eq!(MockKind::from_endpoint(endpoint), expected);
    }

    #[test]
    fn test_kpi_payload_shape() {
        let value = seeded().generate("/api/kpi", None);

        assert!(value["value"].is_number());
        assert!(value["change"].is_number());
        assert!(matches!(value["trend"].as_str(), Some("up" | "down" | "neutral")));
        assert_eq!(value["sparkline"].as_array().map(Vec::len), Some(12));
    }

    #[test]
    fn test_chart_payload_shape() {
        let value = seeded().generate("/api/chart", None);

        assert_eq!(value["labels"].as_array().map(Vec::len), Some(6));
        assert_eq!(value["series"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["series"][0]["data"].as_array().map(Vec::len), Some(6));
    }

    #[test]
    fn test_table_honours_paging() {
        let mut params = Params::new();
        params.insert("page".into(), json!(5));
        params.insert("pageSize".into(), json!(10));

        let value = seeded().generate("/api/table", Some(&params));

        assert_eq!(value["total"], json!(MOCK_TOTAL_ROWS));
        assert_eq!(value["page"], json!(5));
        // Last page of 47 rows holds 7.
        assert_eq!(value["items"].as_array().map(Vec::len), Some(7));
        assert_eq!(value["items"][0]["id"], json!(41));
    }

    #[test]
    fn test_list_page_past_end_is_empty() {
        let mut params = Params::new();
        params.insert("page".into(), json!(99));
        params.insert("page_size".into(), json!(20));

        let value = seeded().generate("/api/list", Some(&params));

        assert_eq!(value["items"], json!([]));
        assert_eq!(value["pageSize"], json!(20));
    }

    #[test]
    fn test_unknown_endpoint_is_empty_object() {
        assert_eq!(seeded().generate("/api/unknown", None), json!({}));
    }

    #[test]
    fn test_same_seed_same_payload() {
        let a = seeded().generate("/api/kpi", None);
        let b = seeded().generate("/api/kpi", None);
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let provider = MockDataProvider::new(MockDataConfig::default());
        let start = tokio::time::Instant::now();

        provider.fetch("/api/progress", None).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_static_provider_scripts() {
        let provider = StaticDataProvider::new();
        provider.push_result("/a", Ok(json!("first")));
        provider.set_response("/a", json!("standing"));
        provider.fail("/b", "down");

        assert_eq!(provider.fetch("/a", None).await.unwrap(), json!("first"));
        assert_eq!(provider.fetch("/a", None).await.unwrap(), json!("standing"));
        assert_eq!(provider.fetch("/a", None).await.unwrap(), json!("standing"));

        let err = provider.fetch("/b", None).await.unwrap_err();
        assert!(err.to_string().contains("down"));
        assert!(provider.fetch("/c", None).await.is_err());

        assert_eq!(provider.call_count("/a"), 3);
        assert_eq!(provider.total_calls(), 5);
    }
}
