use chrono::{DateTime, NaiveDate};
use monitor_core::common::utils::nonzero;
use monitor_core::stock::Snapshot;
use monitor_core::{ErrCode, MonitorError, PriceProvider, ProviderQuote};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tokio::sync::Mutex;

const BASE_URL: &str = "https://query2.finance.yahoo.com";
/// Answers 404, but sets the session cookie the crumb is bound to
const COOKIE_URL: &str = "https://fc.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";

/// Quote snapshot from `quoteSummary` plus daily closes from `chart`.
pub struct YahooProvider {
    client: Client,
    base_url: Url,
    history_range: String,
    crumb: Mutex<Option<String>>,
}

impl YahooProvider {
    pub fn new(user_agent: &str, history_range: &str) -> anyhow::Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: Url::parse(BASE_URL)?,
            history_range: history_range.to_string(),
            crumb: Mutex::new(None),
        })
    }

    async fn get(&self, url: Url) -> Result<Response, MonitorError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &url));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, MonitorError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| MonitorError::new(e.without_url().to_string(), ErrCode::Decode))
    }

    /// Session crumb for `quoteSummary`. Fetched once, then reused.
    async fn crumb(&self) -> Result<String, MonitorError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // only the cookie matters here, not the status
        self.client
            .get(COOKIE_URL)
            .send()
            .await
            .map_err(http_error)?;
        let url = endpoint(&self.base_url, &["v1", "test", "getcrumb"], &[])?;
        let body = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|e| MonitorError::new(e.without_url().to_string(), ErrCode::Decode))?;
        let crumb = parse_crumb(&body)?;
        log::debug!("obtained a quoteSummary crumb");

        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<Snapshot, MonitorError> {
        let crumb = self.crumb().await?;
        let url = endpoint(
            &self.base_url,
            &["v10", "finance", "quoteSummary", symbol],
            &[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())],
        )?;
        let body: QuoteSummaryResponse = self.get_json(url).await?;
        body.into_snapshot(symbol)
    }

    /// A rejected crumb is dropped and the call retried once with a fresh one
    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<Snapshot, MonitorError> {
        match self.fetch_summary(symbol).await {
            Err(e) if e.errcode == ErrCode::Unauthorized => {
                log::debug!("[{symbol}] renewing crumb after {e}");
                *self.crumb.lock().await = None;
                self.fetch_summary(symbol).await
            }
            other => other,
        }
    }

    pub async fn fetch_history(&self, symbol: &str) -> Result<ChartHistory, MonitorError> {
        let url = endpoint(
            &self.base_url,
            &["v8", "finance", "chart", symbol],
            &[("interval", "1d"), ("range", self.history_range.as_str())],
        )?;
        let body: ChartResponse = self.get_json(url).await?;
        body.into_history(symbol)
    }
}

impl PriceProvider for YahooProvider {
    async fn fetch(&self, symbol: &str) -> Result<ProviderQuote, MonitorError> {
        let (snapshot, history) =
            tokio::join!(self.fetch_snapshot(symbol), self.fetch_history(symbol));
        combine(symbol, snapshot, history)
    }
}

/// The symbol is one encoded path segment, so it cannot reach the query
fn endpoint(base: &Url, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, MonitorError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| MonitorError::new(format!("{base} cannot be a base URL"), ErrCode::ConfigError))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn http_error(err: reqwest::Error) -> MonitorError {
    MonitorError::new(err.without_url().to_string(), ErrCode::Http)
}

/// Only the path is reported, the query may carry the crumb
fn status_error(status: StatusCode, url: &Url) -> MonitorError {
    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrCode::Unauthorized,
        _ => ErrCode::HttpStatus,
    };
    MonitorError::new(format!("{status} from {}", url.path()), code)
}

fn parse_crumb(body: &str) -> Result<String, MonitorError> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.starts_with('<') || crumb.contains(char::is_whitespace) {
        return Err(MonitorError::new("no crumb in getcrumb response", ErrCode::Unauthorized));
    }
    Ok(crumb.to_string())
}

/// Snapshot and chart are fetched side by side. When the snapshot fails the
/// chart's own metadata stands in for it; the symbol fails only if both do.
fn combine(
    symbol: &str,
    snapshot: Result<Snapshot, MonitorError>,
    history: Result<ChartHistory, MonitorError>,
) -> Result<ProviderQuote, MonitorError> {
    match (snapshot, history) {
        (Ok(snapshot), history) => Ok(ProviderQuote {
            snapshot,
            history: history.map(|h| h.closes),
        }),
        (Err(e), Ok(history)) => {
            log::warn!("[{symbol}] quote summary unavailable, using chart metadata: {e}");
            Ok(ProviderQuote {
                snapshot: history.meta.into_snapshot(),
                history: Ok(history.closes),
            })
        }
        (Err(e), Err(_)) => Err(e),
    }
}

// `quoteSummary` schema
#[derive(Deserialize, Debug)]
pub struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummary,
}

#[derive(Deserialize, Debug)]
pub struct QuoteSummary {
    pub result: Option<Vec<QuoteModules>>,
    pub error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteModules {
    pub price: Option<PriceModule>,
    #[serde(default)]
    pub summary_detail: SummaryDetail,
    #[serde(default)]
    pub asset_profile: AssetProfile,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    #[serde(default)]
    pub regular_market_price: RawValue,
    /// A fraction, e.g. 0.0123 for +1.23%
    #[serde(default)]
    pub regular_market_change_percent: RawValue,
    #[serde(default)]
    pub market_cap: RawValue,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    #[serde(default, rename = "trailingPE")]
    pub trailing_pe: RawValue,
}

#[derive(Deserialize, Debug, Default)]
pub struct AssetProfile {
    pub sector: Option<String>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent
#[derive(Deserialize, Debug, Default)]
pub struct RawValue {
    pub raw: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct YahooError {
    pub code: Option<String>,
    pub description: Option<String>,
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

fn no_data(symbol: &str, error: Option<&YahooError>) -> MonitorError {
    let msg = match error {
        Some(e) => format!("[{symbol}] {e}"),
        None => format!("[{symbol}] empty result"),
    };
    MonitorError::new(msg, ErrCode::NoData)
}

impl QuoteSummaryResponse {
    pub fn into_snapshot(self, symbol: &str) -> Result<Snapshot, MonitorError> {
        let summary = self.quote_summary;
        let modules = summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| no_data(symbol, summary.error.as_ref()))?;
        let price = modules.price.ok_or_else(|| {
            MonitorError::new(format!("[{symbol}] price module missing"), ErrCode::MissingField)
        })?;

        Ok(Snapshot {
            name: price.short_name.or(price.long_name),
            price: price.regular_market_price.raw,
            change_percent: price.regular_market_change_percent.raw.map(|v| v * 100.0),
            sector: modules.asset_profile.sector,
            market_cap: price
                .market_cap
                .raw
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64),
            pe_ratio: modules.summary_detail.trailing_pe.raw,
        })
    }
}

// `chart` schema
#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Deserialize, Debug)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(rename = "timestamp", default, deserialize_with = "de_timestamps")]
    pub dates: Vec<NaiveDate>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
}

impl ChartMeta {
    /// The chart knows name and price only
    pub fn into_snapshot(self) -> Snapshot {
        let change_percent = self
            .regular_market_price
            .zip(nonzero(self.previous_close))
            .map(|(price, prev)| (price - prev) / prev * 100.0);
        Snapshot {
            name: self.short_name.or(self.long_name),
            price: self.regular_market_price,
            change_percent,
            ..Snapshot::default()
        }
    }
}

/// Closing prices, oldest first, with the chart metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ChartHistory {
    pub closes: Vec<f64>,
    pub meta: ChartMeta,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    pub quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

pub fn de_timestamps<'de, D>(deserializer: D) -> Result<Vec<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let timestamps: Vec<i64> = Deserialize::deserialize(deserializer)?;
    timestamps
        .into_iter()
        .map(|ts| {
            DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ts}")))
        })
        .collect()
}

impl ChartResponse {
    /// Days without a close are skipped.
    pub fn into_history(self, symbol: &str) -> Result<ChartHistory, MonitorError> {
        let chart = self.chart;
        let result = chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| no_data(symbol, chart.error.as_ref()))?;
        let quote = result.indicators.quote.into_iter().next().ok_or_else(|| {
            MonitorError::new(format!("[{symbol}] quote indicators missing"), ErrCode::MissingField)
        })?;

        let mut cells: Vec<(Option<NaiveDate>, f64)> = quote
            .close
            .into_iter()
            .enumerate()
            .filter_map(|(i, close)| close.map(|c| (result.dates.get(i).copied(), c)))
            .filter(|(_, c)| c.is_finite())
            .collect();
        if cells.iter().all(|(date, _)| date.is_some()) {
            cells.sort_by_key(|(date, _)| *date);
        }
        if let Some((Some(last), _)) = cells.last() {
            log::debug!("[{symbol}] {} closes through {last}", cells.len());
        }
        Ok(ChartHistory {
            closes: cells.into_iter().map(|(_, c)| c).collect(),
            meta: result.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": [{
                "price": {
                    "shortName": "Apple Inc.",
                    "regularMarketPrice": {"raw": 189.5, "fmt": "189.50"},
                    "regularMarketChangePercent": {"raw": 0.0125, "fmt": "1.25%"},
                    "marketCap": {"raw": 2950000000000, "fmt": "2.95T"}
                },
                "summaryDetail": {"trailingPE": {"raw": 29.4, "fmt": "29.40"}},
                "assetProfile": {"sector": "Technology"}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_snapshot() {
        let body: QuoteSummaryResponse = serde_json::from_str(SUMMARY).unwrap();
        let snap = body.into_snapshot("AAPL").unwrap();
        assert_eq!(snap.name.as_deref(), Some("Apple Inc."));
        assert_eq!(snap.price, Some(189.5));
        assert_eq!(snap.change_percent, Some(1.25));
        assert_eq!(snap.market_cap, Some(2_950_000_000_000));
        assert_eq!(snap.pe_ratio, Some(29.4));
        assert_eq!(snap.sector.as_deref(), Some("Technology"));
    }

    #[test]
    fn test_snapshot_with_empty_values() {
        let json = r#"{"quoteSummary": {"result": [{
            "price": {"longName": "Some Fund", "regularMarketPrice": {}, "marketCap": {}}
        }], "error": null}}"#;
        let body: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        let snap = body.into_snapshot("FUND").unwrap();
        assert_eq!(snap.name.as_deref(), Some("Some Fund"));
        assert_eq!(snap.price, None);
        assert_eq!(snap.market_cap, None);
        assert_eq!(snap.sector, None);
        assert_eq!(snap.pe_ratio, None);
    }

    #[test]
    fn test_snapshot_not_found() {
        let json = r#"{"quoteSummary": {"result": null, "error": {
            "code": "Not Found", "description": "Quote not found for symbol: ZZZZ"
        }}}"#;
        let body: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        let err = body.into_snapshot("ZZZZ").unwrap_err();
        assert_eq!(err.errcode, ErrCode::NoData);
        assert!(err.is_fetch_err());
        assert!(err.msg.contains("Quote not found"));
    }

    #[test]
    fn test_snapshot_without_price_module() {
        let json = r#"{"quoteSummary": {"result": [{"assetProfile": {}}], "error": null}}"#;
        let body: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.into_snapshot("X").unwrap_err().errcode, ErrCode::MissingField);
    }

    #[test]
    fn test_closes_skip_nulls() {
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "AAPL"},
            "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
            "indicators": {"quote": [{"close": [185.64, null, 181.91, 181.18]}]}
        }], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.into_history("AAPL").unwrap().closes, vec![185.64, 181.91, 181.18]);
    }

    #[test]
    fn test_closes_no_data() {
        let json = r#"{"chart": {"result": null, "error": {
            "code": "Not Found", "description": "No data found, symbol may be delisted"
        }}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.into_history("ZZZZ").unwrap_err().errcode, ErrCode::NoData);
    }

    #[test]
    fn test_closes_without_timestamps() {
        let json = r#"{"chart": {"result": [{"indicators": {"quote": [{}]}}], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(body.into_history("NEW").unwrap().closes.is_empty());
    }

    #[test]
    fn test_closes_keep_chart_meta() {
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "AAPL", "shortName": "Apple Inc.",
                     "regularMarketPrice": 181.18, "previousClose": 181.91},
            "timestamp": [1704378600, 1704465000],
            "indicators": {"quote": [{"close": [181.91, 181.18]}]}
        }], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let history = body.into_history("AAPL").unwrap();
        assert_eq!(history.meta.short_name.as_deref(), Some("Apple Inc."));
        assert_eq!(history.meta.regular_market_price, Some(181.18));

        let snap = history.meta.into_snapshot();
        assert_eq!(snap.price, Some(181.18));
        let change = snap.change_percent.unwrap();
        assert!((change - (181.18 - 181.91) / 181.91 * 100.0).abs() < 1e-9);
        assert_eq!(snap.sector, None);
        assert_eq!(snap.market_cap, None);
    }

    fn history(closes: &[f64], price: f64) -> ChartHistory {
        ChartHistory {
            closes: closes.to_vec(),
            meta: ChartMeta {
                long_name: Some("Microsoft Corporation".to_string()),
                regular_market_price: Some(price),
                ..ChartMeta::default()
            },
        }
    }

    #[test]
    fn test_rejected_summary_falls_back_to_chart() {
        let rejected = Err(MonitorError::new("401 Unauthorized", ErrCode::Unauthorized));
        let quote = combine("MSFT", rejected, Ok(history(&[400.0, 410.0], 410.0))).unwrap();
        assert_eq!(quote.snapshot.name.as_deref(), Some("Microsoft Corporation"));
        assert_eq!(quote.snapshot.price, Some(410.0));
        assert_eq!(quote.snapshot.change_percent, None);
        assert_eq!(quote.history.unwrap(), vec![400.0, 410.0]);
    }

    #[test]
    fn test_summary_wins_over_chart_meta() {
        let snapshot = Snapshot {
            name: Some("Microsoft".to_string()),
            price: Some(411.0),
            ..Snapshot::default()
        };
        let quote = combine("MSFT", Ok(snapshot.clone()), Ok(history(&[400.0], 410.0))).unwrap();
        assert_eq!(quote.snapshot, snapshot);

        let down = Err(MonitorError::new("503", ErrCode::HttpStatus));
        let quote = combine("MSFT", Ok(snapshot), down).unwrap();
        assert_eq!(quote.history.unwrap_err().errcode, ErrCode::HttpStatus);
    }

    #[test]
    fn test_both_failures_fail_the_symbol() {
        let summary = Err(MonitorError::new("401 Unauthorized", ErrCode::Unauthorized));
        let chart = Err(MonitorError::new("timeout", ErrCode::Http));
        let err = combine("MSFT", summary, chart).unwrap_err();
        assert_eq!(err.errcode, ErrCode::Unauthorized);
    }

    #[test]
    fn test_endpoint_encodes_symbol_and_range() {
        let base = Url::parse(BASE_URL).unwrap();
        let url = endpoint(
            &base,
            &["v8", "finance", "chart", "A&B?C/D"],
            &[("interval", "1d"), ("range", "1mo&interval=1m")],
        )
        .unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/A&B%3FC%2FD");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("interval".to_string(), "1d".to_string()),
                ("range".to_string(), "1mo&interval=1m".to_string()),
            ]
        );

        let crumb_url = endpoint(&base, &["v1", "test", "getcrumb"], &[]).unwrap();
        assert_eq!(crumb_url.as_str(), "https://query2.finance.yahoo.com/v1/test/getcrumb");
    }

    #[test]
    fn test_status_error_kinds() {
        let url = Url::parse("https://query2.finance.yahoo.com/v10/finance/quoteSummary/AAPL?crumb=secret").unwrap();
        let denied = status_error(StatusCode::UNAUTHORIZED, &url);
        assert_eq!(denied.errcode, ErrCode::Unauthorized);
        assert!(!denied.msg.contains("secret"));
        assert_eq!(status_error(StatusCode::FORBIDDEN, &url).errcode, ErrCode::Unauthorized);
        assert_eq!(status_error(StatusCode::NOT_FOUND, &url).errcode, ErrCode::HttpStatus);
    }

    #[test]
    fn test_parse_crumb() {
        assert_eq!(parse_crumb("aB3x/Yz.9k\n").unwrap(), "aB3x/Yz.9k");
        assert_eq!(parse_crumb("").unwrap_err().errcode, ErrCode::Unauthorized);
        assert!(parse_crumb("<html><body>blocked</body></html>").is_err());
        assert!(parse_crumb("Too Many Requests").is_err());
    }
}
