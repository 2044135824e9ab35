use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::api::{AccountSource, MarketData, OrderGateway};
use crate::config::Credentials;
use crate::error::{BotError, Result};
use crate::models::{Candle, OrderFill, Side};

const BINANCE_API_BASE: &str = "https://api.binance.com";
const RATE_LIMIT_RPM: u32 = 60;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 10;

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot REST client.
///
/// Implements all three exchange-facing ports: klines, account balance and
/// market orders. Clones share the rate limiter. Read endpoints retry with
/// backoff on 429/5xx; order submission never retries (the next cycle does
/// that naturally if conditions persist).
#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
    rate_limiter: Arc<DirectRateLimiter>,
}

/// One kline row as Binance returns it: a 12-element heterogeneous array,
/// prices and volumes as strings.
type KlineRow = (
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    u64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // ignore
);

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    free: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    symbol: String,
    client_order_id: String,
    executed_qty: String,
    #[serde(default)]
    fills: Vec<OrderFillEntry>,
}

#[derive(Debug, Deserialize)]
struct OrderFillEntry {
    price: String,
    qty: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    code: i64,
    msg: String,
}

impl BinanceClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, BINANCE_API_BASE)
    }

    /// Point the client at a different host (exchange testnet, mock server)
    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BotError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(
            NonZeroU32::new(RATE_LIMIT_RPM)
                .ok_or_else(|| BotError::Configuration("rate limit must be non-zero".into()))?,
        );

        Ok(Self {
            http,
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// HMAC-SHA256 of the query string, hex-encoded
    fn sign(&self, query: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn timestamp_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Rate-limited GET with bounded retry on 429/5xx/network errors.
    /// Returns the failure reason as a string; the caller maps it into the
    /// taxonomy for its endpoint.
    async fn get_with_retry(&self, url: &str) -> std::result::Result<reqwest::Response, String> {
        for attempt in 1..=MAX_RETRIES {
            self.rate_limiter.until_ready().await;

            match self.http.get(url).header("X-MBX-APIKEY", &self.api_key).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if (status.as_u16() == 429 || status.is_server_error())
                        && attempt < MAX_RETRIES
                    {
                        let backoff_secs = 2u64.pow(attempt);
                        tracing::warn!(
                            "Binance returned {}, backing off {}s (attempt {}/{})",
                            status,
                            backoff_secs,
                            attempt,
                            MAX_RETRIES
                        );
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(format!("HTTP {status}: {body}"));
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff_secs = 2u64.pow(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {}s (attempt {}/{})",
                        e,
                        backoff_secs,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                }
                Err(e) => return Err(format!("network error after {MAX_RETRIES} attempts: {e}")),
            }
        }

        Err(format!("failed after {MAX_RETRIES} attempts"))
    }

    fn parse_candle(symbol: &str, row: &KlineRow) -> std::result::Result<Candle, String> {
        let open_time: DateTime<Utc> = DateTime::from_timestamp_millis(row.0)
            .ok_or_else(|| format!("bad kline timestamp {}", row.0))?;

        let num = |s: &str, field: &str| -> std::result::Result<f64, String> {
            s.parse::<f64>().map_err(|e| format!("bad {field} '{s}': {e}"))
        };

        Ok(Candle {
            symbol: symbol.to_string(),
            open_time,
            open: num(&row.1, "open")?,
            high: num(&row.2, "high")?,
            low: num(&row.3, "low")?,
            close: num(&row.4, "close")?,
            volume: num(&row.5, "volume")?,
        })
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let response = self
            .get_with_retry(&url)
            .await
            .map_err(|reason| BotError::data_unavailable(symbol, reason))?;

        let rows: Vec<KlineRow> = response
            .json()
            .await
            .map_err(|e| BotError::data_unavailable(symbol, format!("bad kline payload: {e}")))?;

        rows.iter()
            .map(|row| {
                Self::parse_candle(symbol, row)
                    .map_err(|reason| BotError::data_unavailable(symbol, reason))
            })
            .collect()
    }
}

#[async_trait]
impl AccountSource for BinanceClient {
    async fn free_balance(&self, asset: &str) -> Result<f64> {
        let query = format!("timestamp={}", Self::timestamp_ms());
        let url = format!(
            "{}/api/v3/account?{}&signature={}",
            self.base_url,
            query,
            self.sign(&query)
        );

        let response = self
            .get_with_retry(&url)
            .await
            .map_err(|reason| BotError::data_unavailable(asset, reason))?;

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| BotError::data_unavailable(asset, format!("bad account payload: {e}")))?;

        let free = match account.balances.iter().find(|b| b.asset == asset) {
            Some(balance) => balance.free.parse::<f64>().map_err(|e| {
                BotError::data_unavailable(asset, format!("bad balance '{}': {e}", balance.free))
            })?,
            None => 0.0,
        };

        Ok(free.max(0.0))
    }
}

#[async_trait]
impl OrderGateway for BinanceClient {
    async fn market_order(&self, symbol: &str, side: Side, quantity: f64) -> Result<OrderFill> {
        let client_order_id = Uuid::new_v4().to_string();
        let query = format!(
            "symbol={}&side={}&type=MARKET&quantity={}&newClientOrderId={}&timestamp={}",
            symbol,
            side.as_str(),
            quantity,
            client_order_id,
            Self::timestamp_ms()
        );
        let url = format!(
            "{}/api/v3/order?{}&signature={}",
            self.base_url,
            query,
            self.sign(&query)
        );

        self.rate_limiter.until_ready().await;

        // Single attempt: a failed submission is reported, not retried
        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| BotError::OrderSubmissionFault(format!("{symbol}: {e}")))?;

        let status = response.status();

        if status.is_client_error() {
            let reason = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.msg,
                Err(_) => format!("HTTP {status}"),
            };
            return Err(BotError::OrderRejected(format!("{symbol}: {reason}")));
        }

        if !status.is_success() {
            return Err(BotError::OrderSubmissionFault(format!(
                "{symbol}: HTTP {status}"
            )));
        }

        let order: OrderResponse = response.json().await.map_err(|e| {
            BotError::OrderSubmissionFault(format!("{symbol}: bad order payload: {e}"))
        })?;

        let executed_qty = order.executed_qty.parse::<f64>().map_err(|e| {
            BotError::OrderSubmissionFault(format!(
                "{symbol}: bad executedQty '{}': {e}",
                order.executed_qty
            ))
        })?;

        Ok(OrderFill {
            symbol: order.symbol,
            side,
            quantity: executed_qty,
            price: average_fill_price(&order.fills),
            order_id: order.client_order_id,
        })
    }
}

/// Quantity-weighted average over the reported fills, when any parse
fn average_fill_price(fills: &[OrderFillEntry]) -> Option<f64> {
    let mut total_qty = 0.0;
    let mut total_quote = 0.0;

    for fill in fills {
        let (price, qty) = match (fill.price.parse::<f64>(), fill.qty.parse::<f64>()) {
            (Ok(p), Ok(q)) => (p, q),
            _ => continue,
        };
        total_qty += qty;
        total_quote += price * qty;
    }

    if total_qty > 0.0 {
        Some(total_quote / total_qty)
    } else {
        None
    }
}
