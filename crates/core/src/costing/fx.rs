//! USD to INR rate acquisition.
//!
//! One rate is resolved per build. A live fetch runs under a bounded timeout;
//! any failure drops to the configured fallback. Both paths receive the same
//! billing buffer, and the `source` string records which path was taken.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::round_money;

/// Added to every raw rate before billing.
pub const FX_BUFFER_INR: Decimal = Decimal::ONE;

pub const LIVE_SOURCE: &str = "exchangerate.host API +1 INR buffer";
pub const FALLBACK_SOURCE: &str = "Fallback configuration +1 INR buffer";

pub fn apply_buffer(raw: Decimal) -> Decimal {
    round_money(raw + FX_BUFFER_INR)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateRequest {
    pub base: String,
    pub target: String,
}

impl RateRequest {
    pub fn usd_inr() -> Self {
        Self { base: "USD".to_string(), target: "INR".to_string() }
    }
}

#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("rate provider request failed: {0}")]
    Transport(String),
    #[error("rate provider returned HTTP {0}")]
    Status(u16),
    #[error("rate provider payload has no usable {target} rate")]
    MalformedPayload { target: String },
    #[error("rate provider did not answer within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Raw, unbuffered rate for one unit of `request.base`.
    async fn fetch_rate(&self, request: &RateRequest) -> Result<Decimal, RateFetchError>;
}

/// exchangerate.host style endpoint: `GET <url>?base=USD&symbols=INR`,
/// answering `{"rates": {"INR": 83.5}}`.
pub struct HttpRateProvider {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl HttpRateProvider {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, RateFetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| RateFetchError::Transport(error.to_string()))?;
        Ok(Self { client, url: url.into(), api_key })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "exchangerate.host"
    }

    async fn fetch_rate(&self, request: &RateRequest) -> Result<Decimal, RateFetchError> {
        let mut query =
            vec![("base", request.base.clone()), ("symbols", request.target.clone())];
        if let Some(key) = &self.api_key {
            query.push(("access_key", key.expose_secret().to_string()));
        }

        let response = self
            .client
            .get(&self.url)
            .query(&query)
            .send()
            .await
            .map_err(|error| RateFetchError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(RateFetchError::Status(response.status().as_u16()));
        }

        let payload: Value = response.json().await.map_err(|_| {
            RateFetchError::MalformedPayload { target: request.target.clone() }
        })?;
        parse_rate_payload(&payload, &request.target)
    }
}

/// Reads `rates.<target>` (or a bare `rate`) as a positive decimal.
pub fn parse_rate_payload(payload: &Value, target: &str) -> Result<Decimal, RateFetchError> {
    let malformed = || RateFetchError::MalformedPayload { target: target.to_string() };

    let raw = payload
        .get("rates")
        .and_then(|rates| rates.get(target))
        .or_else(|| payload.get("rate"))
        .ok_or_else(malformed)?;

    let rate = match raw {
        Value::Number(number) => decimal_from_text(&number.to_string()),
        Value::String(text) => decimal_from_text(text.trim()),
        _ => None,
    }
    .ok_or_else(malformed)?;

    if rate <= Decimal::ZERO {
        return Err(malformed());
    }
    Ok(rate)
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>().ok().or_else(|| Decimal::from_scientific(text).ok())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePath {
    Live,
    Fallback,
}

/// The billing rate for one build. Never mutated after resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Buffered rate used for every INR figure.
    pub rate: Decimal,
    pub raw_rate: Decimal,
    pub source: String,
    pub path: RatePath,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn live(raw_rate: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Self {
            rate: apply_buffer(raw_rate),
            raw_rate,
            source: LIVE_SOURCE.to_string(),
            path: RatePath::Live,
            fetched_at,
        }
    }

    pub fn fallback(raw_rate: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Self {
            rate: apply_buffer(raw_rate),
            raw_rate,
            source: FALLBACK_SOURCE.to_string(),
            path: RatePath::Fallback,
            fetched_at,
        }
    }

    /// Disclosure line printed under every cost table.
    pub fn disclosure(&self) -> String {
        format!("Note: Exchange rate used: 1 USD = {} INR (Source: {}).", self.rate, self.source)
    }
}

/// Resolves the build's exchange rate. Failure is recovered here and never
/// reaches the caller.
pub struct FxResolver {
    provider: Option<Box<dyn RateProvider>>,
    timeout: Duration,
    fallback_raw: Decimal,
}

impl FxResolver {
    pub fn new(provider: Box<dyn RateProvider>, timeout: Duration, fallback_raw: Decimal) -> Self {
        Self { provider: Some(provider), timeout, fallback_raw }
    }

    /// Always takes the fallback path.
    pub fn offline(fallback_raw: Decimal) -> Self {
        Self { provider: None, timeout: Duration::ZERO, fallback_raw }
    }

    pub fn fallback_raw(&self) -> Decimal {
        self.fallback_raw
    }

    pub async fn resolve(&self) -> ExchangeRate {
        let Some(provider) = self.provider.as_deref() else {
            let rate = ExchangeRate::fallback(self.fallback_raw, Utc::now());
            info!(
                event_name = "fx.rate.offline",
                raw_rate = %rate.raw_rate,
                effective_rate = %rate.rate,
                "live rate fetch disabled; using fallback rate"
            );
            return rate;
        };

        match self.fetch_live(provider).await {
            Ok(raw) => {
                let rate = ExchangeRate::live(raw, Utc::now());
                info!(
                    event_name = "fx.rate.live",
                    provider = provider.name(),
                    raw_rate = %rate.raw_rate,
                    effective_rate = %rate.rate,
                    "fetched live exchange rate"
                );
                rate
            }
            Err(error) => {
                let rate = ExchangeRate::fallback(self.fallback_raw, Utc::now());
                warn!(
                    event_name = "fx.rate.fallback",
                    provider = provider.name(),
                    error = %error,
                    raw_rate = %rate.raw_rate,
                    effective_rate = %rate.rate,
                    "exchange rate fetch failed; using fallback rate"
                );
                rate
            }
        }
    }

    async fn fetch_live(&self, provider: &dyn RateProvider) -> Result<Decimal, RateFetchError> {
        let request = RateRequest::usd_inr();
        match tokio::time::timeout(self.timeout, provider.fetch_rate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(RateFetchError::Timeout(self.timeout)),
        }
    }
}
