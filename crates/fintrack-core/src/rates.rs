//! Currency conversion with a time-boxed exchange-rate cache
//!
//! Rates come from a [`RateSource`] keyed by base currency. [`RateCache`]
//! keeps one entry per base and refetches once the entry is older than the
//! configured TTL. If a refetch fails, the stale entry keeps serving.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::RatesConfig;
use crate::error::{Error, Result};
use crate::models::Account;
use crate::money::round_cents;

/// Where exchange rates come from
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of each currency per one unit of `base`
    async fn fetch(&self, base: &str) -> Result<HashMap<String, f64>>;
}

/// exchangerate-api v4 response body
#[derive(Debug, Deserialize)]
struct RateResponse {
    rates: HashMap<String, f64>,
}

/// Rate source backed by an exchangerate-api compatible HTTP endpoint
pub struct HttpRateSource {
    http_client: reqwest::Client,
    api_url: String,
}

impl HttpRateSource {
    pub fn new(config: &RatesConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, base: &str) -> String {
        format!("{}/{}", self.api_url, base)
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self, base: &str) -> Result<HashMap<String, f64>> {
        let url = self.endpoint(base);
        debug!("Fetching exchange rates from {}", url);

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Rates(format!(
                "Rate API error {}: {}",
                status, body
            )));
        }

        let body: RateResponse = response.json().await?;
        Ok(body.rates)
    }
}

struct CacheEntry {
    rates: HashMap<String, f64>,
    fetched_at: DateTime<Utc>,
}

/// One account's balance expressed in another currency
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedBalance {
    pub account_id: i64,
    pub name: String,
    pub currency: String,
    pub balance: Decimal,
    pub converted: Decimal,
}

/// Balances of several accounts in a common currency
#[derive(Debug, Clone, Serialize)]
pub struct AccountsTotal {
    pub base: String,
    pub accounts: Vec<ConvertedBalance>,
    pub total: Decimal,
}

/// Per-base cache of exchange rates in front of a [`RateSource`]
pub struct RateCache<S: RateSource> {
    source: S,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: RateSource> RateCache<S> {
    pub fn new(source: S, config: &RatesConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, config: &RatesConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            ttl: Duration::from_std(config.cache_ttl).unwrap_or_else(|_| Duration::hours(12)),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, base: &str) -> Option<(HashMap<String, f64>, bool)> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(base).map(|entry| {
            let fresh = self.clock.now() - entry.fetched_at < self.ttl;
            (entry.rates.clone(), fresh)
        })
    }

    /// Rates with `base` as the unit; the base itself is always present at 1.0
    pub async fn rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let base = normalize_code(base)?;

        let cached = self.cached(&base);
        if let Some((rates, true)) = &cached {
            return Ok(rates.clone());
        }

        match self.source.fetch(&base).await {
            Ok(mut rates) => {
                rates.insert(base.clone(), 1.0);
                self.entries
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(
                        base.clone(),
                        CacheEntry {
                            rates: rates.clone(),
                            fetched_at: self.clock.now(),
                        },
                    );
                debug!("Cached {} rates for {}", rates.len(), base);
                Ok(rates)
            }
            Err(e) => match cached {
                Some((rates, _)) => {
                    warn!("Rate refresh for {} failed, serving stale rates: {}", base, e);
                    Ok(rates)
                }
                None => Err(e),
            },
        }
    }

    /// Convert `amount` from one currency to another, rounded to cents
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
        let from = normalize_code(from)?;
        let to = normalize_code(to)?;
        if from == to {
            return Ok(round_cents(amount));
        }

        let rates = self.rates(&to).await?;
        let rate = rates
            .get(&from)
            .copied()
            .ok_or_else(|| Error::Rates(format!("Unknown currency: {}", from)))?;
        let rate = Decimal::try_from(rate)
            .ok()
            .filter(|r| *r > Decimal::ZERO)
            .ok_or_else(|| Error::Rates(format!("Unusable rate for {}: {}", from, rate)))?;

        amount
            .checked_div(rate)
            .map(round_cents)
            .ok_or_else(|| Error::Rates(format!("Conversion overflow for {} {}", amount, from)))
    }

    /// Convert every account balance into `base` and sum them
    pub async fn convert_accounts(&self, accounts: &[Account], base: &str) -> Result<AccountsTotal> {
        let base = normalize_code(base)?;
        let mut converted = Vec::with_capacity(accounts.len());
        let mut total = Decimal::ZERO;

        for account in accounts {
            let value = self.convert(account.balance, &account.currency, &base).await?;
            total += value;
            converted.push(ConvertedBalance {
                account_id: account.id,
                name: account.name.clone(),
                currency: account.currency.clone(),
                balance: account.balance,
                converted: value,
            });
        }

        Ok(AccountsTotal {
            base,
            accounts: converted,
            total: round_cents(total),
        })
    }
}

fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Rates(format!("Not a currency code: {}", code)));
    }
    Ok(code)
}
