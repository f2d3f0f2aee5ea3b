use std::{fmt, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;

use crate::check::CheckSettings;

pub const DEFAULT_SYMBOL: &str = "TSLA";
pub const DEFAULT_COMPANY_NAME: &str = "Tesla Inc";
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 1.0;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 1;
pub const DEFAULT_ARTICLE_LIMIT: usize = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct Config {
    pub news_api_key: String,
    pub alpha_vantage_api_key: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub recipient_number: String,
    pub sender_number: String,

    pub symbol: String,
    pub company_name: String,
    pub threshold_percent: f64,
    pub lookback_days: u32,
    pub article_limit: usize,
    pub http_timeout: Duration,
    pub market_timezone: Tz,

    pub alpha_vantage_base_url: String,
    pub news_api_base_url: String,
    pub twilio_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("{key} environment variable not set"))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let threshold_percent: f64 =
            parsed(&lookup, "ALERT_THRESHOLD_PERCENT", DEFAULT_THRESHOLD_PERCENT)?;
        if !(threshold_percent.is_finite() && threshold_percent >= 0.0) {
            return Err(anyhow!(
                "ALERT_THRESHOLD_PERCENT must be a non-negative number, got {threshold_percent}"
            ));
        }

        let timeout_secs: u64 =
            parsed(&lookup, "ALERT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(anyhow!("ALERT_HTTP_TIMEOUT_SECS must be at least 1"));
        }

        Ok(Self {
            news_api_key: required("NEWS_API_KEY")?,
            alpha_vantage_api_key: required("ALPHA_VANTAGE_API_KEY")?,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            recipient_number: required("MY_PHONE_NUMBER")?,
            sender_number: required("TWILIO_PHONE_NUMBER")?,

            symbol: or_default("STOCK_SYMBOL", DEFAULT_SYMBOL).to_uppercase(),
            company_name: or_default("COMPANY_NAME", DEFAULT_COMPANY_NAME),
            threshold_percent,
            lookback_days: parsed(&lookup, "ALERT_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS)?,
            article_limit: parsed(&lookup, "ALERT_ARTICLE_LIMIT", DEFAULT_ARTICLE_LIMIT)?,
            http_timeout: Duration::from_secs(timeout_secs),
            market_timezone: timezone(&lookup)?,

            alpha_vantage_base_url: or_default(
                "ALPHA_VANTAGE_BASE_URL",
                "https://www.alphavantage.co",
            ),
            news_api_base_url: or_default("NEWS_API_BASE_URL", "https://newsapi.org"),
            twilio_base_url: or_default("TWILIO_BASE_URL", "https://api.twilio.com"),
        })
    }

    pub fn check_settings(&self) -> CheckSettings {
        CheckSettings {
            symbol: self.symbol.clone(),
            company_name: self.company_name.clone(),
            recipient: self.recipient_number.clone(),
            threshold_percent: self.threshold_percent,
            lookback_days: self.lookback_days,
            article_limit: self.article_limit,
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw
            .parse()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        _ => Ok(default),
    }
}

fn timezone<F>(lookup: &F) -> Result<Tz>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("MARKET_TIMEZONE").map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid MARKET_TIMEZONE: {raw:?} ({e})")),
        _ => Ok(chrono_tz::America::New_York),
    }
}

// keys, tokens and phone numbers stay out of logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("symbol", &self.symbol)
            .field("company_name", &self.company_name)
            .field("threshold_percent", &self.threshold_percent)
            .field("lookback_days", &self.lookback_days)
            .field("article_limit", &self.article_limit)
            .field("http_timeout", &self.http_timeout)
            .field("market_timezone", &self.market_timezone)
            .finish_non_exhaustive()
    }
}
