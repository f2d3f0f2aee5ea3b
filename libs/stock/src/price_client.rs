use std::{collections::BTreeMap, fmt::Display, str::FromStr, time::Duration};

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use crate::error::{Error, Result, error_for_status};
use crate::indicators::change::percent_change;

const PROVIDER: &str = "alpha vantage";

#[derive(Clone)]
pub struct PriceClient {
    client: Client,
    base_api: String,
    api_key: String,
}

impl PriceClient {
    pub fn new(base_api: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_api,
            api_key,
        })
    }

    /// Daily time series for `symbol`, keyed by trading date.
    #[instrument(name = "fetch_daily_series", skip(self))]
    pub async fn fetch_daily_series(&self, symbol: &str) -> Result<DailySeries> {
        let url = format!("{}/query", self.base_api.trim_end_matches('/'));

        let res = self
            .client
            .get(url)
            .query(&[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body = error_for_status(PROVIDER, res).await?.text().await?;

        let series = DailySeries::from_json(symbol, &body)?;
        debug!(bars = series.bars.len(), "fetched daily series");
        Ok(series)
    }

    /// Fetches the series and measures the move between the two most recent
    /// trading days on or before `on_or_before`.
    pub async fn fetch_change(
        &self,
        symbol: &str,
        on_or_before: NaiveDate,
    ) -> Result<PriceChange> {
        let series = self.fetch_daily_series(symbol).await?;
        series.change(on_or_before)
    }
}

#[derive(Debug, Clone)]
pub struct DailySeries {
    pub symbol: String,
    pub bars: BTreeMap<NaiveDate, DailyBar>,
}

impl DailySeries {
    /// Parses a `TIME_SERIES_DAILY*` body. Rate-limit notes and bad-symbol
    /// messages come back with status 200, so they are checked first.
    pub fn from_json(symbol: &str, body: &str) -> Result<Self> {
        let res: DailyResponse = serde_json::from_str(body)?;

        if let Some(message) = res.error_message.or(res.note).or(res.information) {
            return Err(Error::Provider {
                provider: PROVIDER,
                message,
            });
        }

        let bars = res
            .series
            .ok_or_else(|| Error::Data("missing \"Time Series (Daily)\"".to_string()))?;

        Ok(Self {
            symbol: symbol.to_string(),
            bars,
        })
    }

    /// The two latest trading days on or before `on_or_before`. Weekends and
    /// holidays are simply absent from the series, so they are skipped.
    pub fn close_pair(&self, on_or_before: NaiveDate) -> Result<ClosePair> {
        let mut recent = self.bars.range(..=on_or_before).rev();

        match (recent.next(), recent.next()) {
            (Some((&latest_date, latest)), Some((&prior_date, prior))) => Ok(ClosePair {
                latest_date,
                latest_close: latest.close,
                prior_date,
                prior_close: prior.close,
            }),
            _ => Err(Error::MissingTradingDay {
                symbol: self.symbol.clone(),
                on_or_before,
                found: self.bars.range(..=on_or_before).count(),
            }),
        }
    }

    pub fn change(&self, on_or_before: NaiveDate) -> Result<PriceChange> {
        let pair = self.close_pair(on_or_before)?;
        let percent = pair.percent_change()?;

        Ok(PriceChange {
            symbol: self.symbol.clone(),
            pair,
            percent,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePair {
    pub latest_date: NaiveDate,
    pub latest_close: f64,
    pub prior_date: NaiveDate,
    pub prior_close: f64,
}

impl ClosePair {
    pub fn percent_change(&self) -> Result<f64> {
        if !(self.prior_close.is_finite() && self.prior_close > 0.0) {
            return Err(Error::Data(format!(
                "close on {} is {}, cannot measure a change against it",
                self.prior_date, self.prior_close
            )));
        }

        Ok(percent_change(self.latest_close, self.prior_close))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub symbol: String,
    pub pair: ClosePair,
    pub percent: f64,
}

//
// Match Alpha Vantage JSON
// https://www.alphavantage.co/documentation/#dailyadj
//
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<NaiveDate, DailyBar>>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DailyBar {
    #[serde(rename = "1. open", deserialize_with = "number")]
    pub open: f64,

    #[serde(rename = "2. high", deserialize_with = "number")]
    pub high: f64,

    #[serde(rename = "3. low", deserialize_with = "number")]
    pub low: f64,

    #[serde(rename = "4. close", deserialize_with = "number")]
    pub close: f64,

    #[serde(rename = "5. adjusted close", default, deserialize_with = "optional_number")]
    pub adjusted_close: Option<f64>,
}

// numbers arrive quoted
fn number<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(de)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

fn optional_number<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(de)? {
        Some(raw) => raw.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn body(closes: &[(&str, &str)]) -> String {
        let series: serde_json::Map<String, serde_json::Value> = closes
            .iter()
            .map(|(d, c)| {
                (
                    d.to_string(),
                    serde_json::json!({
                        "1. open": "1.0",
                        "2. high": "2.0",
                        "3. low": "0.5",
                        "4. close": c,
                        "5. adjusted close": c,
                        "6. volume": "1000",
                        "7. dividend amount": "0.0000",
                        "8. split coefficient": "1.0"
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "Meta Data": { "2. Symbol": "TSLA" },
            "Time Series (Daily)": series,
        })
        .to_string()
    }

    #[test]
    fn parses_quoted_numbers() {
        let series = DailySeries::from_json("TSLA", &body(&[("2024-03-14", "162.50")])).unwrap();
        let bar = &series.bars[&date("2024-03-14")];

        assert_eq!(bar.close, 162.5);
        assert_eq!(bar.adjusted_close, Some(162.5));
        assert_eq!(bar.high, 2.0);
    }

    #[test]
    fn adjusted_close_is_optional() {
        let body = r#"{"Time Series (Daily)": {"2024-03-14": {
            "1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1"
        }}}"#;
        let series = DailySeries::from_json("TSLA", body).unwrap();

        assert_eq!(series.bars[&date("2024-03-14")].adjusted_close, None);
    }

    #[test]
    fn yesterday_and_day_before() {
        let series = DailySeries::from_json(
            "TSLA",
            &body(&[("2024-03-12", "90.0"), ("2024-03-13", "100.0"), ("2024-03-14", "105.0")]),
        )
        .unwrap();

        let change = series.change(date("2024-03-14")).unwrap();

        assert_eq!(change.pair.latest_date, date("2024-03-14"));
        assert_eq!(change.pair.prior_date, date("2024-03-13"));
        assert!((change.percent - 5.0).abs() < 1e-9);
    }

    #[test]
    fn walks_back_over_weekend() {
        // Friday and Thursday, asked on a Sunday
        let series = DailySeries::from_json(
            "TSLA",
            &body(&[("2024-03-14", "100.0"), ("2024-03-15", "102.0")]),
        )
        .unwrap();

        let pair = series.close_pair(date("2024-03-17")).unwrap();

        assert_eq!(pair.latest_date, date("2024-03-15"));
        assert_eq!(pair.prior_date, date("2024-03-14"));
    }

    #[test]
    fn ignores_dates_after_reference() {
        let series = DailySeries::from_json(
            "TSLA",
            &body(&[("2024-03-13", "100.0"), ("2024-03-14", "101.0"), ("2024-03-15", "500.0")]),
        )
        .unwrap();

        let pair = series.close_pair(date("2024-03-14")).unwrap();

        assert_eq!(pair.latest_close, 101.0);
        assert_eq!(pair.prior_close, 100.0);
    }

    #[test]
    fn single_trading_day_is_missing() {
        let series = DailySeries::from_json("TSLA", &body(&[("2024-03-14", "100.0")])).unwrap();

        match series.close_pair(date("2024-03-14")) {
            Err(Error::MissingTradingDay { found, symbol, .. }) => {
                assert_eq!(found, 1);
                assert_eq!(symbol, "TSLA");
            }
            other => panic!("expected MissingTradingDay, got {other:?}"),
        }
    }

    #[test]
    fn zero_prior_close_is_rejected() {
        let series = DailySeries::from_json(
            "TSLA",
            &body(&[("2024-03-13", "0"), ("2024-03-14", "1.0")]),
        )
        .unwrap();

        assert!(matches!(series.change(date("2024-03-14")), Err(Error::Data(_))));
    }

    #[test]
    fn rate_limit_note_is_a_provider_error() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;

        match DailySeries::from_json("TSLA", body) {
            Err(Error::Provider { message, .. }) => assert!(message.contains("frequency")),
            other => panic!("expected Provider, got {other:?}"),
        }
    }

    #[test]
    fn missing_series_is_data_error() {
        let body = r#"{"Meta Data": {}}"#;
        assert!(matches!(
            DailySeries::from_json("TSLA", body),
            Err(Error::Data(_))
        ));
    }
}
