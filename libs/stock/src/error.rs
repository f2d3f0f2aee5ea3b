use thiserror::Error;

/// Errors raised by the provider clients.
#[derive(Debug, Error)]
pub enum Error {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Transport failure below the HTTP status level.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The provider answered with a non-success status code.
    #[error("{provider} returned status {status}: {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider answered 200 but the body describes an error.
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// The body was missing a field or held a value we could not use.
    #[error("data format unexpected or missing field: {0}")]
    Data(String),

    /// Fewer than two trading days were found on or before the reference date.
    #[error("no two trading days on or before {on_or_before} for {symbol} (found {found})")]
    MissingTradingDay {
        symbol: String,
        on_or_before: chrono::NaiveDate,
        found: usize,
    },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout {
                url: e.url().map(redact).unwrap_or_default(),
            }
        } else {
            // urls carry api keys in the query
            Error::Http(e.without_url())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Data(e.to_string())
    }
}

fn redact(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Turns a non-success response into [`Error::Status`], keeping the
/// provider's own `message` field when the body is JSON.
pub(crate) async fn error_for_status(
    provider: &'static str,
    res: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body.chars().take(200).collect()
            }
        });

    Err(Error::Status {
        provider,
        status: status.as_u16(),
        message,
    })
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
