use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use stock::PriceChange;
use stock::indicators::change::{Movement, classify};
use tracing::{debug, error, info, instrument};

use crate::source::{MessageSender, NewsSource, PriceSource};

/// What one run needs to know, independent of where it came from.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub symbol: String,
    pub company_name: String,
    pub recipient: String,
    pub threshold_percent: f64,
    pub lookback_days: u32,
    pub article_limit: usize,
}

#[derive(Debug)]
pub enum Outcome {
    /// The move stayed at or under the threshold; nothing was fetched or sent.
    Within { change: PriceChange },
    Notified {
        change: PriceChange,
        report: DeliveryReport,
    },
}

#[derive(Debug)]
pub struct Delivery {
    pub message: String,
    pub result: stock::Result<String>,
}

/// Per-message results, in send order.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub deliveries: Vec<Delivery>,
}

impl DeliveryReport {
    pub fn sent(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.sent()
    }

    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

#[instrument(
    name = "run_check",
    skip_all,
    fields(symbol = %settings.symbol, today = %today)
)]
pub async fn run_check<P, N, M>(
    settings: &CheckSettings,
    prices: &P,
    news: &N,
    sender: &M,
    today: NaiveDate,
) -> Result<Outcome>
where
    P: PriceSource,
    N: NewsSource,
    M: MessageSender,
{
    let reference = today
        .checked_sub_days(Days::new(u64::from(settings.lookback_days)))
        .ok_or_else(|| anyhow!("lookback of {} days is out of range", settings.lookback_days))?;

    let change = prices
        .price_change(&settings.symbol, reference)
        .await
        .with_context(|| format!("measuring price change for {}", settings.symbol))?;

    info!(
        change = change.percent,
        threshold = settings.threshold_percent,
        latest = %change.pair.latest_date,
        prior = %change.pair.prior_date,
        "measured price change"
    );

    if classify(change.percent, settings.threshold_percent) == Movement::Within {
        info!("move within threshold, nothing to send");
        return Ok(Outcome::Within { change });
    }

    let messages = news
        .summaries(&settings.company_name, reference, settings.article_limit)
        .await
        .with_context(|| format!("fetching news for {}", settings.company_name))?;
    info!(articles = messages.len(), "fetched news");

    let report = deliver(sender, &settings.recipient, messages).await;

    Ok(Outcome::Notified { change, report })
}

/// Sends every message in order; one failed send does not stop the rest.
pub async fn deliver<M>(sender: &M, to: &str, messages: Vec<String>) -> DeliveryReport
where
    M: MessageSender,
{
    let mut report = DeliveryReport::default();

    for message in messages {
        let result = sender.send(to, &message).await;

        match &result {
            Ok(sid) => debug!(sid = %sid, "delivered"),
            Err(e) => error!(error = %e, "send failed"),
        }

        report.deliveries.push(Delivery { message, result });
    }

    info!(
        sent = report.sent(),
        failed = report.failed(),
        "completed delivery"
    );

    report
}
