use alert::{Config, Outcome, run_check};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use stock::{NewsClient, PriceClient, SmsClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    info!(?config, "configuration loaded");

    let price_client = PriceClient::new(
        config.alpha_vantage_base_url.clone(),
        config.alpha_vantage_api_key.clone(),
        config.http_timeout,
    )
    .context("init price client failed")?;
    let news_client = NewsClient::new(
        config.news_api_base_url.clone(),
        config.news_api_key.clone(),
        config.http_timeout,
    )
    .context("init news client failed")?;
    let sms_client = SmsClient::new(
        config.twilio_base_url.clone(),
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.sender_number.clone(),
        config.http_timeout,
    )
    .context("init sms client failed")?;

    let today = Utc::now()
        .with_timezone(&config.market_timezone)
        .date_naive();

    let outcome = run_check(
        &config.check_settings(),
        &price_client,
        &news_client,
        &sms_client,
        today,
    )
    .await?;

    match outcome {
        Outcome::Within { change } => {
            info!(change = change.percent, "done, no alert");
        }
        Outcome::Notified { change, report } => {
            if !report.is_complete() {
                bail!(
                    "{} of {} messages failed to send",
                    report.failed(),
                    report.deliveries.len()
                );
            }
            info!(change = change.percent, sent = report.sent(), "done, alert sent");
        }
    }

    Ok(())
}
