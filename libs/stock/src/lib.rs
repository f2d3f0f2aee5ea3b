mod error;
mod news_client;
mod price_client;
mod sms_client;

pub mod indicators;

pub use error::{Error, Result};
pub use news_client::{Article, NewsClient, Source, summaries};
pub use price_client::{ClosePair, DailyBar, DailySeries, PriceChange, PriceClient};
pub use sms_client::SmsClient;
