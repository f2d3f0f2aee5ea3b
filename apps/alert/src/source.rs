//! Seams between the run and the outside world. The stock clients implement
//! them for real runs; tests swap in in-memory fakes.

use std::future::Future;

use chrono::NaiveDate;
use stock::{NewsClient, PriceChange, PriceClient, SmsClient};

pub trait PriceSource {
    fn price_change(
        &self,
        symbol: &str,
        on_or_before: NaiveDate,
    ) -> impl Future<Output = stock::Result<PriceChange>>;
}

pub trait NewsSource {
    fn summaries(
        &self,
        query: &str,
        day: NaiveDate,
        limit: usize,
    ) -> impl Future<Output = stock::Result<Vec<String>>>;
}

pub trait MessageSender {
    /// Returns the provider's id for the sent message.
    fn send(&self, to: &str, body: &str) -> impl Future<Output = stock::Result<String>>;
}

impl PriceSource for PriceClient {
    async fn price_change(
        &self,
        symbol: &str,
        on_or_before: NaiveDate,
    ) -> stock::Result<PriceChange> {
        self.fetch_change(symbol, on_or_before).await
    }
}

impl NewsSource for NewsClient {
    async fn summaries(
        &self,
        query: &str,
        day: NaiveDate,
        limit: usize,
    ) -> stock::Result<Vec<String>> {
        self.fetch_summaries(query, day, limit).await
    }
}

impl MessageSender for SmsClient {
    async fn send(&self, to: &str, body: &str) -> stock::Result<String> {
        SmsClient::send(self, to, body).await
    }
}
