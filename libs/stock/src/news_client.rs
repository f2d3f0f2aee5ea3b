use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, error_for_status};

const PROVIDER: &str = "news api";

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_api: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(base_api: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_api,
            api_key,
        })
    }

    /// Articles mentioning `query` published on `day`, most popular first.
    #[instrument(name = "fetch_articles", skip(self))]
    pub async fn fetch_articles(&self, query: &str, day: NaiveDate) -> Result<Vec<Article>> {
        let url = format!("{}/v2/everything", self.base_api.trim_end_matches('/'));
        let day = day.format("%Y-%m-%d").to_string();

        let res = self
            .client
            .get(url)
            .query(&[
                ("q", query),
                ("from", day.as_str()),
                ("to", day.as_str()),
                ("sortBy", "popularity"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let body = error_for_status(PROVIDER, res).await?.text().await?;

        let res: EverythingResponse = serde_json::from_str(&body)?;
        debug!(
            articles = res.articles.len(),
            total = res.total_results,
            "fetched articles"
        );

        Ok(res.articles)
    }

    pub async fn fetch_summaries(
        &self,
        query: &str,
        day: NaiveDate,
        limit: usize,
    ) -> Result<Vec<String>> {
        let articles = self.fetch_articles(query, day).await?;
        Ok(summaries(&articles, limit))
    }
}

/// Formats the first `limit` articles, in the order the provider ranked them.
pub fn summaries(articles: &[Article], limit: usize) -> Vec<String> {
    articles.iter().take(limit).map(Article::summary).collect()
}

//
// Match News API JSON
// https://newsapi.org/docs/endpoints/everything
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    #[serde(default)]
    total_results: Option<u64>,

    articles: Vec<Article>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Option<Source>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Source {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Article {
    /// `title: {title}  description: {description}`; a null field renders empty.
    pub fn summary(&self) -> String {
        format!(
            "title: {}  description: {}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
    }
}
