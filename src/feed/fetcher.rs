use super::types::RawRecord;
use super::{FeedSource, FetchError};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub struct HttpFeedFetcher {
    client: Client,
    url: String,
}

impl HttpFeedFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            url: config.upstream_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeedFetcher {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;

        let elements: Vec<Value> = serde_json::from_slice(&body)?;
        let total = elements.len();
        let records: Vec<RawRecord> = elements
            .into_iter()
            .filter_map(|element| match element {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();

        if records.len() < total {
            tracing::warn!(
                dropped = total - records.len(),
                total,
                "Upstream feed contained non-object elements"
            );
        }

        Ok(records)
    }
}
