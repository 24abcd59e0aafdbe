use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::models::Contemplation;
use crate::rotation::Today;

#[derive(Debug, Deserialize)]
struct VoteResponse {
    votes: i64,
}

/// Read side of the public API, used by the watcher and the vote command.
#[derive(Clone)]
pub struct ContentClient {
    client: Client,
    base_url: Url,
}

impl ContentClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // No request timeout: a slow fetch is simply overtaken by the next tick.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("lyceum/1.0")
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub async fn contemplations(&self) -> Result<Vec<Contemplation>> {
        self.get_json("api/contemplations").await
    }

    pub async fn today(&self) -> Result<Today> {
        self.get_json("api/today").await
    }

    /// Server-side vote counts keyed by contemplation id.
    pub async fn vote_counts(&self) -> Result<HashMap<i64, i64>> {
        Ok(self
            .contemplations()
            .await?
            .into_iter()
            .map(|c| (c.id, c.votes))
            .collect())
    }

    pub async fn vote(&self, contemplation_id: i64) -> Result<i64> {
        let url = self
            .base_url
            .join(&format!("api/contemplations/{contemplation_id}/vote"))?;
        let response = self.client.post(url).send().await?.error_for_status()?;
        let body: VoteResponse = response.json().await?;
        Ok(body.votes)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch {}: HTTP {}", path, response.status()).into());
        }

        Ok(response.json().await?)
    }
}
