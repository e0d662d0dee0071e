use crate::domain::ports::{BoundarySource, ConfigProvider};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_TMA_URL: &str = "https://daim.lfv.se/geoserver/wfs";
const TYPE_NAMES: &str = "mais:TMAS,mais:TMAW";

/// WFS `GetFeature` client for the TMA layers, with fixed-delay retries.
#[derive(Debug, Clone)]
pub struct WfsFetcher {
    client: Client,
    endpoint: String,
    epsg: u32,
    attempts: u32,
    delay: Duration,
}

impl WfsFetcher {
    pub fn new(endpoint: impl Into<String>, epsg: u32) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            epsg,
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.tma_url(), config.fetch_epsg())
            .with_retry(config.retry_attempts(), Duration::from_secs(config.retry_delay_seconds()))
    }

    /// `attempts` counts the first request too; zero is treated as one.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.delay = delay;
        self
    }

    fn query(&self) -> [(&'static str, String); 6] {
        [
            ("service", "WFS".to_string()),
            ("version", "1.1.0".to_string()),
            ("request", "GetFeature".to_string()),
            ("typename", TYPE_NAMES.to_string()),
            ("outputFormat", "application/json".to_string()),
            ("srsName", format!("EPSG:{}", self.epsg)),
        ]
    }

    async fn fetch_once(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query())
            .send()
            .await?;

        tracing::debug!("WFS response status: {}", response.status());
        let response = response.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl BoundarySource for WfsFetcher {
    async fn fetch_boundaries(&self) -> Result<Vec<u8>> {
        tracing::info!("Fetching TMA boundaries from {}", self.endpoint);

        let mut attempt = 1;
        loop {
            match self.fetch_once().await {
                Ok(body) => {
                    tracing::info!("Fetched {} bytes of boundary data", body.len());
                    return Ok(body);
                }
                Err(e) if attempt < self.attempts => {
                    tracing::warn!(
                        "Fetch attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        self.attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Fetch failed after {} attempts: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters() {
        let fetcher = WfsFetcher::new(DEFAULT_TMA_URL, 3006);
        let query = fetcher.query();
        assert!(query.contains(&("typename", "mais:TMAS,mais:TMAW".to_string())));
        assert!(query.contains(&("srsName", "EPSG:3006".to_string())));
        assert!(query.contains(&("outputFormat", "application/json".to_string())));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let fetcher = WfsFetcher::new(DEFAULT_TMA_URL, 4326).with_retry(0, Duration::ZERO);
        assert_eq!(fetcher.attempts, 1);
    }
}
