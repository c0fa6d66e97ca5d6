use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    config::HttpClientConfig,
    error::{FeedError, FeedResult},
};

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &HttpClientConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    /// Download the source feed body. Non-success statuses are errors.
    pub async fn fetch(&self, url: &str) -> FeedResult<Vec<u8>> {
        debug!(url = %url, "fetching feed");
        let response = self.client.get(url).send().await.map_err(|err| {
            warn!(error = ?err, url = %url, "feed request failed");
            FeedError::from(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "feed fetch returned error status");
            return Err(FeedError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        info!(
            url = %url,
            status = status.as_u16(),
            size = bytes.len(),
            "feed fetch successful"
        );
        Ok(bytes.to_vec())
    }
}
