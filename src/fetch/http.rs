use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use url::Url;

use crate::app_config::FetchConfig;
use crate::errors::FetchError;
use crate::fetch::{FetchedText, Fetcher};

/// HTTP fetcher backed by a shared reqwest client
///
/// The client holds no per-resolution state, so one instance can serve any
/// number of concurrent resolutions.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher from the fetch section of the configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("Invalid header name '{}': {}", name, e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("Invalid value for header '{}': {}", name, e))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<FetchedText, FetchError> {
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
                partial: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        if &final_url != url {
            debug!("{} redirected to {}", url, final_url);
        }

        // Read chunk by chunk so a connection dropped mid-body still leaves
        // us with whatever arrived.
        let mut body = BytesMut::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    let partial = String::from_utf8_lossy(&body).into_owned();
                    debug!("Body of {} interrupted after {} bytes", url, body.len());
                    return Err(FetchError::Transport {
                        url: url.clone(),
                        message: e.to_string(),
                        partial: Some(partial),
                    });
                }
            }
        }

        let body = match String::from_utf8(body.to_vec()) {
            Ok(text) => text,
            Err(e) => {
                warn!("Body of {} is not valid UTF-8 ({}), decoding lossily", url, e);
                String::from_utf8_lossy(&body).into_owned()
            }
        };

        Ok(FetchedText { url: final_url, body })
    }
}
