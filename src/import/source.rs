use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A remote endpoint producing a JSON array of contact-like records.
#[async_trait]
pub trait ContactSource {
    async fn fetch(&self) -> Result<Vec<Value>, FetchError>;
}

/// HTTP GET source. Non-2xx responses and non-array bodies are failures;
/// odd field shapes inside individual records are not (see `map_record`).
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl ContactSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
