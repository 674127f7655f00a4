use crate::{
    error::{BoardError, Result},
    store::{path_segments, RemoteStore},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for a realtime-database style store
///
/// A store path `tasks/abc` maps to `{base_url}/tasks/abc.json`; reads of
/// missing documents come back as JSON `null`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BoardError::ConfigError(format!(
                "store URL must be http(s): {base_url}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kanban-drag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a store path
    pub fn url_for(&self, path: &str) -> Result<String> {
        let segments = path_segments(path)?;
        Ok(format!("{}/{}.json", self.base_url, segments.join("/")))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let response = self.client.get(self.url_for(path)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: Value = response.error_for_status()?.json().await?;
        Ok((!value.is_null()).then_some(value))
    }

    #[instrument(skip(self, value))]
    async fn put(&self, path: &str, value: &Value) -> Result<()> {
        self.client
            .put(self.url_for(path)?)
            .json(value)
            .send()
            .await?
            .error_for_status()?;
        debug!("document replaced");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn patch(&self, path: &str, partial: &Value) -> Result<Value> {
        let merged = self
            .client
            .patch(self.url_for(path)?)
            .json(partial)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!("document patched");
        Ok(merged)
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete(self.url_for(path)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
