//! HTTP source fetcher — retrieves and validates the thread feed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::FetchError;
use crate::source::model::{self, Post};

/// Seam for the orchestrator: anything that can produce the current post list.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Post>, FetchError>;
}

/// Fetches the thread feed over HTTP and parses it into posts.
pub struct HttpPostSource {
    client: reqwest::Client,
    thread_url: Url,
}

impl HttpPostSource {
    pub fn new(thread_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let thread_url = Url::parse(thread_url)
            .map_err(|e| FetchError::Shape(format!("thread url {thread_url:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network {
                url: thread_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, thread_url })
    }
}

#[async_trait]
impl PostSource for HttpPostSource {
    async fn fetch(&self) -> Result<Vec<Post>, FetchError> {
        let resp = self
            .client
            .get(self.thread_url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: self.thread_url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("json") {
            return Err(FetchError::ContentType(content_type));
        }

        let body = resp.text().await.map_err(|e| FetchError::Network {
            url: self.thread_url.to_string(),
            reason: e.to_string(),
        })?;

        let doc: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        model::parse_feed(&doc, &self.thread_url)
    }
}
