//! Client side of the server's request queue.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::config::{CSRF_HEADER, MARK_PROCESSED_PATH, NEXT_REQUEST_PATH};
use crate::error::{Error, Result};
use crate::request::{FillRequest, RequestId};

/// Source of fill requests and sink of acknowledgments.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Next pending request, or `None` when there is no work.
    async fn next_request(&self) -> Result<Option<FillRequest>>;

    /// Tell the server `id` has been processed so it is not handed out again.
    async fn mark_processed(&self, id: &RequestId, csrf_token: &str) -> Result<()>;
}

#[derive(Serialize)]
struct MarkProcessedBody<'a> {
    request_id: &'a RequestId,
}

/// [`WorkQueue`] over the server's JSON API.
pub struct HttpWorkQueue {
    client: Client,
    next_request_url: Url,
    mark_processed_url: Url,
}

impl HttpWorkQueue {
    /// Queue rooted at `base_url`, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| Error::UrlError(e.to_string()))?;
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, base: Url) -> Result<Self> {
        let join = |path: &str| base.join(path).map_err(|e| Error::UrlError(e.to_string()));
        Ok(Self {
            next_request_url: join(NEXT_REQUEST_PATH)?,
            mark_processed_url: join(MARK_PROCESSED_PATH)?,
            client,
        })
    }
}

#[async_trait]
impl WorkQueue for HttpWorkQueue {
    async fn next_request(&self) -> Result<Option<FillRequest>> {
        let response = self.client.get(self.next_request_url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            debug!(%status, "no pending requests");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url: self.next_request_url.to_string(),
            });
        }

        let body = response.text().await?;
        FillRequest::from_json(&body)
    }

    async fn mark_processed(&self, id: &RequestId, csrf_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.mark_processed_url.clone())
            .header(CSRF_HEADER, csrf_token)
            .json(&MarkProcessedBody { request_id: id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                url: self.mark_processed_url.to_string(),
            });
        }
        Ok(())
    }
}
