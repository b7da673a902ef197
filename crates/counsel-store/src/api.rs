use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use counsel_types::{
    NewThread, NewThreadItem, Thread, ThreadFilters, ThreadItem, ThreadItemPatch, ThreadPatch,
    ThreadStats,
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Client-side adapter over the thread REST surface.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    async fn create_thread(&self, input: NewThread) -> ApiResult<Thread>;
    async fn get_thread(&self, id: &str) -> ApiResult<Option<Thread>>;
    async fn list_threads(&self, filters: ThreadFilters) -> ApiResult<Vec<Thread>>;
    async fn update_thread(&self, id: &str, patch: ThreadPatch) -> ApiResult<Thread>;
    async fn delete_thread(&self, id: &str) -> ApiResult<()>;
    async fn toggle_pin(&self, id: &str) -> ApiResult<Thread>;
    async fn search_threads(&self, query: &str, limit: i64) -> ApiResult<Vec<Thread>>;
    async fn stats(&self) -> ApiResult<ThreadStats>;
    async fn clear_all(&self) -> ApiResult<u64>;

    async fn create_item(&self, input: NewThreadItem) -> ApiResult<ThreadItem>;
    async fn list_items(&self, thread_id: &str) -> ApiResult<Vec<ThreadItem>>;
    async fn update_item(
        &self,
        thread_id: &str,
        item_id: &str,
        patch: ThreadItemPatch,
    ) -> ApiResult<ThreadItem>;
    async fn delete_item(&self, thread_id: &str, item_id: &str) -> ApiResult<()>;
    async fn delete_followups(&self, thread_id: &str, item_id: &str) -> ApiResult<u64>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct DeletedBody {
    deleted: u64,
}

/// reqwest-backed `ThreadApi` implementation.
pub struct HttpThreadApi {
    http: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl HttpThreadApi {
    pub fn new(base_url: impl Into<String>, bearer: impl Into<String>) -> ApiResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.into(),
            bearer: bearer.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Surface the server's `{error}` body on non-2xx, falling back to the
    /// bare status.
    async fn check(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ThreadApi for HttpThreadApi {
    async fn create_thread(&self, input: NewThread) -> ApiResult<Thread> {
        let response = self
            .http
            .post(self.url("/api/threads"))
            .bearer_auth(&self.bearer)
            .json(&input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_thread(&self, id: &str) -> ApiResult<Option<Thread>> {
        let response = self
            .http
            .get(self.url(&format!("/api/threads/{id}")))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::check(response).await?.json().await?))
    }

    async fn list_threads(&self, filters: ThreadFilters) -> ApiResult<Vec<Thread>> {
        let response = self
            .http
            .get(self.url("/api/threads"))
            .query(&filters)
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_thread(&self, id: &str, patch: ThreadPatch) -> ApiResult<Thread> {
        let response = self
            .http
            .patch(self.url(&format!("/api/threads/{id}")))
            .bearer_auth(&self.bearer)
            .json(&patch)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_thread(&self, id: &str) -> ApiResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("/api/threads/{id}")))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn toggle_pin(&self, id: &str) -> ApiResult<Thread> {
        let response = self
            .http
            .post(self.url(&format!("/api/threads/{id}/pin")))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn search_threads(&self, query: &str, limit: i64) -> ApiResult<Vec<Thread>> {
        let response = self
            .http
            .get(self.url("/api/threads/search"))
            .query(&[("q", query), ("limit", &limit.to_string())])
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn stats(&self) -> ApiResult<ThreadStats> {
        let response = self
            .http
            .get(self.url("/api/threads/stats"))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn clear_all(&self) -> ApiResult<u64> {
        let response = self
            .http
            .delete(self.url("/api/threads/clear"))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        let body: DeletedBody = Self::check(response).await?.json().await?;
        Ok(body.deleted)
    }

    async fn create_item(&self, input: NewThreadItem) -> ApiResult<ThreadItem> {
        let response = self
            .http
            .post(self.url(&format!("/api/threads/{}/items", input.thread_id)))
            .bearer_auth(&self.bearer)
            .json(&input)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_items(&self, thread_id: &str) -> ApiResult<Vec<ThreadItem>> {
        let response = self
            .http
            .get(self.url(&format!("/api/threads/{thread_id}/items")))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_item(
        &self,
        thread_id: &str,
        item_id: &str,
        patch: ThreadItemPatch,
    ) -> ApiResult<ThreadItem> {
        let response = self
            .http
            .patch(self.url(&format!("/api/threads/{thread_id}/items/{item_id}")))
            .bearer_auth(&self.bearer)
            .json(&patch)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_item(&self, thread_id: &str, item_id: &str) -> ApiResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("/api/threads/{thread_id}/items/{item_id}")))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_followups(&self, thread_id: &str, item_id: &str) -> ApiResult<u64> {
        let response = self
            .http
            .delete(self.url(&format!(
                "/api/threads/{thread_id}/items/{item_id}/followups"
            )))
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        let body: DeletedBody = Self::check(response).await?.json().await?;
        Ok(body.deleted)
    }
}
