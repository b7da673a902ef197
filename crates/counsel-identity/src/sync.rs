use std::time::Duration;

use serde::Deserialize;

use crate::provider::IdentityError;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[serde(alias = "userId")]
    user_id: String,
}

/// Pushes the authenticated user into the backend user mirror. Makes up
/// to three attempts, backing off 1s then 2s between them.
pub struct AuthSyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthSyncClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IdentityError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .build()
                .map_err(|e| IdentityError::Unavailable(e.to_string()))?,
            base_url: base_url.into(),
        })
    }

    /// Returns the synced user id.
    pub async fn sync_user(&self, bearer: &str) -> Result<String, IdentityError> {
        let url = format!("{}/api/auth/sync-user", self.base_url);
        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = Duration::from_secs(1 << (attempt - 1));
                tracing::warn!(attempt, ?backoff, error = %last_error, "retrying user sync");
                tokio::time::sleep(backoff).await;
            }

            let result = self.http.post(&url).bearer_auth(bearer).send().await;
            match result {
                Ok(response) if response.status().is_success() => {
                    let body: SyncResponse = response
                        .json()
                        .await
                        .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
                    return Ok(body.user_id);
                }
                Ok(response) if response.status() == reqwest::StatusCode::UNAUTHORIZED => {
                    return Err(IdentityError::InvalidToken);
                }
                Ok(response) => {
                    last_error = format!("sync endpoint returned {}", response.status());
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
        }

        Err(IdentityError::Unavailable(last_error))
    }
}
