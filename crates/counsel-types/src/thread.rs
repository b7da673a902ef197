use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChatMode, Domain};

/// Manual review state of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertifiedStatus {
    Pending,
    Certified,
    NotCertified,
}

impl Default for CertifiedStatus {
    fn default() -> Self {
        CertifiedStatus::Pending
    }
}

/// Lifecycle state of a single query/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Queued,
    Pending,
    Completed,
    Error,
    Aborted,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Queued
    }
}

/// A persisted conversation container owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<DateTime<Utc>>,
    pub domain: Domain,
    pub certified_status: CertifiedStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One query/response exchange within a thread. The free-form JSON fields
/// carry whatever the workflow produced for that step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadItem {
    pub id: String,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub query: String,
    pub mode: ChatMode,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_attachment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for thread creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    pub title: String,
    pub user_id: String,
    #[serde(default)]
    pub domain: Option<Domain>,
    #[serde(default)]
    pub pinned: bool,
}

/// Input for thread item creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThreadItem {
    pub thread_id: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub mode: ChatMode,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_attachment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
}

/// Partial-field update for a thread; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certified_status: Option<CertifiedStatus>,
}

/// Partial-field update for a thread item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_attachment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
}

impl ThreadItemPatch {
    /// Merge this patch over an existing item, the way the client store
    /// applies partial updates locally.
    pub fn apply_to(&self, item: &mut ThreadItem) {
        if let Some(query) = &self.query {
            item.query = query.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(error) = &self.error {
            item.error = Some(error.clone());
        }
        if let Some(image) = &self.image_attachment {
            item.image_attachment = Some(image.clone());
        }
        if let Some(v) = &self.tool_calls {
            item.tool_calls = Some(v.clone());
        }
        if let Some(v) = &self.tool_results {
            item.tool_results = Some(v.clone());
        }
        if let Some(v) = &self.steps {
            item.steps = Some(v.clone());
        }
        if let Some(v) = &self.answer {
            item.answer = Some(v.clone());
        }
        if let Some(v) = &self.metadata {
            item.metadata = Some(v.clone());
        }
        if let Some(v) = &self.sources {
            item.sources = v.clone();
        }
        if let Some(v) = &self.suggestions {
            item.suggestions = v.clone();
        }
        if let Some(v) = &self.object {
            item.object = Some(v.clone());
        }
        item.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
    PinnedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Listing filters for a user's threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default = "ThreadFilters::default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "ThreadFilters::default_order_by")]
    pub order_by: OrderBy,
    #[serde(default = "ThreadFilters::default_order_direction")]
    pub order_direction: OrderDirection,
}

impl ThreadFilters {
    fn default_limit() -> i64 {
        50
    }

    fn default_order_by() -> OrderBy {
        OrderBy::CreatedAt
    }

    fn default_order_direction() -> OrderDirection {
        OrderDirection::Desc
    }
}

impl Default for ThreadFilters {
    fn default() -> Self {
        Self {
            pinned: None,
            domain: None,
            limit: Self::default_limit(),
            offset: 0,
            order_by: Self::default_order_by(),
            order_direction: Self::default_order_direction(),
        }
    }
}

/// Per-user aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadStats {
    pub total_threads: u64,
    pub pinned_threads: u64,
    pub total_thread_items: u64,
    pub threads_today: u64,
}

/// User record mirrored from the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "UserRecord::default_role")]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    fn default_role() -> String {
        "USER".to_string()
    }
}
