use async_trait::async_trait;

use counsel_types::{
    NewThread, NewThreadItem, Thread, ThreadFilters, ThreadItem, ThreadItemPatch, ThreadPatch,
    ThreadStats, UserRecord,
};

use crate::error::Result;

/// Thread CRUD contract. Every operation is scoped to the owning user;
/// an id belonging to another user behaves as not-found.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn create(&self, input: NewThread) -> Result<Thread>;

    async fn get(&self, id: &str, user_id: &str) -> Result<Option<Thread>>;

    async fn list(&self, user_id: &str, filters: ThreadFilters) -> Result<Vec<Thread>>;

    async fn update(&self, id: &str, user_id: &str, patch: ThreadPatch) -> Result<Thread>;

    /// Deletes the thread and all of its items.
    async fn delete(&self, id: &str, user_id: &str) -> Result<()>;

    /// Flips the pinned flag; sets or clears `pinned_at` accordingly.
    async fn toggle_pin(&self, id: &str, user_id: &str) -> Result<Thread>;

    /// Case-insensitive substring search over thread titles and item
    /// queries.
    async fn search(&self, user_id: &str, query: &str, limit: i64) -> Result<Vec<Thread>>;

    async fn stats(&self, user_id: &str) -> Result<ThreadStats>;

    /// Deletes every thread (and item) owned by the user. Returns the
    /// number of threads removed.
    async fn clear_all(&self, user_id: &str) -> Result<u64>;
}

/// Thread item CRUD contract. Items are ordered within a thread by
/// `created_at` ascending.
#[async_trait]
pub trait ThreadItemStore: Send + Sync {
    async fn create(&self, input: NewThreadItem) -> Result<ThreadItem>;

    async fn list(&self, thread_id: &str) -> Result<Vec<ThreadItem>>;

    async fn get(&self, id: &str) -> Result<Option<ThreadItem>>;

    async fn update(&self, id: &str, patch: ThreadItemPatch) -> Result<ThreadItem>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Deletes items in the same thread created strictly after the given
    /// item. Returns the number removed.
    async fn delete_followups(&self, id: &str) -> Result<u64>;
}

/// Mirror of identity-provider users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert(&self, user: UserRecord) -> Result<UserRecord>;

    async fn get(&self, id: &str) -> Result<Option<UserRecord>>;

    async fn delete(&self, id: &str) -> Result<()>;
}
