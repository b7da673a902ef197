use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use counsel_types::{
    CertifiedStatus, NewThread, NewThreadItem, OrderBy, OrderDirection, Thread, ThreadFilters,
    ThreadItem, ThreadItemPatch, ThreadPatch, ThreadStats, UserRecord,
};

use crate::error::{PersistError, Result};
use crate::traits::{ThreadItemStore, ThreadStore, UserStore};

#[derive(Default)]
struct Inner {
    threads: HashMap<String, Thread>,
    items: HashMap<String, ThreadItem>,
    users: HashMap<String, UserRecord>,
    /// Insertion order per item, used for deterministic within-thread
    /// ordering even when timestamps collide.
    item_seq: HashMap<String, u64>,
}

/// In-process store with the same observable semantics as the MongoDB
/// stores. Backs tests and the local development profile.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens after a panic in another test thread;
        // propagating it as a second panic is acceptable here.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn sorted_items(inner: &Inner, thread_id: &str) -> Vec<ThreadItem> {
        let mut items: Vec<(u64, ThreadItem)> = inner
            .items
            .values()
            .filter(|item| item.thread_id == thread_id)
            .map(|item| {
                let seq = inner.item_seq.get(&item.id).copied().unwrap_or(0);
                (seq, item.clone())
            })
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, item)| item).collect()
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn create(&self, input: NewThread) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            user_id: input.user_id,
            pinned: input.pinned,
            pinned_at: input.pinned.then_some(now),
            domain: input.domain.unwrap_or_default(),
            certified_status: CertifiedStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.lock()
            .threads
            .insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn get(&self, id: &str, user_id: &str) -> Result<Option<Thread>> {
        let inner = self.lock();
        Ok(inner
            .threads
            .get(id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str, filters: ThreadFilters) -> Result<Vec<Thread>> {
        let inner = self.lock();
        let mut threads: Vec<Thread> = inner
            .threads
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filters.pinned.map_or(true, |p| t.pinned == p))
            .filter(|t| filters.domain.map_or(true, |d| t.domain == d))
            .cloned()
            .collect();

        threads.sort_by(|a, b| {
            let ordering = match filters.order_by {
                OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                OrderBy::PinnedAt => a.pinned_at.cmp(&b.pinned_at),
            };
            match filters.order_direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });

        let offset = filters.offset.max(0) as usize;
        let limit = filters.limit.max(0) as usize;
        Ok(threads.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, id: &str, user_id: &str, patch: ThreadPatch) -> Result<Thread> {
        let mut inner = self.lock();
        let thread = inner
            .threads
            .get_mut(id)
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;

        if let Some(title) = patch.title {
            thread.title = title;
        }
        if let Some(pinned) = patch.pinned {
            thread.pinned = pinned;
            thread.pinned_at = if pinned {
                Some(patch.pinned_at.unwrap_or_else(Utc::now))
            } else {
                None
            };
        }
        if let Some(status) = patch.certified_status {
            thread.certified_status = status;
        }
        thread.updated_at = Utc::now();
        Ok(thread.clone())
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        let mut inner = self.lock();
        let owned = inner
            .threads
            .get(id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Err(PersistError::ThreadNotFound(id.to_string()));
        }
        inner.threads.remove(id);

        let item_ids: Vec<String> = inner
            .items
            .values()
            .filter(|item| item.thread_id == id)
            .map(|item| item.id.clone())
            .collect();
        for item_id in item_ids {
            inner.items.remove(&item_id);
            inner.item_seq.remove(&item_id);
        }
        Ok(())
    }

    async fn toggle_pin(&self, id: &str, user_id: &str) -> Result<Thread> {
        let mut inner = self.lock();
        let thread = inner
            .threads
            .get_mut(id)
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;

        thread.pinned = !thread.pinned;
        thread.pinned_at = thread.pinned.then(Utc::now);
        thread.updated_at = Utc::now();
        Ok(thread.clone())
    }

    async fn search(&self, user_id: &str, query: &str, limit: i64) -> Result<Vec<Thread>> {
        let needle = query.to_lowercase();
        let inner = self.lock();

        let mut matched: Vec<Thread> = inner
            .threads
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || inner.items.values().any(|item| {
                        item.thread_id == t.id && item.query.to_lowercase().contains(&needle)
                    })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }

    async fn stats(&self, user_id: &str) -> Result<ThreadStats> {
        let inner = self.lock();
        let user_threads: Vec<&Thread> = inner
            .threads
            .values()
            .filter(|t| t.user_id == user_id)
            .collect();

        let today = Utc::now().date_naive();
        let total_thread_items = inner
            .items
            .values()
            .filter(|item| user_threads.iter().any(|t| t.id == item.thread_id))
            .count() as u64;

        Ok(ThreadStats {
            total_threads: user_threads.len() as u64,
            pinned_threads: user_threads.iter().filter(|t| t.pinned).count() as u64,
            total_thread_items,
            threads_today: user_threads
                .iter()
                .filter(|t| t.created_at.date_naive() == today)
                .count() as u64,
        })
    }

    async fn clear_all(&self, user_id: &str) -> Result<u64> {
        let mut inner = self.lock();
        let thread_ids: Vec<String> = inner
            .threads
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id.clone())
            .collect();

        for thread_id in &thread_ids {
            inner.threads.remove(thread_id);
            let item_ids: Vec<String> = inner
                .items
                .values()
                .filter(|item| &item.thread_id == thread_id)
                .map(|item| item.id.clone())
                .collect();
            for item_id in item_ids {
                inner.items.remove(&item_id);
                inner.item_seq.remove(&item_id);
            }
        }
        Ok(thread_ids.len() as u64)
    }
}

#[async_trait]
impl ThreadItemStore for MemoryStore {
    async fn create(&self, input: NewThreadItem) -> Result<ThreadItem> {
        let seq = self.next_seq();
        let now = Utc::now();
        let item = ThreadItem {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: input.thread_id.clone(),
            parent_id: input.parent_id,
            query: input.query,
            mode: input.mode,
            status: input.status.unwrap_or_default(),
            error: input.error,
            image_attachment: input.image_attachment,
            tool_calls: input.tool_calls,
            tool_results: input.tool_results,
            steps: input.steps,
            answer: input.answer,
            metadata: input.metadata,
            sources: input.sources,
            suggestions: input.suggestions,
            object: input.object,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.lock();
        if !inner.threads.contains_key(&input.thread_id) {
            return Err(PersistError::ThreadNotFound(input.thread_id));
        }
        if let Some(thread) = inner.threads.get_mut(&input.thread_id) {
            thread.updated_at = now;
        }
        inner.item_seq.insert(item.id.clone(), seq);
        inner.items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<ThreadItem>> {
        let inner = self.lock();
        Ok(Self::sorted_items(&inner, thread_id))
    }

    async fn get(&self, id: &str) -> Result<Option<ThreadItem>> {
        Ok(self.lock().items.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: ThreadItemPatch) -> Result<ThreadItem> {
        let mut inner = self.lock();
        let item = inner
            .items
            .get_mut(id)
            .ok_or_else(|| PersistError::ThreadItemNotFound(id.to_string()))?;
        patch.apply_to(item);
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner
            .items
            .remove(id)
            .ok_or_else(|| PersistError::ThreadItemNotFound(id.to_string()))?;
        inner.item_seq.remove(id);
        Ok(())
    }

    async fn delete_followups(&self, id: &str) -> Result<u64> {
        let mut inner = self.lock();
        let anchor = inner
            .items
            .get(id)
            .ok_or_else(|| PersistError::ThreadItemNotFound(id.to_string()))?;
        let anchor_seq = inner.item_seq.get(id).copied().unwrap_or(0);
        let thread_id = anchor.thread_id.clone();

        let followup_ids: Vec<String> = inner
            .items
            .values()
            .filter(|item| {
                item.thread_id == thread_id
                    && inner.item_seq.get(&item.id).copied().unwrap_or(0) > anchor_seq
            })
            .map(|item| item.id.clone())
            .collect();

        for item_id in &followup_ids {
            inner.items.remove(item_id);
            inner.item_seq.remove(item_id);
        }
        Ok(followup_ids.len() as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert(&self, user: UserRecord) -> Result<UserRecord> {
        self.lock().users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.lock().users.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.lock().users.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_types::{ChatMode, Domain};

    fn new_thread(user_id: &str, title: &str) -> NewThread {
        NewThread {
            title: title.to_string(),
            user_id: user_id.to_string(),
            domain: Some(Domain::Legal),
            pinned: false,
        }
    }

    fn new_item(thread_id: &str, query: &str) -> NewThreadItem {
        NewThreadItem {
            thread_id: thread_id.to_string(),
            query: query.to_string(),
            parent_id: None,
            mode: ChatMode::Gpt41,
            status: None,
            error: None,
            image_attachment: None,
            tool_calls: None,
            tool_results: None,
            steps: None,
            answer: None,
            metadata: None,
            sources: vec![],
            suggestions: vec![],
            object: None,
        }
    }

    #[tokio::test]
    async fn threads_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let thread = ThreadStore::create(&store, new_thread("alice", "Case notes"))
            .await
            .unwrap();

        assert!(ThreadStore::get(&store, &thread.id, "alice")
            .await
            .unwrap()
            .is_some());
        assert!(ThreadStore::get(&store, &thread.id, "bob")
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            ThreadStore::delete(&store, &thread.id, "bob").await,
            Err(PersistError::ThreadNotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_thread_cascades_to_items() {
        let store = MemoryStore::new();
        let thread = ThreadStore::create(&store, new_thread("alice", "t"))
            .await
            .unwrap();
        let item = ThreadItemStore::create(&store, new_item(&thread.id, "q"))
            .await
            .unwrap();

        ThreadStore::delete(&store, &thread.id, "alice")
            .await
            .unwrap();
        assert!(ThreadItemStore::get(&store, &item.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_applies_filters_and_pagination() {
        let store = MemoryStore::new();
        for i in 0..5 {
            ThreadStore::create(&store, new_thread("alice", &format!("thread {i}")))
                .await
                .unwrap();
        }
        let pinned = ThreadStore::create(
            &store,
            NewThread {
                pinned: true,
                ..new_thread("alice", "pinned one")
            },
        )
        .await
        .unwrap();

        let only_pinned = ThreadStore::list(
            &store,
            "alice",
            ThreadFilters {
                pinned: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(only_pinned.len(), 1);
        assert_eq!(only_pinned[0].id, pinned.id);

        let page = ThreadStore::list(
            &store,
            "alice",
            ThreadFilters {
                limit: 2,
                offset: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn search_matches_titles_and_item_queries() {
        let store = MemoryStore::new();
        let by_title = ThreadStore::create(&store, new_thread("alice", "Zoning appeal"))
            .await
            .unwrap();
        let by_query = ThreadStore::create(&store, new_thread("alice", "misc"))
            .await
            .unwrap();
        ThreadItemStore::create(&store, new_item(&by_query.id, "What is ZONING law?"))
            .await
            .unwrap();
        ThreadStore::create(&store, new_thread("bob", "zoning too"))
            .await
            .unwrap();

        let found = store.search("alice", "zoning", 10).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(found.len(), 2);
        assert!(ids.contains(&by_title.id.as_str()));
        assert!(ids.contains(&by_query.id.as_str()));
    }

    #[tokio::test]
    async fn toggle_pin_round_trips() {
        let store = MemoryStore::new();
        let thread = ThreadStore::create(&store, new_thread("alice", "t"))
            .await
            .unwrap();

        let pinned = store.toggle_pin(&thread.id, "alice").await.unwrap();
        assert!(pinned.pinned);
        assert!(pinned.pinned_at.is_some());

        let unpinned = store.toggle_pin(&thread.id, "alice").await.unwrap();
        assert!(!unpinned.pinned);
        assert!(unpinned.pinned_at.is_none());
    }

    #[tokio::test]
    async fn delete_followups_removes_later_items_only() {
        let store = MemoryStore::new();
        let thread = ThreadStore::create(&store, new_thread("alice", "t"))
            .await
            .unwrap();
        let first = ThreadItemStore::create(&store, new_item(&thread.id, "first"))
            .await
            .unwrap();
        let second = ThreadItemStore::create(&store, new_item(&thread.id, "second"))
            .await
            .unwrap();
        let third = ThreadItemStore::create(&store, new_item(&thread.id, "third"))
            .await
            .unwrap();

        let removed = store.delete_followups(&second.id).await.unwrap();
        assert_eq!(removed, 1);

        let remaining = ThreadItemStore::list(&store, &thread.id).await.unwrap();
        let ids: Vec<&str> = remaining.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
        assert!(ThreadItemStore::get(&store, &third.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn stats_count_per_user() {
        let store = MemoryStore::new();
        let thread = ThreadStore::create(&store, new_thread("alice", "t"))
            .await
            .unwrap();
        ThreadItemStore::create(&store, new_item(&thread.id, "q1"))
            .await
            .unwrap();
        ThreadItemStore::create(&store, new_item(&thread.id, "q2"))
            .await
            .unwrap();
        ThreadStore::create(&store, new_thread("bob", "other"))
            .await
            .unwrap();

        let stats = store.stats("alice").await.unwrap();
        assert_eq!(stats.total_threads, 1);
        assert_eq!(stats.total_thread_items, 2);
        assert_eq!(stats.threads_today, 1);
    }

    #[tokio::test]
    async fn clear_all_returns_removed_count() {
        let store = MemoryStore::new();
        for i in 0..3 {
            ThreadStore::create(&store, new_thread("alice", &format!("t{i}")))
                .await
                .unwrap();
        }
        assert_eq!(store.clear_all("alice").await.unwrap(), 3);
        assert!(ThreadStore::list(&store, "alice", ThreadFilters::default())
            .await
            .unwrap()
            .is_empty());
    }
}
