use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use counsel_types::{
    CertifiedStatus, Domain, NewThread, NewThreadItem, Thread, ThreadFilters, ThreadItem,
    ThreadItemPatch, ThreadStats,
};

use crate::api::{ApiResult, ThreadApi};
use crate::certification::{badge_for, CertificationBadge};
use crate::optimistic::OptimisticIdMap;
use crate::prefs::{Debouncer, PrefsSink, StorePrefs};

const PREFS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Client-side session state: the thread list, the current thread's items,
/// the optimistic-id map, and UI preferences.
///
/// All server access goes through the injected `ThreadApi`; there is no
/// global state. Methods take `&mut self` following the single-threaded
/// client model.
pub struct ChatStore {
    api: Arc<dyn ThreadApi>,
    threads: Vec<Thread>,
    items: Vec<ThreadItem>,
    current_thread_id: Option<String>,
    route: String,
    id_map: OptimisticIdMap,
    prefs: StorePrefs,
    prefs_sink: Option<Arc<dyn PrefsSink>>,
    prefs_debouncer: Debouncer,
}

impl ChatStore {
    pub fn new(api: Arc<dyn ThreadApi>, prefs: StorePrefs) -> Self {
        Self {
            api,
            threads: Vec::new(),
            items: Vec::new(),
            current_thread_id: prefs.current_thread_id.clone(),
            route: "/chat".to_string(),
            id_map: OptimisticIdMap::new(),
            prefs,
            prefs_sink: None,
            prefs_debouncer: Debouncer::new(PREFS_DEBOUNCE),
        }
    }

    pub fn with_prefs_sink(mut self, sink: Arc<dyn PrefsSink>) -> Self {
        self.prefs_sink = Some(sink);
        self
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn current_thread_id(&self) -> Option<&str> {
        self.current_thread_id.as_deref()
    }

    pub fn prefs(&self) -> &StorePrefs {
        &self.prefs
    }

    /// UI code may hold either an optimistic or a real id; everything that
    /// talks to the server resolves through the map first.
    pub fn resolve_id(&self, id: &str) -> String {
        self.id_map.resolve(id)
    }

    fn fabricate_thread(&self, optimistic_id: &str, title: &str, domain: Domain) -> Thread {
        let now = Utc::now();
        Thread {
            id: optimistic_id.to_string(),
            title: title.to_string(),
            user_id: String::new(),
            pinned: false,
            pinned_at: None,
            domain,
            certified_status: CertifiedStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    fn schedule_prefs_save(&self) {
        if let Some(sink) = &self.prefs_sink {
            let sink = Arc::clone(sink);
            let prefs = self.prefs.clone();
            self.prefs_debouncer.call(move || sink.persist(prefs));
        }
    }

    pub fn set_prefs(&mut self, prefs: StorePrefs) {
        self.prefs = prefs;
        self.schedule_prefs_save();
    }

    pub async fn load_threads(&mut self, filters: ThreadFilters) -> ApiResult<()> {
        self.threads = self.api.list_threads(filters).await?;
        Ok(())
    }

    /// Optimistic thread creation: the fabricated record is visible
    /// immediately; on confirmation it is replaced in place and any route
    /// carrying the optimistic id is rewritten.
    pub async fn create_thread(
        &mut self,
        optimistic_id: &str,
        title: &str,
        domain: Domain,
    ) -> Thread {
        let fabricated = self.fabricate_thread(optimistic_id, title, domain);
        self.threads.insert(0, fabricated.clone());
        self.current_thread_id = Some(optimistic_id.to_string());
        self.route = format!("/chat/{optimistic_id}");

        let input = NewThread {
            title: title.to_string(),
            user_id: String::new(),
            domain: Some(domain),
            pinned: false,
        };
        match self.api.create_thread(input).await {
            Ok(created) => {
                self.id_map.insert(created.id.clone(), optimistic_id);
                if let Some(local) = self.threads.iter_mut().find(|t| t.id == optimistic_id) {
                    *local = created.clone();
                }
                self.current_thread_id = Some(created.id.clone());
                if self.route.contains(optimistic_id) {
                    self.route = self.route.replace(optimistic_id, &created.id);
                }
                created
            }
            Err(e) => {
                // The optimistic record is evicted, but callers still get a
                // fabricated thread back; local and server state diverge
                // here.
                tracing::error!(error = %e, "thread create failed");
                self.threads.retain(|t| t.id != optimistic_id);
                self.id_map.remove_by_optimistic(optimistic_id);
                fabricated
            }
        }
    }

    pub async fn create_thread_item(&mut self, mut input: NewThreadItem) -> ThreadItem {
        input.thread_id = self.resolve_id(&input.thread_id);
        match self.api.create_item(input.clone()).await {
            Ok(item) => {
                self.items.push(item.clone());
                item
            }
            Err(e) => {
                // Degraded mode: keep the UI responsive with a local-only
                // record; no reconciliation marker is kept.
                tracing::error!(error = %e, "thread item create failed, keeping local record");
                let now = Utc::now();
                let local = ThreadItem {
                    id: uuid::Uuid::new_v4().to_string(),
                    thread_id: input.thread_id,
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
                self.items.push(local.clone());
                local
            }
        }
    }

    pub async fn update_thread_item(
        &mut self,
        thread_id: &str,
        item_id: &str,
        patch: ThreadItemPatch,
    ) -> Option<ThreadItem> {
        let thread_id = self.resolve_id(thread_id);
        let item_id = self.resolve_id(item_id);

        match self.api.update_item(&thread_id, &item_id, patch.clone()).await {
            Ok(updated) => {
                if let Some(local) = self.items.iter_mut().find(|i| i.id == item_id) {
                    *local = updated.clone();
                }
                Some(updated)
            }
            Err(e) => {
                tracing::error!(error = %e, "thread item update failed, merging locally");
                let local = self.items.iter_mut().find(|i| i.id == item_id)?;
                patch.apply_to(local);
                Some(local.clone())
            }
        }
    }

    /// Deletes an item; when it was the last one, the thread itself is
    /// removed, the next thread (if any) becomes current, and the route
    /// falls back to `/chat`.
    pub async fn delete_thread_item(&mut self, thread_id: &str, item_id: &str) -> ApiResult<()> {
        let thread_id = self.resolve_id(thread_id);
        let item_id = self.resolve_id(item_id);

        self.items.retain(|i| i.id != item_id);
        self.api.delete_item(&thread_id, &item_id).await?;

        let thread_empty = !self.items.iter().any(|i| i.thread_id == thread_id);
        if thread_empty {
            self.threads.retain(|t| t.id != thread_id);
            self.id_map.remove_by_real(&thread_id);
            if let Err(e) = self.api.delete_thread(&thread_id).await {
                tracing::error!(error = %e, "empty thread cleanup failed");
            }
            self.current_thread_id = self.threads.first().map(|t| t.id.clone());
            self.route = "/chat".to_string();
        }
        Ok(())
    }

    pub async fn delete_thread(&mut self, thread_id: &str) -> ApiResult<()> {
        let thread_id = self.resolve_id(thread_id);
        self.api.delete_thread(&thread_id).await?;
        self.threads.retain(|t| t.id != thread_id);
        self.id_map.remove_by_real(&thread_id);
        if self.current_thread_id.as_deref() == Some(thread_id.as_str()) {
            self.current_thread_id = self.threads.first().map(|t| t.id.clone());
            self.route = "/chat".to_string();
        }
        Ok(())
    }

    pub async fn pin_thread(&mut self, thread_id: &str) -> ApiResult<Thread> {
        self.toggle_pin(thread_id).await
    }

    pub async fn unpin_thread(&mut self, thread_id: &str) -> ApiResult<Thread> {
        self.toggle_pin(thread_id).await
    }

    async fn toggle_pin(&mut self, thread_id: &str) -> ApiResult<Thread> {
        let thread_id = self.resolve_id(thread_id);
        let updated = self.api.toggle_pin(&thread_id).await?;
        if let Some(local) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            *local = updated.clone();
        }
        Ok(updated)
    }

    pub async fn remove_followup_items(&mut self, thread_id: &str, item_id: &str) -> ApiResult<u64> {
        let thread_id = self.resolve_id(thread_id);
        let item_id = self.resolve_id(item_id);
        let removed = self.api.delete_followups(&thread_id, &item_id).await?;

        if let Some(anchor) = self.items.iter().position(|i| i.id == item_id) {
            self.items.truncate(anchor + 1);
        }
        Ok(removed)
    }

    pub async fn load_thread_items(&mut self, thread_id: &str) -> ApiResult<&[ThreadItem]> {
        let thread_id = self.resolve_id(thread_id);
        self.items = self.api.list_items(&thread_id).await?;
        Ok(&self.items)
    }

    pub fn switch_thread(&mut self, thread_id: &str) {
        let resolved = self.resolve_id(thread_id);
        self.route = format!("/chat/{resolved}");
        self.current_thread_id = Some(resolved);
        self.items.clear();
    }

    /// Items before the given one in the current thread, oldest first.
    pub fn get_previous_items(&self, item_id: &str) -> Vec<&ThreadItem> {
        let item_id = self.resolve_id(item_id);
        match self.items.iter().position(|i| i.id == item_id) {
            Some(index) => self.items[..index].iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn get_current_item(&self) -> Option<&ThreadItem> {
        self.items.last()
    }

    pub async fn clear_all_threads(&mut self) -> ApiResult<u64> {
        let removed = self.api.clear_all().await?;
        self.threads.clear();
        self.items.clear();
        self.current_thread_id = None;
        self.route = "/chat".to_string();
        Ok(removed)
    }

    pub async fn stats(&self) -> ApiResult<ThreadStats> {
        self.api.stats().await
    }

    pub fn certification_status(&self, thread_id: &str) -> CertificationBadge {
        let thread_id = self.resolve_id(thread_id);
        badge_for(&self.threads, &thread_id, Utc::now().date_naive())
    }
}
