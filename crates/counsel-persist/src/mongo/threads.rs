use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};

use counsel_types::{
    CertifiedStatus, NewThread, OrderBy, OrderDirection, Thread, ThreadFilters, ThreadPatch,
    ThreadStats,
};

use crate::error::{PersistError, Result};
use crate::mongo::models::{domain_to_storage, to_bson_datetime, MongoThread, MongoThreadItem};
use crate::traits::ThreadStore;

/// Escape regex metacharacters so user search input matches literally.
pub(crate) fn escape_regex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '\\' | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[derive(Clone)]
pub struct MongoThreadStore {
    threads: Collection<MongoThread>,
    items: Collection<MongoThreadItem>,
}

impl MongoThreadStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            threads: db.collection("threads"),
            items: db.collection("thread_items"),
        }
    }

    fn sort_doc(filters: &ThreadFilters) -> Document {
        let field = match filters.order_by {
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
            OrderBy::PinnedAt => "pinned_at",
        };
        let direction = match filters.order_direction {
            OrderDirection::Asc => 1,
            OrderDirection::Desc => -1,
        };
        doc! { field: direction }
    }

    async fn user_thread_ids(&self, user_id: &str) -> Result<Vec<ObjectId>> {
        let ids = self
            .threads
            .distinct("_id", doc! { "user_id": user_id })
            .await?;
        Ok(ids
            .into_iter()
            .filter_map(|b| match b {
                Bson::ObjectId(oid) => Some(oid),
                _ => None,
            })
            .collect())
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    async fn create(&self, input: NewThread) -> Result<Thread> {
        let now = to_bson_datetime(Utc::now());
        let thread = MongoThread {
            id: ObjectId::new(),
            title: input.title,
            user_id: input.user_id,
            pinned: input.pinned,
            pinned_at: input.pinned.then_some(now),
            domain: domain_to_storage(input.domain.unwrap_or_default()).to_string(),
            certified_status: CertifiedStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.threads.insert_one(&thread).await?;
        Ok(thread.into_thread())
    }

    async fn get(&self, id: &str, user_id: &str) -> Result<Option<Thread>> {
        let oid = parse_object_id(id)?;
        let found = self
            .threads
            .find_one(doc! { "_id": oid, "user_id": user_id })
            .await?;
        Ok(found.map(MongoThread::into_thread))
    }

    async fn list(&self, user_id: &str, filters: ThreadFilters) -> Result<Vec<Thread>> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(pinned) = filters.pinned {
            filter.insert("pinned", pinned);
        }
        if let Some(domain) = filters.domain {
            filter.insert("domain", domain_to_storage(domain));
        }

        let threads: Vec<MongoThread> = self
            .threads
            .find(filter)
            .sort(Self::sort_doc(&filters))
            .skip(filters.offset.max(0) as u64)
            .limit(filters.limit)
            .await?
            .try_collect()
            .await?;
        Ok(threads.into_iter().map(MongoThread::into_thread).collect())
    }

    async fn update(&self, id: &str, user_id: &str, patch: ThreadPatch) -> Result<Thread> {
        let oid = parse_object_id(id)?;

        let mut set = doc! { "updated_at": to_bson_datetime(Utc::now()) };
        if let Some(title) = patch.title {
            set.insert("title", title);
        }
        if let Some(pinned) = patch.pinned {
            set.insert("pinned", pinned);
            match patch.pinned_at {
                Some(at) => {
                    set.insert("pinned_at", to_bson_datetime(at));
                }
                None if pinned => {
                    set.insert("pinned_at", to_bson_datetime(Utc::now()));
                }
                None => {
                    set.insert("pinned_at", Bson::Null);
                }
            }
        }
        if let Some(status) = patch.certified_status {
            set.insert("certified_status", bson::to_bson(&status)?);
        }

        let updated = self
            .threads
            .find_one_and_update(doc! { "_id": oid, "user_id": user_id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;
        Ok(updated.into_thread())
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        let oid = parse_object_id(id)?;
        let result = self
            .threads
            .delete_one(doc! { "_id": oid, "user_id": user_id })
            .await?;
        if result.deleted_count == 0 {
            return Err(PersistError::ThreadNotFound(id.to_string()));
        }
        // Items never outlive their thread.
        self.items.delete_many(doc! { "thread_id": oid }).await?;
        Ok(())
    }

    async fn toggle_pin(&self, id: &str, user_id: &str) -> Result<Thread> {
        let oid = parse_object_id(id)?;
        let current = self
            .threads
            .find_one(doc! { "_id": oid, "user_id": user_id })
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;

        let pinned = !current.pinned;
        let pinned_at = if pinned {
            Bson::DateTime(to_bson_datetime(Utc::now()))
        } else {
            Bson::Null
        };
        let updated = self
            .threads
            .find_one_and_update(
                doc! { "_id": oid, "user_id": user_id },
                doc! { "$set": {
                    "pinned": pinned,
                    "pinned_at": pinned_at,
                    "updated_at": to_bson_datetime(Utc::now()),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))?;
        Ok(updated.into_thread())
    }

    async fn search(&self, user_id: &str, query: &str, limit: i64) -> Result<Vec<Thread>> {
        let pattern = doc! { "$regex": escape_regex(query), "$options": "i" };

        let by_title: Vec<MongoThread> = self
            .threads
            .find(doc! { "user_id": user_id, "title": pattern.clone() })
            .await?
            .try_collect()
            .await?;

        let matching_thread_ids = self
            .items
            .distinct("thread_id", doc! { "query": pattern })
            .await?;
        let by_item_query: Vec<MongoThread> = self
            .threads
            .find(doc! { "user_id": user_id, "_id": { "$in": matching_thread_ids } })
            .await?
            .try_collect()
            .await?;

        let mut merged: Vec<MongoThread> = by_title;
        for thread in by_item_query {
            if !merged.iter().any(|t| t.id == thread.id) {
                merged.push(thread);
            }
        }
        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        merged.truncate(limit.max(0) as usize);
        Ok(merged.into_iter().map(MongoThread::into_thread).collect())
    }

    async fn stats(&self, user_id: &str) -> Result<ThreadStats> {
        let total_threads = self
            .threads
            .count_documents(doc! { "user_id": user_id })
            .await?;
        let pinned_threads = self
            .threads
            .count_documents(doc! { "user_id": user_id, "pinned": true })
            .await?;

        let thread_ids = self.user_thread_ids(user_id).await?;
        let total_thread_items = self
            .items
            .count_documents(doc! { "thread_id": { "$in": &thread_ids } })
            .await?;

        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);
        let threads_today = self
            .threads
            .count_documents(doc! {
                "user_id": user_id,
                "created_at": { "$gte": to_bson_datetime(midnight) },
            })
            .await?;

        Ok(ThreadStats {
            total_threads,
            pinned_threads,
            total_thread_items,
            threads_today,
        })
    }

    async fn clear_all(&self, user_id: &str) -> Result<u64> {
        let thread_ids = self.user_thread_ids(user_id).await?;
        self.items
            .delete_many(doc! { "thread_id": { "$in": &thread_ids } })
            .await?;
        let result = self
            .threads
            .delete_many(doc! { "user_id": user_id })
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_regex;

    #[test]
    fn escapes_regex_metacharacters() {
        assert_eq!(escape_regex("a.b*c"), "a\\.b\\*c");
        assert_eq!(escape_regex("plain words"), "plain words");
        assert_eq!(escape_regex("(x|y)"), "\\(x\\|y\\)");
    }
}
