use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};

use counsel_types::{NewThreadItem, ThreadItem, ThreadItemPatch};

use crate::error::{PersistError, Result};
use crate::mongo::models::{to_bson_datetime, MongoThread, MongoThreadItem};
use crate::traits::ThreadItemStore;

fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[derive(Clone)]
pub struct MongoThreadItemStore {
    items: Collection<MongoThreadItem>,
    threads: Collection<MongoThread>,
}

impl MongoThreadItemStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            items: db.collection("thread_items"),
            threads: db.collection("threads"),
        }
    }

    async fn touch_thread(&self, thread_id: ObjectId) -> Result<()> {
        self.threads
            .update_one(
                doc! { "_id": thread_id },
                doc! { "$set": { "updated_at": to_bson_datetime(Utc::now()) } },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadItemStore for MongoThreadItemStore {
    async fn create(&self, input: NewThreadItem) -> Result<ThreadItem> {
        let thread_id = parse_object_id(&input.thread_id)?;
        let parent_id = input.parent_id.as_deref().map(parse_object_id).transpose()?;

        let now = to_bson_datetime(Utc::now());
        let item = MongoThreadItem {
            id: ObjectId::new(),
            thread_id,
            parent_id,
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
        self.items.insert_one(&item).await?;
        self.touch_thread(thread_id).await?;
        Ok(item.into_item())
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<ThreadItem>> {
        let oid = parse_object_id(thread_id)?;
        let items: Vec<MongoThreadItem> = self
            .items
            .find(doc! { "thread_id": oid })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(items.into_iter().map(MongoThreadItem::into_item).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<ThreadItem>> {
        let oid = parse_object_id(id)?;
        let found = self.items.find_one(doc! { "_id": oid }).await?;
        Ok(found.map(MongoThreadItem::into_item))
    }

    async fn update(&self, id: &str, patch: ThreadItemPatch) -> Result<ThreadItem> {
        let oid = parse_object_id(id)?;

        let mut set = doc! { "updated_at": to_bson_datetime(Utc::now()) };
        if let Some(query) = patch.query {
            set.insert("query", query);
        }
        if let Some(status) = patch.status {
            set.insert("status", bson::to_bson(&status)?);
        }
        if let Some(error) = patch.error {
            set.insert("error", error);
        }
        if let Some(image) = patch.image_attachment {
            set.insert("image_attachment", image);
        }
        if let Some(v) = patch.tool_calls {
            set.insert("tool_calls", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.tool_results {
            set.insert("tool_results", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.steps {
            set.insert("steps", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.answer {
            set.insert("answer", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.metadata {
            set.insert("metadata", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.sources {
            set.insert("sources", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.suggestions {
            set.insert("suggestions", bson::to_bson(&v)?);
        }
        if let Some(v) = patch.object {
            set.insert("object", bson::to_bson(&v)?);
        }

        let updated = self
            .items
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::ThreadItemNotFound(id.to_string()))?;
        Ok(updated.into_item())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let oid = parse_object_id(id)?;
        let result = self.items.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(PersistError::ThreadItemNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_followups(&self, id: &str) -> Result<u64> {
        let oid = parse_object_id(id)?;
        let anchor = self
            .items
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| PersistError::ThreadItemNotFound(id.to_string()))?;

        let result = self
            .items
            .delete_many(doc! {
                "thread_id": anchor.thread_id,
                "created_at": { "$gt": anchor.created_at },
            })
            .await?;
        Ok(result.deleted_count)
    }
}
