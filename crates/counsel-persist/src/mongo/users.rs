use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use counsel_types::UserRecord;

use crate::error::Result;
use crate::mongo::models::MongoUser;
use crate::traits::UserStore;

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<MongoUser>,
}

impl MongoUserStore {
    pub fn new(client: &Client, db_name: &str) -> Self {
        Self {
            users: client.database(db_name).collection("users"),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn upsert(&self, user: UserRecord) -> Result<UserRecord> {
        let mongo_user = MongoUser::from_record(user);
        self.users
            .replace_one(doc! { "_id": &mongo_user.id }, &mongo_user)
            .upsert(true)
            .await?;
        Ok(mongo_user.into_record())
    }

    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let found = self.users.find_one(doc! { "_id": id }).await?;
        Ok(found.map(MongoUser::into_record))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.users.delete_one(doc! { "_id": id }).await?;
        Ok(())
    }
}
