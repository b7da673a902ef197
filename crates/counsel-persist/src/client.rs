use mongodb::Client;

use crate::error::{PersistError, Result};
use crate::mongo::{MongoThreadItemStore, MongoThreadStore, MongoUserStore};

/// Bundles the three MongoDB stores behind one connection.
pub struct PersistClient {
    threads: MongoThreadStore,
    items: MongoThreadItemStore,
    users: MongoUserStore,
}

impl PersistClient {
    pub async fn connect(mongodb_uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self {
            threads: MongoThreadStore::new(&client, db_name),
            items: MongoThreadItemStore::new(&client, db_name),
            users: MongoUserStore::new(&client, db_name),
        })
    }

    pub fn threads(&self) -> MongoThreadStore {
        self.threads.clone()
    }

    pub fn items(&self) -> MongoThreadItemStore {
        self.items.clone()
    }

    pub fn users(&self) -> MongoUserStore {
        self.users.clone()
    }
}
