pub mod client;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod traits;

pub use client::PersistClient;
pub use error::PersistError;
pub use memory::MemoryStore;
pub use mongo::{MongoThreadItemStore, MongoThreadStore, MongoUserStore};
pub use traits::{ThreadItemStore, ThreadStore, UserStore};
