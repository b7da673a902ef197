pub mod items;
pub mod models;
pub mod threads;
pub mod users;

pub use items::MongoThreadItemStore;
pub use threads::MongoThreadStore;
pub use users::MongoUserStore;
