pub mod domain;
pub mod mode;
pub mod thread;

pub use domain::Domain;
pub use mode::ChatMode;
pub use thread::{
    CertifiedStatus, ItemStatus, NewThread, NewThreadItem, OrderBy, OrderDirection, Thread,
    ThreadFilters, ThreadItem, ThreadItemPatch, ThreadPatch, ThreadStats, UserRecord,
};
