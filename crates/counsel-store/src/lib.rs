pub mod api;
pub mod certification;
pub mod optimistic;
pub mod prefs;
pub mod store;

pub use api::{ApiError, ApiResult, HttpThreadApi, ThreadApi};
pub use certification::{badge_for, CertificationBadge};
pub use optimistic::OptimisticIdMap;
pub use prefs::{Debouncer, PrefsSink, StorePrefs};
pub use store::ChatStore;
