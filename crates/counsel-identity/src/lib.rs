pub mod provider;
pub mod sync;
pub mod webhook;

pub use provider::{IdentityError, IdentityProvider, Profile, Session, StaticTokenProvider};
pub use sync::AuthSyncClient;
pub use webhook::{LifecycleEvent, LifecycleKind};
