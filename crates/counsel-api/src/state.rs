use std::sync::Arc;

use counsel_identity::IdentityProvider;
use counsel_persist::{ThreadItemStore, ThreadStore, UserStore};
use counsel_workflow::Workflow;

use crate::config::Config;

/// Shared application state. All collaborators sit behind trait objects so
/// the test profile can swap in the in-memory store and a static identity
/// provider.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub threads: Arc<dyn ThreadStore>,
    pub items: Arc<dyn ThreadItemStore>,
    pub users: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub workflow: Arc<Workflow>,
}

impl AppState {
    pub fn new(
        config: Config,
        threads: Arc<dyn ThreadStore>,
        items: Arc<dyn ThreadItemStore>,
        users: Arc<dyn UserStore>,
        identity: Arc<dyn IdentityProvider>,
        workflow: Arc<Workflow>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            threads,
            items,
            users,
            identity,
            workflow,
        }
    }
}
