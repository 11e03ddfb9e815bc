use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::store::UserStore;
use crate::upstream::Upstream;

/// Shared handles threaded through every axum handler.
///
/// Wizard state never lives here: the wizard is reconstructed from the
/// URL on each request. Only login sessions, flash queues, and the user
/// store are process-wide.
#[derive(Clone)]
pub struct SharedState {
    pub store: UserStore,
    /// session id -> username
    pub sessions: Arc<Mutex<HashMap<String, String>>>,
    /// session id -> pending flash messages, drained on next render
    pub flashes: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub upstream: Upstream,
    /// Host of the provisioning API, shown in the page header.
    pub api_host: String,
}

impl SharedState {
    pub fn new(config: &Config, store: UserStore) -> Self {
        SharedState {
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            flashes: Arc::new(Mutex::new(HashMap::new())),
            upstream: Upstream::new(
                &config.api_base_url,
                &config.api_token,
                config.upstream_timeout,
                config.customer_id.clone(),
            ),
            api_host: crate::config::host_of(&config.api_base_url),
        }
    }
}
