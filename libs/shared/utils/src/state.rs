use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::{DocumentStore, InMemoryStore, SupabaseClient};

use crate::clock::{Clock, SystemClock};

/// Shared router state: configuration plus the collaborators every cell needs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock,
        }
    }

    /// Use Supabase when configured, otherwise an empty in-memory store.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn DocumentStore> = if config.is_configured() {
            info!("Using Supabase document store at {}", config.supabase_url);
            Arc::new(SupabaseClient::new(&config))
        } else {
            warn!("Supabase not configured, falling back to in-memory document store");
            Arc::new(InMemoryStore::new())
        };

        Self::new(config, store, Arc::new(SystemClock))
    }
}
