use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use axum::extract::FromRef;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ai::AiClient;
use crate::config::Config;
use crate::session::PlaySession;
use crate::store::Store;

/// Active play sessions, keyed by token. One logical owner per session;
/// the map lock only guards registry access.
pub type Sessions = Arc<RwLock<HashMap<Uuid, PlaySession>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ai: Arc<AiClient>,
    pub sessions: Sessions,
    /// Faculty kill switch for the assistant.
    pub assistant_enabled: Arc<AtomicBool>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            ai: Arc::new(AiClient::from_config(&config)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            assistant_enabled: Arc::new(AtomicBool::new(config.ai_enabled)),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
