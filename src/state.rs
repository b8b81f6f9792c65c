use crate::config::Config;
use crate::notice::NoticeBoard;
use crate::registry::EndpointRegistry;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EndpointRegistry>,
    pub notices: Arc<NoticeBoard>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            registry: Arc::new(EndpointRegistry::new(store)),
            notices: Arc::new(NoticeBoard::new(config.notice_ttl)),
            config: Arc::new(config),
        }
    }
}
