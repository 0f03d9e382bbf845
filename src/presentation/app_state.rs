// Application state for HTTP handlers
use crate::application::query_service::QueryService;
use crate::application::session_store::SessionStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub query_service: QueryService,
    pub sessions: Arc<dyn SessionStore>,
    /// Lifetime of the session cookie, matching the store's expiry
    pub session_ttl_secs: u64,
}
