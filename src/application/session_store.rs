// Session store trait for the per-session dashboard selection
use crate::domain::session::SessionContext;

pub trait SessionStore: Send + Sync {
    /// Selection for `session_key`, empty if the session is unknown
    fn get(&self, session_key: &str) -> SessionContext;

    fn set(&self, session_key: &str, context: SessionContext);
}
