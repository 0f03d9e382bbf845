// In-memory session store keyed by session cookie
use crate::application::session_store::SessionStore;
use crate::domain::session::SessionContext;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct SessionEntry {
    context: SessionContext,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) >= ttl
    }
}

/// Sessions expire `ttl` after they were last read or written
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_key: &str) -> SessionContext {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(session_key) {
            if !entry.is_expired(now, self.ttl) {
                entry.last_seen = now;
                return entry.context.clone();
            }
        }

        self.sessions
            .remove_if(session_key, |_, entry| entry.is_expired(now, self.ttl));
        SessionContext::default()
    }

    fn set(&self, session_key: &str, context: SessionContext) {
        let now = Instant::now();
        self.sessions.retain(|_, entry| !entry.is_expired(now, self.ttl));
        self.sessions.insert(
            session_key.to_string(),
            SessionEntry {
                context,
                last_seen: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::DashboardId;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_unknown_session_is_empty() {
        let store = InMemorySessionStore::new(HOUR);
        assert_eq!(store.get("nope"), SessionContext::default());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new(HOUR);
        store.set("a", SessionContext::with_dashboard(DashboardId::new("130")));
        store.set("b", SessionContext::with_dashboard(DashboardId::new("118")));
        store.set("a", SessionContext::with_dashboard(DashboardId::new("147")));

        assert_eq!(store.get("a").selected_dashboard, Some(DashboardId::new("147")));
        assert_eq!(store.get("b").selected_dashboard, Some(DashboardId::new("118")));
    }

    #[test]
    fn test_expired_session_reads_back_empty() {
        let store = InMemorySessionStore::new(Duration::from_millis(20));
        store.set("a", SessionContext::with_dashboard(DashboardId::new("130")));

        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(store.get("a"), SessionContext::default());
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_set_prunes_expired_sessions() {
        let store = InMemorySessionStore::new(Duration::ZERO);
        for key in ["a", "b", "c"] {
            store.set(key, SessionContext::with_dashboard(DashboardId::new("130")));
        }

        assert_eq!(store.sessions.len(), 1);
        assert!(store.sessions.contains_key("c"));
    }
}
