// Per-session selection state
use super::dashboard::DashboardId;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub selected_dashboard: Option<DashboardId>,
}

impl SessionContext {
    pub fn with_dashboard(id: DashboardId) -> Self {
        Self {
            selected_dashboard: Some(id),
        }
    }
}
