// Repository trait for monitoring platform access
use crate::domain::dashboard::{DashboardConfig, DashboardId, DashboardSummary};
use crate::domain::entity::PlatformId;
use crate::domain::telemetry::{Alarm, EntityAttributes, EntityProfile, Reading};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("request to monitoring platform failed: {0}")]
    Transport(String),
    #[error("monitoring platform returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("monitoring platform API error: {0}")]
    Api(String),
    #[error("unexpected monitoring payload: {0}")]
    Malformed(String),
    #[error("{0} not found on monitoring platform")]
    NotFound(String),
    #[error("authentication with monitoring platform failed: {0}")]
    Auth(String),
}

#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    /// List the dashboards the configured account can see
    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>, MonitoringError>;

    /// Fetch a dashboard configuration reduced to its entity references
    async fn dashboard(&self, id: &DashboardId) -> Result<DashboardConfig, MonitoringError>;

    /// Title, category and name of an entity
    async fn entity_profile(&self, id: &PlatformId) -> Result<EntityProfile, MonitoringError>;

    /// Latest value of every metric the entity reports
    async fn latest_readings(&self, id: &PlatformId) -> Result<Vec<Reading>, MonitoringError>;

    async fn entity_attributes(&self, id: &PlatformId) -> Result<EntityAttributes, MonitoringError>;

    /// Active alarms/problems raised by the entity
    async fn active_alarms(&self, id: &PlatformId) -> Result<Vec<Alarm>, MonitoringError>;
}
