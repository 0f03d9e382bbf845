// Dashboard domain model
use super::entity::EntityReference;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DashboardId(String);

impl DashboardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DashboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A selectable dashboard (or country site) as shown on the landing view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub id: DashboardId,
    pub title: String,
}

impl DashboardSummary {
    pub fn new(id: DashboardId, title: String) -> Self {
        Self { id, title }
    }
}

/// A dashboard configuration reduced to the entity references it contains
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub id: DashboardId,
    pub title: String,
    pub references: Vec<EntityReference>,
}

impl DashboardConfig {
    pub fn new(id: DashboardId, title: String, references: Vec<EntityReference>) -> Self {
        Self {
            id,
            title,
            references,
        }
    }
}
