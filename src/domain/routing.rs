// Query routing outcomes
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingDecision {
    NeedsContext,
    NoContextNeeded,
    NoMatch,
}

/// The pipeline's answer to one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub response: String,
    pub decision: RoutingDecision,
    /// Entities that were considered, as "label, category" lines
    pub devices: Option<Vec<String>>,
}

impl QueryAnswer {
    pub fn new(response: String, decision: RoutingDecision) -> Self {
        Self {
            response,
            decision,
            devices: None,
        }
    }

    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.devices = Some(devices);
        self
    }
}
