// Telemetry data domain models
use super::entity::EntityRecord;
use chrono::{DateTime, Utc};

/// Acknowledgement action code that, paired with new severity 0, marks a
/// problem as cleared by an operator
pub const SEVERITY_CLEARED_ACTION: u32 = 4;
pub const SEVERITY_CLEARED_LEVEL: u8 = 0;

/// Latest value of one metric
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub name: String,
    pub description: Option<String>,
    pub value: String,
}

impl Reading {
    pub fn new(name: String, description: Option<String>, value: String) -> Self {
        Self {
            name,
            description,
            value,
        }
    }
}

/// Display title, category and platform name of an entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityProfile {
    pub title: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
}

/// Descriptive attributes of an entity; any field may be missing upstream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityAttributes {
    pub name: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    pub action: u32,
    pub new_severity: u8,
    pub message: Option<String>,
}

impl Acknowledgement {
    pub fn new(action: u32, new_severity: u8, message: Option<String>) -> Self {
        Self {
            action,
            new_severity,
            message,
        }
    }

    pub fn clears_severity(&self) -> bool {
        self.action == SEVERITY_CLEARED_ACTION && self.new_severity == SEVERITY_CLEARED_LEVEL
    }
}

/// An active alarm (device platform) or problem (network platform)
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub name: String,
    pub severity: String,
    pub status: Option<String>,
    pub detail: Option<String>,
    pub raised_at: Option<DateTime<Utc>>,
    pub acknowledgements: Vec<Acknowledgement>,
}

impl Alarm {
    pub fn new(name: String, severity: String) -> Self {
        Self {
            name,
            severity,
            status: None,
            detail: None,
            raised_at: None,
            acknowledgements: Vec::new(),
        }
    }

    /// Acknowledged only by severity-cleared actions, so no longer actionable
    pub fn is_cleared(&self) -> bool {
        !self.acknowledgements.is_empty()
            && self.acknowledgements.iter().all(Acknowledgement::clears_severity)
    }

    /// Messages of every acknowledgement that did not clear the severity
    pub fn acknowledgement_messages(&self) -> impl Iterator<Item = &str> {
        self.acknowledgements
            .iter()
            .filter(|ack| !ack.clears_severity())
            .filter_map(|ack| ack.message.as_deref())
            .filter(|message| !message.trim().is_empty())
    }
}

/// Live state of one resolved entity, fetched fresh per query.
///
/// `None` collections mean the fetch failed, as opposed to an empty result.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub entity: EntityRecord,
    pub attributes: EntityAttributes,
    pub readings: Option<Vec<Reading>>,
    pub alarms: Option<Vec<Alarm>>,
}
