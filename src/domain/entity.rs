// Entity catalog domain models
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of an entity on the monitoring platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Device,
    Host,
    Other,
}

impl EntityKind {
    /// Only single device/host references are catalogued
    pub fn is_single_entity(self) -> bool {
        matches!(self, EntityKind::Device | EntityKind::Host)
    }
}

/// A reference to a monitored entity found in a dashboard configuration.
///
/// `label` is set when the configuration itself names the entity (a dashboard
/// page, for instance); otherwise the platform's title attribute is used.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReference {
    pub label: Option<String>,
    pub kind: EntityKind,
    pub ids: Vec<PlatformId>,
}

impl EntityReference {
    pub fn new(label: Option<String>, kind: EntityKind, ids: Vec<PlatformId>) -> Self {
        Self { label, kind, ids }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub label: String,
    pub category: String,
    pub platform_id: PlatformId,
}

impl EntityRecord {
    pub fn new(label: String, category: String, platform_id: PlatformId) -> Self {
        Self {
            label,
            category,
            platform_id,
        }
    }
}

/// Label to entity mapping for one dashboard, rebuilt per request
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, EntityRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, returning the one it replaced if the label was taken
    pub fn insert(&mut self, record: EntityRecord) -> Option<EntityRecord> {
        self.entries.insert(record.label.clone(), record)
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<&EntityRecord> {
        self.entries.get(label)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&EntityRecord> {
        self.entries.values().find(|r| r.platform_id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records ordered by label so rendered listings are stable
    pub fn records(&self) -> Vec<&EntityRecord> {
        let mut records: Vec<&EntityRecord> = self.entries.values().collect();
        records.sort_by(|a, b| a.label.cmp(&b.label));
        records
    }

    /// "label, category" per line
    pub fn category_lines(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|r| format!("{}, {}", r.label, r.category))
            .collect()
    }

    /// "Device: label, ID: id." per line, the listing handed to the resolver
    pub fn identifier_listing(&self) -> String {
        self.records()
            .into_iter()
            .map(|r| format!("Device: {}, ID: {}.", r.label, r.platform_id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
