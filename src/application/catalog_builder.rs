// Catalog builder - Turns a dashboard configuration into a label -> entity mapping
use crate::application::monitoring_repository::MonitoringRepository;
use crate::domain::dashboard::DashboardConfig;
use crate::domain::entity::{Catalog, EntityRecord, EntityReference, PlatformId};
use futures::future::join_all;
use std::sync::Arc;

const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Clone)]
pub struct CatalogBuilder {
    repository: Arc<dyn MonitoringRepository>,
}

impl CatalogBuilder {
    pub fn new(repository: Arc<dyn MonitoringRepository>) -> Self {
        Self { repository }
    }

    /// Build the catalog for one dashboard.
    ///
    /// Entities without a title or without any readings are left out, and a
    /// failed fetch skips only that entity. On a label collision the later
    /// reference (in configuration order) wins.
    pub async fn build(&self, config: &DashboardConfig) -> Catalog {
        let candidates: Vec<(Option<&str>, &PlatformId)> = config
            .references
            .iter()
            .filter(|r| r.kind.is_single_entity())
            .filter_map(|r| select_identifier(r).map(|id| (r.label.as_deref(), id)))
            .collect();

        let records = join_all(
            candidates
                .iter()
                .map(|(label, id)| self.describe(*label, id)),
        )
        .await;

        let mut catalog = Catalog::new();
        for record in records.into_iter().flatten() {
            let label = record.label.clone();
            let platform_id = record.platform_id.clone();
            if let Some(previous) = catalog.insert(record) {
                tracing::warn!(
                    dashboard_id = %config.id,
                    %label,
                    replaced = %previous.platform_id,
                    kept = %platform_id,
                    "Duplicate entity label; keeping the later entity"
                );
            }
        }

        tracing::debug!(
            dashboard_id = %config.id,
            "Built catalog with {} of {} entity references",
            catalog.len(),
            config.references.len()
        );
        catalog
    }

    async fn describe(&self, label: Option<&str>, id: &PlatformId) -> Option<EntityRecord> {
        let profile = match self.repository.entity_profile(id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(platform_id = %id, error = %e, "Error fetching entity profile");
                return None;
            }
        };

        let readings = match self.repository.latest_readings(id).await {
            Ok(readings) => readings,
            Err(e) => {
                tracing::error!(platform_id = %id, error = %e, "Error fetching entity readings");
                return None;
            }
        };

        let label = label
            .map(str::to_string)
            .or(profile.title)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        let Some(label) = label else {
            tracing::debug!(platform_id = %id, "Skipping entity without a title");
            return None;
        };

        if readings.is_empty() {
            tracing::debug!(platform_id = %id, %label, "Skipping entity without readings");
            return None;
        }

        let category = profile
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

        Some(EntityRecord::new(label, category, id.clone()))
    }
}

/// First identifier of a reference; several identifiers are flagged, not resolved
fn select_identifier(reference: &EntityReference) -> Option<&PlatformId> {
    if reference.ids.len() > 1 {
        tracing::warn!(
            label = reference.label.as_deref().unwrap_or("<unnamed>"),
            count = reference.ids.len(),
            "Multiple identifiers on one entity reference; keeping the first"
        );
    }
    reference.ids.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::StubRepository;
    use crate::domain::dashboard::DashboardId;
    use crate::domain::entity::EntityKind;
    use std::sync::atomic::Ordering;

    fn config(references: Vec<EntityReference>) -> DashboardConfig {
        DashboardConfig::new(DashboardId::new("site-1"), "Site One".to_string(), references)
    }

    fn device(id: &str) -> EntityReference {
        EntityReference::new(None, EntityKind::Device, vec![PlatformId::new(id)])
    }

    #[tokio::test]
    async fn test_builds_catalog_from_device_references() {
        let repo = Arc::new(
            StubRepository::new()
                .with_device("d1", "Door Sensor", "contact", &[("open", "false")])
                .with_device("d2", "Server Room Sensor", "temperature", &[("temperature", "21.5")]),
        );
        let builder = CatalogBuilder::new(repo);

        let catalog = builder.build(&config(vec![device("d1"), device("d2")])).await;

        assert_eq!(catalog.len(), 2);
        let record = catalog.get("Server Room Sensor").unwrap();
        assert_eq!(record.category, "temperature");
        assert_eq!(record.platform_id.as_str(), "d2");
    }

    #[tokio::test]
    async fn test_skips_untitled_silent_and_failing_entities() {
        let mut repo = StubRepository::new()
            .with_device("ok", "Meeting Room", "occupancy", &[("occupied", "true")])
            .with_device("silent", "Storage", "humidity", &[])
            .with_device("broken", "Lobby", "camera", &[("fps", "30")])
            .failing_on("broken");
        repo.profiles.get_mut("ok").unwrap().category = None;
        let builder = CatalogBuilder::new(Arc::new(repo));

        let catalog = builder
            .build(&config(vec![
                device("ok"),
                device("silent"),
                device("broken"),
                device("unknown"),
            ]))
            .await;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Meeting Room").unwrap().category, "Unknown");
    }

    #[tokio::test]
    async fn test_label_collision_keeps_later_entity() {
        let repo = StubRepository::new()
            .with_device("a", "Door Sensor", "contact", &[("open", "true")])
            .with_device("b", "Door Sensor", "contact", &[("open", "false")]);
        let builder = CatalogBuilder::new(Arc::new(repo));

        let catalog = builder.build(&config(vec![device("a"), device("b")])).await;

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Door Sensor").unwrap().platform_id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_configured_label_wins_and_first_identifier_is_kept() {
        let repo = Arc::new(
            StubRepository::new()
                .with_device("10084", "core-rtr-01", "router", &[("ICMP ping", "1")])
                .with_device("10085", "core-rtr-02", "router", &[("ICMP ping", "1")]),
        );
        let builder = CatalogBuilder::new(repo.clone());
        let page = EntityReference::new(
            Some("Core Router".to_string()),
            EntityKind::Host,
            vec![PlatformId::new("10084"), PlatformId::new("10085")],
        );

        let catalog = builder.build(&config(vec![page])).await;

        assert_eq!(catalog.get("Core Router").unwrap().platform_id.as_str(), "10084");
        assert_eq!(repo.calls.profile.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_single_entity_references_yields_empty_catalog() {
        let repo = Arc::new(StubRepository::new());
        let builder = CatalogBuilder::new(repo.clone());
        let group = EntityReference::new(None, EntityKind::Other, vec![PlatformId::new("g1")]);
        let empty_page = EntityReference::new(Some("Overview".to_string()), EntityKind::Host, vec![]);

        let catalog = builder.build(&config(vec![group, empty_page])).await;

        assert!(catalog.is_empty());
        assert_eq!(repo.calls.total(), 0);
    }
}
