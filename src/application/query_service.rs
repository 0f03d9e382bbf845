// Query service - Routes a question through classification, resolution and aggregation
use crate::application::catalog_builder::CatalogBuilder;
use crate::application::completion_service::CompletionService;
use crate::application::context_aggregator::ContextAggregator;
use crate::application::entity_resolver::EntityResolver;
use crate::application::monitoring_repository::MonitoringRepository;
use crate::application::relevance_classifier::{RelevanceClassifier, Vocabulary};
use crate::application::response_composer::ResponseComposer;
use crate::domain::dashboard::{DashboardId, DashboardSummary};
use crate::domain::entity::{Catalog, EntityRecord};
use crate::domain::routing::{QueryAnswer, RoutingDecision};
use crate::domain::session::SessionContext;
use crate::infrastructure::config::AssistantSettings;
use serde::Serialize;
use std::sync::Arc;

const NO_SITE_MESSAGE: &str = "Please select a site or mention the country you are asking about.";

/// The selectable entities of one dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub dashboard_id: DashboardId,
    pub dashboard_title: String,
    pub entities: Vec<EntityRecord>,
}

#[derive(Clone)]
pub struct QueryService {
    repository: Arc<dyn MonitoringRepository>,
    catalog_builder: CatalogBuilder,
    classifier: RelevanceClassifier,
    resolver: EntityResolver,
    aggregator: ContextAggregator,
    composer: ResponseComposer,
    categories: Vec<String>,
    dashboards: Vec<DashboardSummary>,
}

impl QueryService {
    pub fn new(
        repository: Arc<dyn MonitoringRepository>,
        completion: Arc<dyn CompletionService>,
        settings: &AssistantSettings,
    ) -> Self {
        Self {
            catalog_builder: CatalogBuilder::new(repository.clone()),
            classifier: RelevanceClassifier::new(completion.clone()),
            resolver: EntityResolver::new(completion.clone()),
            aggregator: ContextAggregator::new(repository.clone(), settings.max_context_chars),
            composer: ResponseComposer::new(completion, settings.persona.clone(), settings.max_sentences),
            repository,
            categories: settings.categories.clone(),
            dashboards: settings
                .dashboards
                .iter()
                .map(|d| DashboardSummary::new(DashboardId::new(d.id.clone()), d.name.clone()))
                .collect(),
        }
    }

    /// Dashboards offered for selection: the static table when configured,
    /// otherwise whatever the platform lists
    pub async fn list_dashboards(&self) -> Vec<DashboardSummary> {
        if !self.dashboards.is_empty() {
            return self.dashboards.clone();
        }

        match self.repository.list_dashboards().await {
            Ok(dashboards) => dashboards,
            Err(e) => {
                tracing::error!(error = %e, "Error listing dashboards");
                Vec::new()
            }
        }
    }

    /// Build the entity catalog shown after a dashboard is selected
    pub async fn select_site(&self, id: &DashboardId) -> SiteView {
        match self.load_catalog(id).await {
            Some((dashboard_title, catalog)) => SiteView {
                dashboard_id: id.clone(),
                dashboard_title,
                entities: catalog.records().into_iter().cloned().collect(),
            },
            None => SiteView {
                dashboard_id: id.clone(),
                dashboard_title: self.table_title(id).unwrap_or_else(|| id.to_string()),
                entities: Vec::new(),
            },
        }
    }

    pub async fn answer(&self, query: &str, session: &SessionContext) -> QueryAnswer {
        if !self.categories.is_empty() {
            // Static vocabulary: classify before touching the monitoring platform
            let decision = self
                .classifier
                .classify(query, Vocabulary::Categories(&self.categories))
                .await;
            if decision == RoutingDecision::NoContextNeeded {
                return self.answer_directly(query).await;
            }

            let Some(site) = self.resolve_site(query, session).await else {
                return QueryAnswer::new(NO_SITE_MESSAGE.to_string(), RoutingDecision::NoMatch);
            };
            let Some((site_title, catalog)) = self.load_catalog(&site).await else {
                let title = self.table_title(&site).unwrap_or_else(|| site.to_string());
                return QueryAnswer::new(
                    format!("Monitoring data for {} is unavailable right now.", title),
                    RoutingDecision::NoMatch,
                );
            };
            return self.answer_from_catalog(query, &site_title, &catalog).await;
        }

        let Some(site) = self.resolve_site(query, session).await else {
            tracing::debug!("No site selected; answering without live data");
            return self.answer_directly(query).await;
        };
        let Some((site_title, catalog)) = self.load_catalog(&site).await else {
            return self.answer_directly(query).await;
        };

        let decision = self.classifier.classify(query, Vocabulary::Catalog(&catalog)).await;
        if decision == RoutingDecision::NoContextNeeded {
            return self.answer_directly(query).await;
        }
        self.answer_from_catalog(query, &site_title, &catalog).await
    }

    async fn answer_directly(&self, query: &str) -> QueryAnswer {
        let response = self.composer.answer_directly(query).await;
        QueryAnswer::new(response, RoutingDecision::NoContextNeeded)
    }

    async fn answer_from_catalog(&self, query: &str, site_title: &str, catalog: &Catalog) -> QueryAnswer {
        let devices = catalog.category_lines();

        let Some(entity) = self.resolver.resolve_entity(query, catalog).await else {
            return QueryAnswer::new(
                format!("That device cannot be found in {}.", site_title),
                RoutingDecision::NoMatch,
            )
            .with_devices(devices);
        };

        let context = self.aggregator.aggregate(&entity).await;
        let response = self.composer.compose(query, &context).await;
        QueryAnswer::new(response, RoutingDecision::NeedsContext).with_devices(devices)
    }

    /// The session's selection, else a site named in the query
    async fn resolve_site(&self, query: &str, session: &SessionContext) -> Option<DashboardId> {
        if let Some(id) = &session.selected_dashboard {
            return Some(id.clone());
        }

        let site = self.resolver.resolve_dashboard(query, &self.dashboards).await?;
        tracing::info!(dashboard_id = %site.id, title = %site.title, "Resolved site from query");
        Some(site.id)
    }

    async fn load_catalog(&self, id: &DashboardId) -> Option<(String, Catalog)> {
        let config = match self.repository.dashboard(id).await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(dashboard_id = %id, error = %e, "Error fetching dashboard");
                return None;
            }
        };

        let catalog = self.catalog_builder.build(&config).await;
        let title = self.table_title(id).unwrap_or(config.title);
        Some((title, catalog))
    }

    fn table_title(&self, id: &DashboardId) -> Option<String> {
        self.dashboards
            .iter()
            .find(|d| &d.id == id)
            .map(|d| d.title.clone())
    }
}
