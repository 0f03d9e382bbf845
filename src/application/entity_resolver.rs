// Entity resolver - Maps a natural-language reference to one catalog entity
use crate::application::completion_service::{complete_or_empty, CompletionService};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::entity::{Catalog, EntityRecord};
use std::sync::Arc;

/// Answer the completion service gives when nothing matches
pub const NO_MATCH_SENTINEL: &str = "-1";

const RESOLVER_PERSONA: &str = "You are an intelligent IT and network assistant.";
const SITE_RESOLVER_PERSONA: &str = "You are an intelligent assistant that matches queries to sites and countries.";

#[derive(Clone)]
pub struct EntityResolver {
    completion: Arc<dyn CompletionService>,
}

impl EntityResolver {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Pick the single catalog entity the query is about, if any
    pub async fn resolve_entity(&self, query: &str, catalog: &Catalog) -> Option<EntityRecord> {
        if catalog.is_empty() {
            tracing::debug!("Empty catalog; nothing to resolve against");
            return None;
        }

        let prompt = format!(
            "Match the user's query to a device and return ONLY the corresponding ID.\n\
             Here is the list of devices:\n\
             {}\n\n\
             User's question: {}\n\n\
             Return ONLY the ID exactly as listed. If no match is found, return {}.",
            catalog.identifier_listing(),
            query,
            NO_MATCH_SENTINEL
        );

        let answer = complete_or_empty(self.completion.as_ref(), RESOLVER_PERSONA, &prompt).await;
        let resolved = parse_identifier(&answer, catalog.records().into_iter().map(|r| r.platform_id.as_str()))
            .and_then(|id| catalog.find_by_id(id))
            .cloned();

        match &resolved {
            Some(record) => tracing::info!(platform_id = %record.platform_id, label = %record.label, "Resolved entity"),
            None => tracing::info!(answer = answer.trim(), "No entity matched the query"),
        }
        resolved
    }

    /// Pick the dashboard/country a query is about from a static table
    pub async fn resolve_dashboard(&self, query: &str, table: &[DashboardSummary]) -> Option<DashboardSummary> {
        if table.is_empty() {
            return None;
        }

        let listing = table
            .iter()
            .map(|d| format!("{}: {}", d.title, d.id))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Match the user's query to a country or site and return ONLY the corresponding dashboard ID.\n\
             Here is the list of countries and sites with their dashboard IDs:\n\
             {}\n\n\
             User's query: {}\n\n\
             Return ONLY the dashboard ID. If no match is found, return {}.",
            listing, query, NO_MATCH_SENTINEL
        );

        let answer = complete_or_empty(self.completion.as_ref(), SITE_RESOLVER_PERSONA, &prompt).await;
        let id = parse_identifier(&answer, table.iter().map(|d| d.id.as_str()))?;
        table.iter().find(|d| d.id.as_str() == id).cloned()
    }
}

/// Validate a resolver answer against the identifiers actually offered.
///
/// The sentinel, an empty answer, or anything that is not one of the
/// candidates is treated as no match.
fn parse_identifier<'a>(answer: &str, mut candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let answer = answer
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim();

    if answer.is_empty() || answer == NO_MATCH_SENTINEL {
        return None;
    }

    candidates.find(|candidate| *candidate == answer)
}
