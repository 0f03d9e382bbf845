// Relevance classifier - Decides whether a query needs live monitoring data
use crate::application::completion_service::CompletionService;
use crate::domain::entity::Catalog;
use crate::domain::routing::RoutingDecision;
use std::sync::Arc;

const CLASSIFIER_PERSONA: &str = "You are an intelligent IT assistant. Decide if the user's query references \
any of the listed locations, devices or infrastructures (including partial or synonymous matches).";

/// What the classifier matches the query against
#[derive(Debug, Clone, Copy)]
pub enum Vocabulary<'a> {
    Catalog(&'a Catalog),
    Categories(&'a [String]),
}

impl Vocabulary<'_> {
    fn listing(&self) -> String {
        match self {
            Vocabulary::Catalog(catalog) if catalog.is_empty() => "(no devices)".to_string(),
            Vocabulary::Catalog(catalog) => catalog.category_lines().join("\n"),
            Vocabulary::Categories(categories) => categories.join("\n"),
        }
    }
}

#[derive(Clone)]
pub struct RelevanceClassifier {
    completion: Arc<dyn CompletionService>,
}

impl RelevanceClassifier {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub async fn classify(&self, query: &str, vocabulary: Vocabulary<'_>) -> RoutingDecision {
        let prompt = build_prompt(query, &vocabulary.listing());

        let answer = match self.completion.complete(CLASSIFIER_PERSONA, &prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "Relevance classification failed; answering without live data");
                return RoutingDecision::NoContextNeeded;
            }
        };

        let decision = parse_verdict(&answer);
        tracing::info!(?decision, answer = answer.trim(), "Relevance classification");
        decision
    }
}

pub fn build_prompt(query: &str, listing: &str) -> String {
    format!(
        "You are an intelligent IT and network assistant.\n\
         You have a list of monitored devices, locations and infrastructure types:\n\
         {listing}\n\n\
         Here is the user's query:\n\
         '{query}'\n\n\
         Determine if the user's query references or might reference any of the listed locations, \
         device names, device types or infrastructures (including synonyms or partial matches). \
         For instance, if the user mentions 'door' of any sort and the list has 'Door Sensor', \
         consider that a match. If the query references a location that contains 'room' and \
         the list has 'System Room' or 'Meeting Room', treat that as referencing it. \
         If the query references anything from the list (even partially), respond with ONLY 'YES'. \
         If the query mentions alarms, problems or errors in any way, respond with ONLY 'YES'. \
         Otherwise respond with ONLY 'NO'. \
         Do not provide any explanation or additional text."
    )
}

/// Only an exact YES (ignoring case and surrounding whitespace) routes to live data
fn parse_verdict(answer: &str) -> RoutingDecision {
    if answer.trim().eq_ignore_ascii_case("YES") {
        RoutingDecision::NeedsContext
    } else {
        RoutingDecision::NoContextNeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::StubCompletion;
    use crate::domain::entity::{EntityRecord, PlatformId};

    #[test]
    fn test_parse_verdict_is_strict() {
        assert_eq!(parse_verdict("YES"), RoutingDecision::NeedsContext);
        assert_eq!(parse_verdict("  yes\n"), RoutingDecision::NeedsContext);
        assert_eq!(parse_verdict("NO"), RoutingDecision::NoContextNeeded);
        assert_eq!(parse_verdict("YES, the door sensor"), RoutingDecision::NoContextNeeded);
        assert_eq!(parse_verdict("Maybe"), RoutingDecision::NoContextNeeded);
        assert_eq!(parse_verdict(""), RoutingDecision::NoContextNeeded);
    }

    #[tokio::test]
    async fn test_prompt_carries_query_and_catalog_labels() {
        let completion = Arc::new(StubCompletion::replying("YES"));
        let classifier = RelevanceClassifier::new(completion.clone());
        let mut catalog = Catalog::new();
        catalog.insert(EntityRecord::new(
            "Door Sensor".to_string(),
            "contact".to_string(),
            PlatformId::new("d1"),
        ));

        let decision = classifier
            .classify("Is the front door open?", Vocabulary::Catalog(&catalog))
            .await;

        assert_eq!(decision, RoutingDecision::NeedsContext);
        let recorded = completion.recorded();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].1.contains("Is the front door open?"));
        assert!(recorded[0].1.contains("Door Sensor, contact"));
        assert!(recorded[0]
            .1
            .contains("If the query mentions alarms, problems or errors in any way, respond with ONLY 'YES'."));
    }

    #[tokio::test]
    async fn test_static_categories_and_failure_default() {
        let categories = vec!["VSAT".to_string(), "UPS".to_string()];

        let completion = Arc::new(StubCompletion::failing());
        let classifier = RelevanceClassifier::new(completion.clone());
        let decision = classifier
            .classify("How is the VSAT link?", Vocabulary::Categories(&categories))
            .await;

        assert_eq!(decision, RoutingDecision::NoContextNeeded);
        assert!(completion.recorded()[0].1.contains("VSAT\nUPS"));
    }
}
