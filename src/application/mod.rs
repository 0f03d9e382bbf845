// Application layer - Query pipeline and collaborator seams
pub mod catalog_builder;
pub mod completion_service;
pub mod context_aggregator;
pub mod entity_resolver;
pub mod monitoring_repository;
pub mod query_service;
pub mod relevance_classifier;
pub mod response_composer;
pub mod session_store;

#[cfg(test)]
pub mod test_support;
