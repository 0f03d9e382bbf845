// Response composer - Builds the grounding prompt and forwards it to the completion service
use crate::application::completion_service::{complete_or_empty, CompletionService};
use crate::application::context_aggregator::AggregatedContext;
use std::sync::Arc;

/// Returned instead of an empty completion
pub const EMPTY_ANSWER_FALLBACK: &str = "I could not generate an answer right now. Please try again shortly.";

#[derive(Clone)]
pub struct ResponseComposer {
    completion: Arc<dyn CompletionService>,
    persona: String,
    max_sentences: u32,
}

impl ResponseComposer {
    pub fn new(completion: Arc<dyn CompletionService>, persona: String, max_sentences: u32) -> Self {
        Self {
            completion,
            persona,
            max_sentences,
        }
    }

    /// Answer a query that needs no monitoring data
    pub async fn answer_directly(&self, query: &str) -> String {
        let text = complete_or_empty(self.completion.as_ref(), &self.persona, query).await;
        non_empty(text)
    }

    /// Answer a query grounded in the aggregated entity context
    pub async fn compose(&self, query: &str, context: &AggregatedContext) -> String {
        let prompt = self.build_prompt(query, context);
        let text = complete_or_empty(self.completion.as_ref(), &self.persona, &prompt).await;
        tracing::info!(answer = %text, "Grounded answer");
        non_empty(text)
    }

    pub fn build_prompt(&self, query: &str, context: &AggregatedContext) -> String {
        format!(
            "You are an expert at analyzing monitored infrastructure data.\n\
             Below is the user's question, information about a device, its current problems \
             and a list of its metrics with their latest values.\n\
             User Question:\n\
             {query}\n\
             Device Information:\n\
             {device}\n\
             Device Problems:\n\
             {problems}\n\
             Device Metrics (find the metric and value pairs that match the question):\n\
             {metrics}\n\
             Please provide your best answer to the user's question using the relevant metrics and problems above.\n\
             Keep the response within {sentences} sentences.",
            query = query,
            device = context.device_information,
            problems = context.problems,
            metrics = context.metrics,
            sentences = self.max_sentences,
        )
    }
}

fn non_empty(text: String) -> String {
    if text.trim().is_empty() {
        tracing::warn!("Completion service returned no text; using fallback answer");
        EMPTY_ANSWER_FALLBACK.to_string()
    } else {
        text
    }
}
