//! Topic Generation Service
//!
//! This module turns a category into a discussion topic. It picks the model
//! and configuration for the category, issues a single generation request, and
//! normalizes whatever comes back into a [`Topic`].

use crate::{
    category::{CategoryId, GenerationStrategy},
    error::GenerationError,
    llm_client::{GenerationClient, GenerationConfig, GenerationResponse},
    topic::{DEFAULT_SOURCE_TITLE, GroundingSource, Topic},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub const DEFAULT_SWIFT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_DELIBERATE_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_THINKING_BUDGET: u32 = 32768;

/// Defines the contract for any service that can generate a topic.
#[async_trait]
pub trait TopicService: Send + Sync {
    /// Generates a fresh topic for a category.
    ///
    /// # Arguments
    ///
    /// * `category` - The category the topic belongs to; it selects the strategy.
    /// * `prompt_topic` - The domain fragment substituted into the template.
    async fn generate_topic(
        &self,
        category: CategoryId,
        prompt_topic: &str,
    ) -> Result<Topic, GenerationError>;
}

/// Model identifiers for the two generation strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicModels {
    pub swift: String,
    pub deliberate: String,
    /// Reasoning budget given to the deliberate model. Must be non-zero.
    pub thinking_budget: u32,
}

impl Default for TopicModels {
    fn default() -> Self {
        Self {
            swift: DEFAULT_SWIFT_MODEL.to_string(),
            deliberate: DEFAULT_DELIBERATE_MODEL.to_string(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }
}

impl TopicModels {
    /// Resolves a strategy to a model identifier and request configuration.
    pub fn resolve(&self, strategy: GenerationStrategy) -> (&str, GenerationConfig) {
        match strategy {
            GenerationStrategy::Swift { search_grounding } => (
                self.swift.as_str(),
                GenerationConfig {
                    google_search: search_grounding,
                    ..Default::default()
                },
            ),
            GenerationStrategy::Deliberate => (
                self.deliberate.as_str(),
                GenerationConfig {
                    thinking_budget: Some(self.thinking_budget),
                    ..Default::default()
                },
            ),
        }
    }
}

/// Builds the generation instruction for a topic domain.
pub fn build_prompt(prompt_topic: &str) -> String {
    format!(
        "Génère un sujet de conversation engageant, profond et nuancé sur : {prompt_topic}.

Le résultat doit être formaté ainsi :
1. Un titre accrocheur.
2. Une brève mise en contexte ou une anecdote (1-2 phrases).
3. Une question ouverte principale pour lancer le débat.
4. Deux sous-questions pour approfondir.

Réponds directement en Français. Sois créatif et évite les clichés."
    )
}

/// Keeps the citations that carry a usable URI, in response order.
fn extract_sources(response: &GenerationResponse) -> Vec<GroundingSource> {
    response
        .grounding
        .iter()
        .filter_map(|citation| {
            let uri = citation.uri.as_deref()?.trim();
            if uri.is_empty() {
                return None;
            }
            let title = citation
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_SOURCE_TITLE);
            Some(GroundingSource {
                title: Some(title.to_string()),
                uri: uri.to_string(),
            })
        })
        .collect()
}

/// An implementation of `TopicService` backed by a remote generation API.
pub struct LlmTopicService {
    client: Arc<dyn GenerationClient>,
    models: TopicModels,
}

impl LlmTopicService {
    pub fn new(client: Arc<dyn GenerationClient>, models: TopicModels) -> Self {
        Self { client, models }
    }
}

#[async_trait]
impl TopicService for LlmTopicService {
    #[instrument(skip(self, prompt_topic), fields(model = tracing::field::Empty))]
    async fn generate_topic(
        &self,
        category: CategoryId,
        prompt_topic: &str,
    ) -> Result<Topic, GenerationError> {
        let strategy = category.strategy();
        let (model, config) = self.models.resolve(strategy);
        tracing::Span::current().record("model", model);

        let prompt = build_prompt(prompt_topic);
        let response = self
            .client
            .generate_content(model, &prompt, &config)
            .await
            .map_err(|e| {
                error!(error = ?e, "Topic generation failed");
                GenerationError::unavailable()
            })?;

        let content = match response.non_empty_text() {
            Some(text) => text.to_string(),
            None => {
                info!("Model returned no text, using fallback");
                strategy.fallback_text().to_string()
            }
        };
        let sources = if config.google_search {
            extract_sources(&response)
        } else {
            Vec::new()
        };

        let topic = Topic::new(category, content, sources);
        info!(topic_id = %topic.id, sources = topic.sources.len(), "Topic generated");
        Ok(topic)
    }
}
