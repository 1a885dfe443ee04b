//! Gemini REST client.
//!
//! Implements [`GenerationClient`] over the `generateContent` endpoint of the
//! Generative Language API. Chat sessions keep their history on the client
//! side and resend it with every turn.

use crate::llm_client::{
    ChatSession, GenerationClient, GenerationConfig, GenerationResponse, GroundingCitation,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// --- Local Gemini REST Types ---
mod gemini_types {
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerateContentRequest<'a> {
        pub contents: &'a [Content],
        #[serde(skip_serializing_if = "Option::is_none")]
        pub system_instruction: Option<Content>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub tools: Vec<Tool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub generation_config: Option<GenerationConfig>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default)]
    pub(super) struct Content {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub role: Option<String>,
        #[serde(default)]
        pub parts: Vec<Part>,
    }

    impl Content {
        pub fn text(role: Option<&str>, text: &str) -> Self {
            Self {
                role: role.map(str::to_string),
                parts: vec![Part {
                    text: Some(text.to_string()),
                    ..Default::default()
                }],
            }
        }
    }

    /// A content part. Unknown fields (thought signatures, inline data) are
    /// kept so model turns can be sent back verbatim.
    #[derive(Serialize, Deserialize, Debug, Clone, Default)]
    pub(super) struct Part {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub thought: Option<bool>,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct Tool {
        pub google_search: GoogleSearch,
    }

    #[derive(Serialize, Debug)]
    pub(super) struct GoogleSearch {}

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerationConfig {
        pub thinking_config: ThinkingConfig,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct ThinkingConfig {
        pub thinking_budget: u32,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerateContentResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct Candidate {
        pub content: Option<Content>,
        pub grounding_metadata: Option<GroundingMetadata>,
        pub finish_reason: Option<String>,
    }

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GroundingMetadata {
        #[serde(default)]
        pub grounding_chunks: Vec<GroundingChunk>,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct GroundingChunk {
        pub web: Option<WebChunk>,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct WebChunk {
        pub uri: Option<String>,
        pub title: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct ApiErrorBody {
        pub error: ApiError,
    }

    #[derive(Deserialize, Debug)]
    pub(super) struct ApiError {
        pub code: Option<u16>,
        pub message: String,
        pub status: Option<String>,
    }
}

use gemini_types::{Content, GenerateContentRequest, GenerateContentResponse};

/// An implementation of `GenerationClient` for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    api_base: String,
}

impl GeminiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The Generative Language API key.
    /// * `api_base` - Base URL up to and including the API version.
    /// * `timeout` - Upper bound for a single request.
    pub fn new(api_key: SecretString, api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    /// Posts one `generateContent` request and returns the first candidate.
    async fn post(
        &self,
        model: &str,
        contents: &[Content],
        config: &GenerationConfig,
    ) -> Result<gemini_types::Candidate> {
        let body = build_request(contents, config);
        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Failed to reach the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<gemini_types::ApiErrorBody>(&raw) {
                Ok(body) => anyhow!(
                    "Gemini API error {} ({}): {}",
                    body.error.code.unwrap_or(status.as_u16()),
                    body.error.status.unwrap_or_default(),
                    body.error.message
                ),
                Err(_) => anyhow!("Gemini API returned HTTP {}: {}", status, raw),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Malformed Gemini response")?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .context("No candidate in Gemini response")?;
        debug!(finish_reason = ?candidate.finish_reason, "Gemini candidate received");
        Ok(candidate)
    }
}

fn build_request<'a>(contents: &'a [Content], config: &GenerationConfig) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents,
        system_instruction: config
            .system_instruction
            .as_deref()
            .map(|text| Content::text(None, text)),
        tools: if config.google_search {
            vec![gemini_types::Tool {
                google_search: gemini_types::GoogleSearch {},
            }]
        } else {
            vec![]
        },
        generation_config: config
            .thinking_budget
            .map(|thinking_budget| gemini_types::GenerationConfig {
                thinking_config: gemini_types::ThinkingConfig { thinking_budget },
            }),
    }
}

/// Converts a candidate into the provider-neutral response.
///
/// Text parts are concatenated, thought summaries are skipped.
fn to_response(candidate: &gemini_types::Candidate) -> GenerationResponse {
    let text = candidate.content.as_ref().and_then(|content| {
        let parts: Vec<&str> = content
            .parts
            .iter()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    });
    let grounding: Vec<GroundingCitation> = candidate
        .grounding_metadata
        .as_ref()
        .map(|meta| {
            meta.grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .map(|web| GroundingCitation {
                    uri: web.uri.clone(),
                    title: web.title.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    GenerationResponse { text, grounding }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    #[instrument(skip(self, prompt, config), fields(grounded = config.google_search))]
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResponse> {
        let contents = [Content::text(Some("user"), prompt)];
        let candidate = self.post(model, &contents, config).await?;
        Ok(to_response(&candidate))
    }

    fn start_chat(&self, model: &str, config: GenerationConfig) -> Box<dyn ChatSession> {
        Box::new(GeminiChat {
            client: self.clone(),
            model: model.to_string(),
            config,
            history: Vec::new(),
        })
    }
}

/// A chat session whose history lives on the client.
pub struct GeminiChat {
    client: GeminiClient,
    model: String,
    config: GenerationConfig,
    history: Vec<Content>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    #[instrument(skip_all, fields(model = %self.model, turns = self.history.len()))]
    async fn send_message(&mut self, text: &str) -> Result<GenerationResponse> {
        let mut contents = self.history.clone();
        contents.push(Content::text(Some("user"), text));

        let candidate = self.client.post(&self.model, &contents, &self.config).await?;
        let response = to_response(&candidate);
        self.commit(contents, candidate.content);
        Ok(response)
    }
}

impl GeminiChat {
    /// Records a completed exchange.
    ///
    /// History only grows on a usable reply: a failed or empty turn leaves it
    /// untouched so the user message can be resent.
    fn commit(&mut self, contents: Vec<Content>, reply: Option<Content>) {
        match reply {
            Some(mut content) if !is_empty_turn(&content) => {
                content.role = Some("model".to_string());
                self.history = contents;
                self.history.push(content);
            }
            _ => warn!("Gemini returned an empty chat turn, history left unchanged"),
        }
    }
}

fn is_empty_turn(content: &Content) -> bool {
    content
        .parts
        .iter()
        .all(|p| p.text.as_deref().is_none_or(str::is_empty) && p.extra.is_empty())
}
