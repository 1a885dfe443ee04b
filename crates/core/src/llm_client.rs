use anyhow::Result;
use async_trait::async_trait;

/// Options recognized by a generation call or a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Enables the web-search grounding tool.
    pub google_search: bool,
    /// Internal reasoning budget, in tokens.
    pub thinking_budget: Option<u32>,
    /// Directive bound to every turn of the request or session.
    pub system_instruction: Option<String>,
}

/// A raw citation as returned by the provider, before any filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingCitation {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Provider-neutral result of a generation call or a chat turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Concatenated answer text. `None` when the provider returned no text part.
    pub text: Option<String>,
    /// Citations from the grounding metadata, in response order.
    pub grounding: Vec<GroundingCitation>,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            grounding: Vec::new(),
        }
    }

    /// The answer text, or `None` if it is missing or blank.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A stateful conversation with a remote model.
///
/// The session remembers previous turns; callers must not interleave sends.
#[async_trait]
pub trait ChatSession: Send {
    async fn send_message(&mut self, text: &str) -> Result<GenerationResponse>;
}

/// A generic client for a remote content-generation API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Makes a single, stateless generation call.
    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResponse>;

    /// Starts a new chat session. No request is made until the first message.
    fn start_chat(&self, model: &str, config: GenerationConfig) -> Box<dyn ChatSession>;
}
