//! Debate Chat Service
//!
//! This module implements the conversational partner that debates a generated
//! topic with the user. A [`DebateSession`] pairs an ordered transcript, which
//! is the source of truth for display, with the remote chat capability used to
//! issue the next turn.

use crate::{
    error::ChatError,
    llm_client::{ChatSession, GenerationClient, GenerationConfig},
    message::ChatMessage,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";

/// Framing turn sent right after a session is created. Never shown to the user.
pub const OPENING_PROMPT: &str = "Lance le débat avec une phrase courte et provocante liée au sujet.";
/// First assistant message when the opening turn comes back empty.
pub const OPENING_FALLBACK: &str = "Prêt à débattre ?";
/// Assistant message when a reply comes back empty.
pub const EMPTY_REPLY: &str = "...";

/// Builds the fixed system instruction of a debate about `topic`.
pub fn debate_instruction(topic: &str) -> String {
    format!(
        "Tu es un partenaire de débat intellectuel et bienveillant.
Le sujet de la conversation est le suivant : \"{topic}\".

Ton rôle est de :
1. Challenger les opinions de l'utilisateur de manière constructive.
2. Poser des questions socratiques (qui poussent à la réflexion).
3. Apporter des contre-arguments ou des nuances si l'utilisateur est trop catégorique.
4. Rester concis (maximum 3-4 phrases par réponse) pour fluidifier le chat.
5. Toujours rester respectueux mais stimulant.

Ne fais pas de longs monologues. Invite l'utilisateur à répondre."
    )
}

/// A handle on one debate about one topic.
///
/// Cloning the handle shares the same session. Turns are serialized: a send
/// holds the remote session until its reply has been recorded.
#[derive(Clone)]
pub struct DebateSession {
    id: Uuid,
    topic: Arc<str>,
    remote: Arc<Mutex<Box<dyn ChatSession>>>,
    transcript: Arc<RwLock<Vec<ChatMessage>>>,
}

impl std::fmt::Debug for DebateSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateSession")
            .field("id", &self.id)
            .field("topic_len", &self.topic.len())
            .finish_non_exhaustive()
    }
}

impl DebateSession {
    fn new(topic: &str, remote: Box<dyn ChatSession>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: Arc::from(topic),
            remote: Arc::new(Mutex::new(remote)),
            transcript: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The topic text this session was bound to at creation.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// A snapshot of the transcript, oldest first.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    async fn record(&self, message: ChatMessage) {
        self.transcript.write().await.push(message);
    }
}

/// Creates debate sessions and exchanges messages on them.
pub struct DebateService {
    client: Arc<dyn GenerationClient>,
    model: String,
}

impl DebateService {
    pub fn new(client: Arc<dyn GenerationClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Creates a session bound to `topic`. No request is made yet.
    pub fn create_session(&self, topic: &str) -> DebateSession {
        let config = GenerationConfig {
            system_instruction: Some(debate_instruction(topic)),
            ..Default::default()
        };
        let session = DebateSession::new(topic, self.client.start_chat(&self.model, config));
        info!(session_id = %session.id, model = %self.model, "Debate session created");
        session
    }

    /// Sends the framing turn and records its reply as the first message.
    ///
    /// Failure is not reported: the session simply starts with an empty
    /// transcript.
    #[instrument(skip_all, fields(session_id = %session.id))]
    pub async fn open(&self, session: &DebateSession) -> Option<ChatMessage> {
        let mut remote = session.remote.lock().await;
        match remote.send_message(OPENING_PROMPT).await {
            Ok(response) => {
                let text = response.non_empty_text().unwrap_or(OPENING_FALLBACK);
                let message = ChatMessage::assistant(text);
                session.record(message.clone()).await;
                Some(message)
            }
            Err(e) => {
                warn!(error = ?e, "Opening turn failed, starting with an empty transcript");
                None
            }
        }
    }

    /// Sends a user message and records the assistant's reply.
    ///
    /// The user message is recorded before the request and stays in the
    /// transcript if the request fails.
    #[instrument(skip_all, fields(session_id = %session.id))]
    pub async fn send_message(
        &self,
        session: &DebateSession,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut remote = session.remote.lock().await;
        session.record(ChatMessage::user(text)).await;

        let response = remote.send_message(text).await.map_err(|e| {
            error!(error = ?e, "Debate turn failed");
            ChatError::SendFailed
        })?;

        let reply = ChatMessage::assistant(response.non_empty_text().unwrap_or(EMPTY_REPLY));
        session.record(reply.clone()).await;
        info!("Debate turn completed");
        Ok(reply)
    }
}
