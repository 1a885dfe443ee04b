//! Application State Controller
//!
//! A single-owner state machine over the screens of the application. User
//! actions and remote completions both arrive as [`Event`]s; side effects
//! leave as [`Command`]s for the runtime to execute. Completions carry the
//! identifier of the request or session that produced them and are dropped
//! when the state has moved on.

use crate::{
    Command,
    category::CategoryId,
    debate::{DebateService, DebateSession},
    error::{ChatError, GenerationError},
    message::ChatMessage,
    topic::Topic,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub const COPY_SUCCEEDED: &str = "Sujet copié dans le presse-papier !";
pub const COPY_FAILED: &str = "Impossible de copier le sujet.";

/// Identifies one topic generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs of the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// The user dismissed the welcome screen.
    Acknowledge,
    SelectCategory(CategoryId),
    /// Generate, regenerate or retry, depending on the current phase.
    Generate,
    OpenChat,
    CloseChat,
    Back,
    SendChat(String),
    Copy,
    TopicGenerated {
        request: RequestId,
        result: Result<Topic, GenerationError>,
    },
    /// The opening turn of a session has completed, successfully or not.
    DebateOpened { session: Uuid },
    ChatReplied {
        session: Uuid,
        result: Result<ChatMessage, ChatError>,
    },
    CopyFinished(Result<(), String>),
}

#[derive(Debug, Clone)]
pub enum Screen {
    Welcome,
    Home,
    Category { category: CategoryId, phase: Phase },
}

/// What the active category is showing.
#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    Loading { request: RequestId },
    Result(Topic),
    Error(GenerationError),
    Chat(ChatState),
}

/// An open debate. It always carries the topic it was opened on.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub topic: Topic,
    pub session: DebateSession,
    pub status: ChatStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStatus {
    /// The opening turn is in flight.
    Opening,
    Ready,
    /// A user message is in flight.
    Awaiting,
    /// The last user message failed; it can be sent again.
    Failed(ChatError),
}

impl ChatStatus {
    pub fn is_busy(&self) -> bool {
        matches!(self, ChatStatus::Opening | ChatStatus::Awaiting)
    }
}

pub struct Controller {
    screen: Screen,
    debate: Arc<DebateService>,
    next_request: u64,
}

impl Controller {
    pub fn new(debate: Arc<DebateService>) -> Self {
        Self {
            screen: Screen::Welcome,
            debate,
            next_request: 0,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The topic currently displayed, if any.
    pub fn topic(&self) -> Option<&Topic> {
        match &self.screen {
            Screen::Category {
                phase: Phase::Result(topic),
                ..
            } => Some(topic),
            Screen::Category {
                phase: Phase::Chat(chat),
                ..
            } => Some(&chat.topic),
            _ => None,
        }
    }

    /// The open debate, if any.
    pub fn chat(&self) -> Option<&ChatState> {
        match &self.screen {
            Screen::Category {
                phase: Phase::Chat(chat),
                ..
            } => Some(chat),
            _ => None,
        }
    }

    fn chat_mut(&mut self) -> Option<&mut ChatState> {
        match &mut self.screen {
            Screen::Category {
                phase: Phase::Chat(chat),
                ..
            } => Some(chat),
            _ => None,
        }
    }

    /// Applies one event and returns the side effects to execute.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Acknowledge => {
                if matches!(self.screen, Screen::Welcome) {
                    self.screen = Screen::Home;
                }
                vec![]
            }
            Event::SelectCategory(category) => {
                if matches!(self.screen, Screen::Home) {
                    info!(%category, "Category selected");
                    self.screen = Screen::Category {
                        category,
                        phase: Phase::Idle,
                    };
                } else {
                    debug!(%category, "Ignoring category selection outside home");
                }
                vec![]
            }
            Event::Generate => self.generate(),
            Event::OpenChat => self.open_chat(),
            Event::CloseChat => {
                self.close_chat();
                vec![]
            }
            Event::Back => {
                if !self.close_chat() && matches!(self.screen, Screen::Category { .. }) {
                    self.screen = Screen::Home;
                }
                vec![]
            }
            Event::SendChat(text) => self.send_chat(text),
            Event::Copy => match self.topic() {
                Some(topic) => vec![Command::CopyToClipboard(topic.content.clone())],
                None => vec![],
            },
            Event::TopicGenerated { request, result } => {
                self.apply_topic(request, result);
                vec![]
            }
            Event::DebateOpened { session } => {
                match self.chat_mut() {
                    Some(chat) if chat.session.id() == session => {
                        if chat.status == ChatStatus::Opening {
                            chat.status = ChatStatus::Ready;
                        }
                    }
                    _ => debug!(%session, "Discarding opening turn of a closed session"),
                }
                vec![]
            }
            Event::ChatReplied { session, result } => {
                match self.chat_mut() {
                    Some(chat)
                        if chat.session.id() == session && chat.status == ChatStatus::Awaiting =>
                    {
                        chat.status = match result {
                            Ok(_) => ChatStatus::Ready,
                            Err(e) => ChatStatus::Failed(e),
                        };
                    }
                    _ => debug!(%session, "Discarding reply for a closed session"),
                }
                vec![]
            }
            Event::CopyFinished(result) => {
                let notice = match result {
                    Ok(()) => COPY_SUCCEEDED,
                    Err(_) => COPY_FAILED,
                };
                vec![Command::Notify(notice.to_string())]
            }
        }
    }

    fn generate(&mut self) -> Vec<Command> {
        let category = match &self.screen {
            Screen::Category { phase, category } if !matches!(phase, Phase::Loading { .. }) => {
                *category
            }
            _ => {
                debug!("Ignoring generate request");
                return vec![];
            }
        };

        self.next_request += 1;
        let request = RequestId(self.next_request);
        // Replacing the phase drops the previous topic, error or debate.
        self.screen = Screen::Category {
            category,
            phase: Phase::Loading { request },
        };
        info!(%category, %request, "Generating topic");
        vec![Command::GenerateTopic { request, category }]
    }

    fn apply_topic(&mut self, request: RequestId, result: Result<Topic, GenerationError>) {
        let is_current = matches!(
            &self.screen,
            Screen::Category { phase: Phase::Loading { request: pending }, .. } if *pending == request
        );
        if !is_current {
            debug!(%request, "Discarding stale topic result");
            return;
        }
        if let Screen::Category { phase, .. } = &mut self.screen {
            *phase = match result {
                Ok(topic) => Phase::Result(topic),
                Err(e) => Phase::Error(e),
            };
        }
    }

    fn open_chat(&mut self) -> Vec<Command> {
        let Screen::Category { phase, .. } = &mut self.screen else {
            return vec![];
        };
        let Phase::Result(topic) = phase else {
            debug!("Ignoring chat request without a topic");
            return vec![];
        };
        let topic = topic.clone();
        let session = self.debate.create_session(&topic.content);
        *phase = Phase::Chat(ChatState {
            topic,
            session: session.clone(),
            status: ChatStatus::Opening,
        });
        vec![Command::OpenDebate(session)]
    }

    /// Returns to the topic if a debate is open. The session is dropped.
    fn close_chat(&mut self) -> bool {
        let Screen::Category { phase, .. } = &mut self.screen else {
            return false;
        };
        if !matches!(phase, Phase::Chat(_)) {
            return false;
        }
        if let Phase::Chat(chat) = std::mem::replace(phase, Phase::Idle) {
            info!(session_id = %chat.session.id(), "Debate closed");
            *phase = Phase::Result(chat.topic);
        }
        true
    }

    fn send_chat(&mut self, text: String) -> Vec<Command> {
        if text.trim().is_empty() {
            return vec![];
        }
        let Some(chat) = self.chat_mut() else {
            return vec![];
        };
        if chat.status.is_busy() {
            debug!(status = ?chat.status, "Previous turn unresolved, not sending");
            return vec![];
        }
        chat.status = ChatStatus::Awaiting;
        vec![Command::SendChat {
            session: chat.session.clone(),
            text,
        }]
    }
}
