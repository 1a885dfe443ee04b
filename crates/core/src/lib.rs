pub mod category;
pub mod controller;
pub mod debate;
pub mod error;
pub mod format;
pub mod gemini;
pub mod llm_client;
pub mod message;
pub mod topic;
pub mod topic_service;

#[cfg(test)]
pub(crate) mod test_support;

use category::CategoryId;
use controller::RequestId;
use debate::DebateSession;

/// Represents commands that the controller issues to an external runtime.
///
/// This enum decouples the state machine's decisions from the execution of
/// side effects (remote calls, clipboard access, notifications). Every remote
/// call is tagged so its completion can be matched against the state that
/// requested it.
#[derive(Debug, Clone)]
pub enum Command {
    /// Generate a topic for the category and report it as `Event::TopicGenerated`.
    GenerateTopic {
        request: RequestId,
        category: CategoryId,
    },
    /// Send the opening turn of a freshly created session.
    OpenDebate(DebateSession),
    /// Send one user message on the session.
    SendChat { session: DebateSession, text: String },
    /// Copy the text to the system clipboard.
    CopyToClipboard(String),
    /// Show a transient notification.
    Notify(String),
}
