//! The event loop.
//!
//! Owns the [`Controller`] and executes the commands it issues. Remote calls
//! and clipboard access run as spawned tasks; their completions come back
//! through a channel and are applied as events, in arrival order, on the
//! same loop as user input.

use crate::{
    input::{self, Action},
    state::AppState,
    view,
};
use anyhow::{Context, Result};
use resonance_core::{
    Command,
    controller::{Controller, Event},
    message::ChatMessage,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{Instrument, info, info_span, warn};

const UNKNOWN_INPUT: &str = "Commande inconnue.";

pub struct Runtime {
    controller: Controller,
    state: AppState,
    completions_tx: mpsc::UnboundedSender<Event>,
    completions_rx: mpsc::UnboundedReceiver<Event>,
}

/// Runs one command to completion and returns the event reporting it.
async fn execute(state: AppState, command: Command) -> Option<Event> {
    match command {
        Command::GenerateTopic { request, category } => {
            let result = state
                .topic_service
                .generate_topic(category, category.config().prompt_topic)
                .await;
            Some(Event::TopicGenerated { request, result })
        }
        Command::OpenDebate(session) => {
            state.debate.open(&session).await;
            Some(Event::DebateOpened {
                session: session.id(),
            })
        }
        Command::SendChat { session, text } => {
            let result = state.debate.send_message(&session, &text).await;
            Some(Event::ChatReplied {
                session: session.id(),
                result,
            })
        }
        Command::CopyToClipboard(text) => {
            let result = state.clipboard.copy(&text).await.map_err(|e| {
                warn!(error = ?e, "Clipboard export failed");
                e.to_string()
            });
            Some(Event::CopyFinished(result))
        }
        Command::Notify(_) => None,
    }
}

enum Step {
    Read(usize),
    Completion(Event),
}

/// Takes the pending line out of `buf`. Undecodable bytes become U+FFFD.
fn take_line(buf: &mut Vec<u8>) -> String {
    let line = String::from_utf8_lossy(buf)
        .trim_end_matches(['\n', '\r'])
        .to_string();
    buf.clear();
    line
}

impl Runtime {
    pub fn new(state: AppState) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            controller: Controller::new(state.debate.clone()),
            state,
            completions_tx,
            completions_rx,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Applies an event, starts the work it requests and returns the
    /// notifications to show.
    pub fn dispatch(&mut self, event: Event) -> Vec<String> {
        let mut notices = Vec::new();
        for command in self.controller.handle(event) {
            match command {
                Command::Notify(text) => notices.push(text),
                command => self.spawn(command),
            }
        }
        notices
    }

    fn spawn(&self, command: Command) {
        let state = self.state.clone();
        let completions = self.completions_tx.clone();
        let span = info_span!("command", kind = command_kind(&command));
        tokio::spawn(
            async move {
                if let Some(event) = execute(state, command).await {
                    // The receiver lives as long as the runtime.
                    let _ = completions.send(event);
                }
            }
            .instrument(span),
        );
    }

    /// Waits for the next completed command.
    pub async fn next_completion(&mut self) -> Option<Event> {
        self.completions_rx.recv().await
    }

    async fn transcript(&self) -> Vec<ChatMessage> {
        match self.controller.chat() {
            Some(chat) => chat.session.transcript().await,
            None => Vec::new(),
        }
    }

    async fn render<W: AsyncWrite + Unpin>(&self, output: &mut W, notices: &[String]) -> Result<()> {
        let transcript = self.transcript().await;
        let frame = view::render(self.controller.screen(), &transcript, notices);
        output
            .write_all(format!("\n{}", frame).as_bytes())
            .await
            .context("Failed to write frame")?;
        output.flush().await.context("Failed to flush output")
    }

    /// Reads commands from `reader` and renders to `output` until the user
    /// quits or the input is closed.
    pub async fn run<R, W>(mut self, mut reader: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Partial reads stay in `buf` when a completion wins the select.
        let mut buf = Vec::new();
        self.render(&mut output, &[]).await?;

        loop {
            let step = tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    Step::Read(read.context("Failed to read input")?)
                }
                Some(event) = self.completions_rx.recv() => Step::Completion(event),
            };

            let notices = match step {
                Step::Read(0) if buf.is_empty() => {
                    info!("Input closed");
                    break;
                }
                Step::Read(_) => match input::parse(self.controller.screen(), &take_line(&mut buf)) {
                    Action::Quit => break,
                    Action::Event(event) => self.dispatch(event),
                    Action::Unknown(_) => vec![UNKNOWN_INPUT.to_string()],
                },
                Step::Completion(event) => self.dispatch(event),
            };
            self.render(&mut output, &notices).await?;
        }

        info!("Session ended");
        Ok(())
    }
}

fn command_kind(command: &Command) -> &'static str {
    match command {
        Command::GenerateTopic { .. } => "generate_topic",
        Command::OpenDebate(_) => "open_debate",
        Command::SendChat { .. } => "send_chat",
        Command::CopyToClipboard(_) => "copy",
        Command::Notify(_) => "notify",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MockClipboard;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use resonance_core::{
        category::CategoryId,
        controller::{ChatStatus, Phase, Screen},
        debate::DebateService,
        error::GenerationError,
        llm_client::{ChatSession, GenerationClient, GenerationConfig, GenerationResponse},
        message::MessageRole,
        topic::Topic,
        topic_service::TopicService,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers topics from a queue, each after its own delay.
    struct QueuedTopics {
        answers: Mutex<Vec<(Duration, Result<String, GenerationError>)>>,
    }

    impl QueuedTopics {
        fn new(answers: Vec<(Duration, Result<String, GenerationError>)>) -> Self {
            Self {
                answers: Mutex::new(answers),
            }
        }
    }

    #[async_trait]
    impl TopicService for QueuedTopics {
        async fn generate_topic(
            &self,
            category: CategoryId,
            _prompt_topic: &str,
        ) -> Result<Topic, GenerationError> {
            let (delay, answer) = self.answers.lock().unwrap().remove(0);
            tokio::time::sleep(delay).await;
            answer.map(|text| Topic::new(category, text, vec![]))
        }
    }

    /// Chat client that echoes every message.
    struct EchoClient;

    struct EchoChat;

    #[async_trait]
    impl ChatSession for EchoChat {
        async fn send_message(&mut self, text: &str) -> anyhow::Result<GenerationResponse> {
            Ok(GenerationResponse::text(format!("écho: {}", text)))
        }
    }

    #[async_trait]
    impl GenerationClient for EchoClient {
        async fn generate_content(
            &self,
            _model: &str,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> anyhow::Result<GenerationResponse> {
            Err(anyhow!("not used"))
        }

        fn start_chat(&self, _model: &str, _config: GenerationConfig) -> Box<dyn ChatSession> {
            Box::new(EchoChat)
        }
    }

    fn runtime(topics: QueuedTopics, clipboard: MockClipboard) -> Runtime {
        Runtime::new(AppState {
            topic_service: Arc::new(topics),
            debate: Arc::new(DebateService::new(Arc::new(EchoClient), "chat")),
            clipboard: Arc::new(clipboard),
        })
    }

    async fn settle(runtime: &mut Runtime) -> Vec<String> {
        let event = runtime.next_completion().await.unwrap();
        runtime.dispatch(event)
    }

    #[tokio::test]
    async fn test_generation_completes_through_channel() {
        let mut runtime = runtime(
            QueuedTopics::new(vec![(Duration::ZERO, Ok("Un sujet".to_string()))]),
            MockClipboard::new(),
        );
        runtime.dispatch(Event::Acknowledge);
        runtime.dispatch(Event::SelectCategory(CategoryId::Complex));
        runtime.dispatch(Event::Generate);
        settle(&mut runtime).await;

        let topic = runtime.controller().topic().unwrap();
        assert_eq!(topic.content, "Un sujet");
        assert_eq!(topic.category, CategoryId::Complex);
    }

    #[tokio::test]
    async fn test_stale_generation_after_back_is_discarded() {
        let mut runtime = runtime(
            QueuedTopics::new(vec![(Duration::from_millis(20), Ok("Trop tard".to_string()))]),
            MockClipboard::new(),
        );
        runtime.dispatch(Event::Acknowledge);
        runtime.dispatch(Event::SelectCategory(CategoryId::History));
        runtime.dispatch(Event::Generate);
        runtime.dispatch(Event::Back);

        settle(&mut runtime).await;
        assert!(matches!(runtime.controller().screen(), Screen::Home));
    }

    #[tokio::test]
    async fn test_only_latest_regeneration_is_shown() {
        let mut runtime = runtime(
            QueuedTopics::new(vec![
                (Duration::from_millis(30), Ok("premier".to_string())),
                (Duration::ZERO, Err(GenerationError::unavailable())),
                (Duration::ZERO, Ok("second".to_string())),
            ]),
            MockClipboard::new(),
        );
        runtime.dispatch(Event::Acknowledge);
        runtime.dispatch(Event::SelectCategory(CategoryId::Random));
        runtime.dispatch(Event::Generate);
        runtime.dispatch(Event::Back);
        runtime.dispatch(Event::SelectCategory(CategoryId::Random));
        runtime.dispatch(Event::Generate);
        settle(&mut runtime).await;
        assert!(matches!(
            runtime.controller().screen(),
            Screen::Category {
                phase: Phase::Error(_),
                ..
            }
        ));

        runtime.dispatch(Event::Generate);
        settle(&mut runtime).await;
        // The slow first request lands last and is dropped.
        settle(&mut runtime).await;
        assert_eq!(runtime.controller().topic().unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_debate_round_trip() {
        let mut runtime = runtime(
            QueuedTopics::new(vec![(Duration::ZERO, Ok("Le libre arbitre".to_string()))]),
            MockClipboard::new(),
        );
        runtime.dispatch(Event::Acknowledge);
        runtime.dispatch(Event::SelectCategory(CategoryId::Complex));
        runtime.dispatch(Event::Generate);
        settle(&mut runtime).await;

        runtime.dispatch(Event::OpenChat);
        settle(&mut runtime).await;
        runtime.dispatch(Event::SendChat("Pourquoi ?".to_string()));
        settle(&mut runtime).await;

        let chat = runtime.controller().chat().unwrap();
        assert_eq!(chat.status, ChatStatus::Ready);
        let transcript = chat.session.transcript().await;
        let roles: Vec<MessageRole> = transcript.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::Assistant, MessageRole::User, MessageRole::Assistant]
        );
        assert_eq!(transcript[2].text, "écho: Pourquoi ?");
    }

    #[tokio::test]
    async fn test_copy_reports_notice() {
        let mut clipboard = MockClipboard::new();
        clipboard
            .expect_copy()
            .withf(|text| text.to_string() == "À copier")
            .times(1)
            .returning(|_| Ok(()));
        let mut runtime = runtime(
            QueuedTopics::new(vec![(Duration::ZERO, Ok("À copier".to_string()))]),
            clipboard,
        );
        runtime.dispatch(Event::Acknowledge);
        runtime.dispatch(Event::SelectCategory(CategoryId::Love));
        runtime.dispatch(Event::Generate);
        settle(&mut runtime).await;

        runtime.dispatch(Event::Copy);
        let notices = settle(&mut runtime).await;
        assert_eq!(notices, vec!["Sujet copié dans le presse-papier !".to_string()]);
    }

    #[tokio::test]
    async fn test_run_until_quit() {
        let runtime = runtime(
            QueuedTopics::new(vec![(Duration::ZERO, Ok("Sujet final".to_string()))]),
            MockClipboard::new(),
        );
        let input: &[u8] = b"\n2\nxyz\nq\n";
        let mut output = Vec::new();
        runtime.run(input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Choisissez un thème"));
        assert!(output.contains("Sujets Complexes"));
        assert!(output.contains(UNKNOWN_INPUT));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_not_fatal() {
        let runtime = runtime(QueuedTopics::new(vec![]), MockClipboard::new());
        let input: &[u8] = b"\n\xff\xfe\n1\nq\n";
        let mut output = Vec::new();
        runtime.run(input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains(UNKNOWN_INPUT));
        assert!(output.contains("Prêt à explorer un nouveau sujet ?"));
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_read() {
        let runtime = runtime(QueuedTopics::new(vec![]), MockClipboard::new());
        let input: &[u8] = b"\n3";
        let mut output = Vec::new();
        runtime.run(input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Prêt à explorer un nouveau sujet ?"));
    }

    #[test]
    fn test_take_line_strips_terminator_and_replaces_bad_bytes() {
        let mut buf = b"caf\xe9\r\n".to_vec();
        assert_eq!(take_line(&mut buf), "caf\u{FFFD}");
        assert!(buf.is_empty());
    }
}
