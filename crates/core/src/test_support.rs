//! A scripted generation client shared by the unit tests.

use crate::llm_client::{ChatSession, GenerationClient, GenerationConfig, GenerationResponse};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted remote answer.
#[derive(Debug, Clone)]
pub enum Turn {
    Reply { text: String, delay: Duration },
    Fail,
}

impl Turn {
    pub fn reply(text: &str) -> Self {
        Turn::Reply {
            text: text.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(text: &str, delay: Duration) -> Self {
        Turn::Reply {
            text: text.to_string(),
            delay,
        }
    }
}

#[derive(Default)]
struct Script {
    turns: VecDeque<Turn>,
    sent: Vec<String>,
    started: Vec<(String, GenerationConfig)>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Answers every request, stateless or chat, from one queue of turns.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                turns: turns.into(),
                ..Default::default()
            })),
        }
    }

    /// Texts sent so far, in dispatch order.
    pub fn sent(&self) -> Vec<String> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn started_chats(&self) -> Vec<(String, GenerationConfig)> {
        self.script.lock().unwrap().started.clone()
    }

    /// Highest number of requests that were awaiting an answer at once.
    pub fn max_in_flight(&self) -> usize {
        self.script.lock().unwrap().max_in_flight
    }

    async fn answer(&self, text: &str) -> Result<GenerationResponse> {
        let turn = {
            let mut script = self.script.lock().unwrap();
            script.sent.push(text.to_string());
            script.in_flight += 1;
            script.max_in_flight = script.max_in_flight.max(script.in_flight);
            script.turns.pop_front()
        };
        let result = match turn {
            Some(Turn::Reply { text, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(GenerationResponse::text(text))
            }
            Some(Turn::Fail) => Err(anyhow!("scripted failure")),
            None => Err(anyhow!("script exhausted")),
        };
        self.script.lock().unwrap().in_flight -= 1;
        result
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate_content(
        &self,
        _model: &str,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<GenerationResponse> {
        self.answer(prompt).await
    }

    fn start_chat(&self, model: &str, config: GenerationConfig) -> Box<dyn ChatSession> {
        self.script
            .lock()
            .unwrap()
            .started
            .push((model.to_string(), config));
        Box::new(ScriptedChat {
            client: self.clone(),
        })
    }
}

struct ScriptedChat {
    client: ScriptedClient,
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn send_message(&mut self, text: &str) -> Result<GenerationResponse> {
        self.client.answer(text).await
    }
}
