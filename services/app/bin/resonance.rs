//! Main Entrypoint for the Résonance terminal application
//!
//! This binary is responsible for:
//! 1. Parsing command-line flags and loading configuration from the environment.
//! 2. Initializing logging on stderr, away from the terminal view.
//! 3. Building the Gemini client and the shared services.
//! 4. Running the event loop on stdin/stdout until the user quits.

use anyhow::Context;
use clap::Parser;
use resonance_app::{
    clipboard::SystemClipboard, config::Config, runtime::Runtime, state::AppState,
};
use resonance_core::{
    category::CategoryId, controller::Event, debate::DebateService, gemini::GeminiClient,
    llm_client::GenerationClient, topic_service::LlmTopicService,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

/// Résonance: conversation topics and a debate partner
#[derive(Parser, Debug)]
#[command(name = "resonance")]
#[command(version)]
struct Cli {
    /// Start on the category list
    #[arg(long)]
    skip_welcome: bool,

    /// Open a category directly (history, complex, love, tense, random)
    #[arg(short, long)]
    category: Option<CategoryId>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded. Initializing services...");

    // --- 3. Initialize Shared Services ---
    let client: Arc<dyn GenerationClient> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.api_base.clone(),
        config.request_timeout,
    )?);
    let state = AppState {
        topic_service: Arc::new(LlmTopicService::new(client.clone(), config.topic_models())),
        debate: Arc::new(DebateService::new(client, config.chat_model.clone())),
        clipboard: Arc::new(SystemClipboard::default()),
    };
    info!(
        swift_model = %config.swift_model,
        deep_model = %config.deep_model,
        chat_model = %config.chat_model,
        "Services configured. Starting session..."
    );

    // --- 4. Run ---
    let mut runtime = Runtime::new(state);
    if cli.skip_welcome || cli.category.is_some() {
        runtime.dispatch(Event::Acknowledge);
    }
    if let Some(category) = cli.category {
        runtime.dispatch(Event::SelectCategory(category));
    }

    runtime
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
