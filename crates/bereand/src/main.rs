//! Berean Daemon - Scripture research service
//!
//! Given a scripture reference, runs a sequential crew of persona agents
//! (linguist, historian, journalist) backed by an LLM and external search
//! tools, and delivers the researched article inline or by email.

use anyhow::{Context, Result};
use bereand::config::{Config, Secrets};
use bereand::llm::GeminiClient;
use bereand::mailer::SmtpMailer;
use bereand::orchestrator::LlmAgentRunner;
use bereand::search::SearchClient;
use bereand::server::{self, AppState};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Berean Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let secrets = Secrets::from_env().context("missing mandatory configuration")?;

    let llm = GeminiClient::new(secrets.gemini_api_key.clone(), &config.llm);
    let search = SearchClient::new(secrets.serper_api_key.clone(), &config.search);
    let runner = LlmAgentRunner::new(llm, search, config.chain.max_tool_iterations);
    let mailer = SmtpMailer::new(&secrets.smtp)?;

    info!(
        "Model: {}, chain budget: {}s",
        config.llm.model, config.chain.total_budget_secs
    );

    let state = AppState::new(config, Arc::new(runner), Arc::new(mailer));
    server::run(state).await
}
