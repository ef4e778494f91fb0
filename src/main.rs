use std::sync::Arc;

use anyhow::Context;

use intake_assist::answer::AnswerSynthesizer;
use intake_assist::channels::{CliChannel, run_channel};
use intake_assist::config::AppConfig;
use intake_assist::knowledge::{Embedder, KnowledgeBase, create_embedder};
use intake_assist::llm::create_provider;
use intake_assist::onboarding::{IntakeManager, IntakeRouteState, intake_routes};
use intake_assist::schedule::{CalendarClient, GoogleCalendarClient};
use intake_assist::store::{LeadStore, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("Intake Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   Health:  http://0.0.0.0:{}/health", config.port);
    eprintln!("   Document: {}", config.knowledge.document_path.display());

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn LeadStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("failed to open database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Knowledge base ──────────────────────────────────────────────────
    let embedder: Option<Arc<dyn Embedder>> = match config.embedding.as_ref() {
        Some(embedding) => match create_embedder(embedding) {
            Ok(embedder) => Some(embedder),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding client unavailable");
                None
            }
        },
        None => None,
    };
    let knowledge = Arc::new(KnowledgeBase::load(&config.knowledge, embedder).await);
    eprintln!(
        "   Knowledge: {}",
        if knowledge.is_ready() {
            format!("{} chunks", knowledge.len())
        } else {
            "unavailable (degraded mode)".to_string()
        }
    );

    // ── Answering ───────────────────────────────────────────────────────
    let llm = match config.llm.as_ref().map(create_provider).transpose() {
        Ok(llm) => llm,
        Err(e) => {
            tracing::warn!(error = %e, "LLM provider unavailable; using rule-based answers");
            None
        }
    };
    eprintln!(
        "   Generation: {}",
        llm.as_ref()
            .map(|l| l.model_name().to_string())
            .unwrap_or_else(|| "rule-based only".to_string())
    );
    let synthesizer = Arc::new(AnswerSynthesizer::new(llm, &config.answer));

    // ── Calendar ────────────────────────────────────────────────────────
    let calendar: Option<Arc<dyn CalendarClient>> = match config.calendar.as_ref() {
        Some(cal) => match GoogleCalendarClient::new(cal, &config.timezone) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn CalendarClient>),
            Err(e) => {
                tracing::warn!(error = %e, "Calendar client unavailable");
                None
            }
        },
        None => None,
    };
    eprintln!(
        "   Calendar: {}",
        if calendar.is_some() { "enabled" } else { "disabled" }
    );

    let manager = Arc::new(IntakeManager::new(store, knowledge, synthesizer, calendar));

    if config.cli_enabled {
        let cli_manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if let Err(e) = run_channel(Arc::new(CliChannel::new()), cli_manager).await {
                tracing::error!(error = %e, "CLI channel failed");
            }
        });
        eprintln!("   CLI: enabled (type a message and press Enter)");
    }
    eprintln!();

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = intake_routes(IntakeRouteState { manager });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Intake server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
