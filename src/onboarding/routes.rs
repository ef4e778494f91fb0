//! HTTP transport: messaging webhook and health check.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::manager::IntakeManager;

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub manager: Arc<IntakeManager>,
}

/// Form body posted by the messaging provider.
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// POST /webhook
///
/// Runs one message through the intake manager and answers with a TwiML
/// document carrying the reply. Requests without a sender are rejected.
async fn webhook(
    State(state): State<IntakeRouteState>,
    Form(form): Form<WebhookForm>,
) -> Response {
    let from = form.from.trim();
    if from.is_empty() {
        tracing::warn!("Rejected webhook request without a sender");
        return (StatusCode::BAD_REQUEST, "missing From").into_response();
    }

    let body = form.body.trim();
    tracing::info!(from, chars = body.chars().count(), "Inbound message");

    let reply = state.manager.handle_message(from, body).await;
    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml_message(&reply),
    )
        .into_response()
}

/// GET /health
async fn health(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    let knowledge = state.manager.knowledge();
    Json(serde_json::json!({
        "status": "healthy",
        "pdf_loaded": knowledge.is_ready(),
        "chunks": knowledge.len(),
    }))
}

/// Wrap reply text in a TwiML messaging response.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(text)
    )
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Build the intake routes.
pub fn intake_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
