//! End-to-end tests for the intake HTTP surface.
//!
//! Each test builds the real router over an in-memory libSQL store and drives
//! it in-process with `tower::ServiceExt::oneshot`. Embeddings and
//! generation are stubbed; no network access is needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use intake_assist::answer::{AnswerSynthesizer, NO_CONTEXT_APOLOGY};
use intake_assist::config::{AnswerConfig, KnowledgeConfig};
use intake_assist::error::{CalendarError, KnowledgeError};
use intake_assist::knowledge::{Embedder, KnowledgeBase};
use intake_assist::onboarding::prompts;
use intake_assist::onboarding::{IntakeManager, IntakeRouteState, intake_routes, twiml_message};
use intake_assist::schedule::{CalendarClient, DemoBooking};
use intake_assist::store::{LeadStore, LibSqlBackend};

const SENDER: &str = "whatsapp:+15550001";

/// Chunks point one way, any query mentioning "zebra" points the other.
struct OrthogonalEmbedder;

#[async_trait]
impl Embedder for OrthogonalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, KnowledgeError> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.contains("zebra") {
                    vec![0.0, 1.0]
                } else {
                    vec![1.0, 0.0]
                }
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "orthogonal"
    }
}

#[derive(Default)]
struct RecordingCalendar {
    bookings: Mutex<Vec<DemoBooking>>,
}

#[async_trait]
impl CalendarClient for RecordingCalendar {
    async fn book_demo(&self, booking: &DemoBooking) -> Result<String, CalendarError> {
        self.bookings.lock().unwrap().push(booking.clone());
        Ok("https://calendar.example/event/1".to_string())
    }
}

struct Harness {
    app: Router,
    manager: Arc<IntakeManager>,
    store: Arc<LibSqlBackend>,
    calendar: Arc<RecordingCalendar>,
}

async fn harness(knowledge: KnowledgeBase) -> Harness {
    let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let calendar = Arc::new(RecordingCalendar::default());
    let manager = Arc::new(IntakeManager::new(
        store.clone(),
        Arc::new(knowledge),
        Arc::new(AnswerSynthesizer::new(None, &AnswerConfig::default())),
        Some(calendar.clone() as Arc<dyn CalendarClient>),
    ));
    Harness {
        app: intake_routes(IntakeRouteState {
            manager: manager.clone(),
        }),
        manager,
        store,
        calendar,
    }
}

async fn post_form(app: &Router, fields: &[(&str, &str)]) -> axum::response::Response {
    let form = serde_urlencoded::to_string(fields).unwrap();
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn send(app: &Router, from: &str, body: &str) -> String {
    let response = post_form(app, &[("From", from), ("Body", body)]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/xml"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn health(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn message_text(twiml: &str) -> &str {
    let start = twiml.find("<Message>").unwrap() + "<Message>".len();
    let end = twiml.find("</Message>").unwrap();
    &twiml[start..end]
}

async fn onboard_and_skip(app: &Router) {
    assert_eq!(send(app, SENDER, "hi").await, twiml_message(prompts::WELCOME));
    assert_eq!(send(app, SENDER, "Alice").await, twiml_message(prompts::ASK_EMAIL));
    assert_eq!(send(app, SENDER, "a@x.com").await, twiml_message(prompts::ASK_BUSINESS));
    assert_eq!(send(app, SENDER, "Acme").await, twiml_message(prompts::ASK_DEMO));
    assert_eq!(send(app, SENDER, "no").await, twiml_message(&prompts::demo_skipped()));
}

#[tokio::test]
async fn skipped_demo_persists_partial_lead_without_booking() {
    let h = harness(KnowledgeBase::empty(&KnowledgeConfig::default())).await;
    onboard_and_skip(&h.app).await;

    let leads = h.store.list_leads(10).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].sender, SENDER);
    assert_eq!(leads[0].name, "Alice");
    assert_eq!(leads[0].email, "a@x.com");
    assert_eq!(leads[0].business_name, "Acme");
    assert!(leads[0].demo_date.is_none());
    assert!(leads[0].demo_time.is_none());
    assert!(h.calendar.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_document_reports_unready_and_apologises() {
    let dir = tempfile::tempdir().unwrap();
    let config = KnowledgeConfig {
        document_path: dir.path().join("missing.pdf"),
        ..KnowledgeConfig::default()
    };
    let knowledge = KnowledgeBase::load(&config, Some(Arc::new(OrthogonalEmbedder))).await;
    let h = harness(knowledge).await;

    let status = health(&h.app).await;
    assert_eq!(status["status"], "healthy");
    assert_eq!(status["pdf_loaded"], false);
    assert_eq!(status["chunks"], 0);

    onboard_and_skip(&h.app).await;
    assert_eq!(
        send(&h.app, SENDER, "What is Invock?").await,
        twiml_message(NO_CONTEXT_APOLOGY)
    );
}

#[tokio::test]
async fn low_similarity_still_answers_from_best_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reference.txt");
    let sentence = "Invock is a cloud platform that offers inventory management for distributors. ";
    std::fs::write(&path, sentence.repeat(80)).unwrap();

    let config = KnowledgeConfig {
        document_path: path,
        ..KnowledgeConfig::default()
    };
    let knowledge = KnowledgeBase::load(&config, Some(Arc::new(OrthogonalEmbedder))).await;
    assert!(knowledge.is_ready());
    let h = harness(knowledge).await;

    let status = health(&h.app).await;
    assert_eq!(status["pdf_loaded"], true);
    assert_eq!(status["chunks"], 2);

    onboard_and_skip(&h.app).await;
    let reply = send(&h.app, SENDER, "tell me about zebra crossings").await;
    let text = message_text(&reply);
    assert!(text.starts_with("Based on the PDF content: "), "{text}");
    assert!(text.contains("inventory management"));
}

#[tokio::test]
async fn demo_booking_flow_books_resolved_slot() {
    let h = harness(KnowledgeBase::empty(&KnowledgeConfig::default())).await;
    send(&h.app, SENDER, "hello").await;
    send(&h.app, SENDER, "Bob").await;
    send(&h.app, SENDER, "bob@example.com").await;
    send(&h.app, SENDER, "Builders Ltd").await;

    assert_eq!(send(&h.app, SENDER, "YES").await, twiml_message(prompts::ASK_DATE));
    assert_eq!(send(&h.app, SENDER, "friday").await, twiml_message(prompts::ASK_TIME));
    assert_eq!(
        send(&h.app, SENDER, "2:30 pm").await,
        twiml_message(&prompts::demo_booked(true))
    );

    let leads = h.store.list_leads(10).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].demo_date.as_deref(), Some("friday"));
    assert_eq!(leads[0].demo_time.as_deref(), Some("2:30 pm"));

    let bookings = h.calendar.bookings.lock().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].business_name, "Builders Ltd");
    assert_eq!(bookings[0].start.format("%A %H:%M").to_string(), "Friday 14:30");
}

#[tokio::test]
async fn exit_then_new_message_restarts_intake() {
    let h = harness(KnowledgeBase::empty(&KnowledgeConfig::default())).await;
    onboard_and_skip(&h.app).await;

    assert_eq!(send(&h.app, SENDER, "Bye").await, twiml_message(prompts::GOODBYE));
    assert_eq!(send(&h.app, SENDER, "hi again").await, twiml_message(prompts::WELCOME));
}

#[tokio::test]
async fn senders_do_not_share_sessions() {
    let h = harness(KnowledgeBase::empty(&KnowledgeConfig::default())).await;
    send(&h.app, "user-a", "hi").await;
    send(&h.app, "user-a", "Alice").await;

    assert_eq!(send(&h.app, "user-b", "hi").await, twiml_message(prompts::WELCOME));
    assert_eq!(
        send(&h.app, "user-a", "a@x.com").await,
        twiml_message(prompts::ASK_BUSINESS)
    );
}

#[tokio::test]
async fn webhook_without_sender_is_rejected() {
    let h = harness(KnowledgeBase::empty(&KnowledgeConfig::default())).await;

    let missing = post_form(&h.app, &[("Body", "hi")]).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let blank = post_form(&h.app, &[("From", "  "), ("Body", "hi")]).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    assert_eq!(h.manager.active_sessions(), 0);
}
