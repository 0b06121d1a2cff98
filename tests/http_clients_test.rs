mod helpers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use focuslock::config::{Credentials, DeliveryConfig, ModelConfig};
use focuslock::cycle::run_cycle;
use focuslock::error::{DeliveryError, ModelError};
use focuslock::model::{LanguageModel, OllamaModel};
use focuslock::notify::{Notifier, TelegramNotifier};
use focuslock::prompt::DomainSelector;
use helpers::{empty_log, history_path, serve, FakeModel, SAMPLE_IDEA};
use serde_json::{json, Value};
use tempfile::TempDir;

const TOKEN: &str = "TESTTOKEN";
const SEND_PATH: &str = "/botTESTTOKEN/sendMessage";

type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

fn credentials() -> Credentials {
    Credentials {
        token: TOKEN.into(),
        chat_id: "424242".into(),
    }
}

fn delivery_config(api_base: &str, timeout_secs: u64) -> DeliveryConfig {
    DeliveryConfig {
        api_base: api_base.into(),
        timeout_secs,
        ..DeliveryConfig::default()
    }
}

async fn accepting_telegram() -> (String, Captured) {
    let captured: Captured = Arc::default();
    let router = Router::new()
        .route(
            SEND_PATH,
            post(
                |State(seen): State<Captured>, Form(form): Form<HashMap<String, String>>| async move {
                    seen.lock().unwrap().push(form);
                    Json(json!({"ok": true, "result": {"message_id": 77}}))
                },
            ),
        )
        .with_state(Arc::clone(&captured));
    (serve(router).await, captured)
}

#[tokio::test]
async fn telegram_posts_form_and_parses_ack() {
    let (base, captured) = accepting_telegram().await;
    let notifier = TelegramNotifier::new(&delivery_config(&base, 5), &credentials()).unwrap();

    let ack = notifier.notify("*hello*").await.unwrap();
    assert_eq!(ack.status, 200);
    assert_eq!(ack.message_id, Some(77));

    let seen = captured.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["chat_id"], "424242");
    assert_eq!(seen[0]["text"], "*hello*");
    assert_eq!(seen[0]["parse_mode"], "Markdown");
    assert_eq!(seen[0]["disable_web_page_preview"], "true");
}

#[tokio::test]
async fn telegram_non_2xx_is_rejected_with_description() {
    let router = Router::new().route(
        SEND_PATH,
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: chat not found"})),
            )
        }),
    );
    let base = serve(router).await;
    let notifier = TelegramNotifier::new(&delivery_config(&base, 5), &credentials()).unwrap();

    match notifier.notify("hi").await {
        Err(DeliveryError::Rejected { status, description }) => {
            assert_eq!(status, 400);
            assert_eq!(description, "Bad Request: chat not found");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn telegram_timeout_is_reported_without_token() {
    let router = Router::new().route(
        SEND_PATH,
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"ok": true}))
        }),
    );
    let base = serve(router).await;
    let notifier = TelegramNotifier::new(&delivery_config(&base, 1), &credentials()).unwrap();

    let err = notifier.notify("hi").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Timeout(1)));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn unreachable_telegram_does_not_stop_the_cycle() {
    // Nothing listens on this port once the listener is dropped.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let tmp = TempDir::new().unwrap();
    let mut log = empty_log(&tmp);
    let notifier = TelegramNotifier::new(&delivery_config(&base, 2), &credentials()).unwrap();
    let model = FakeModel::replying(SAMPLE_IDEA);

    let report = run_cycle(&mut log, &model, &notifier, &mut DomainSelector::seeded(5), 5)
        .await
        .unwrap();
    assert!(!report.delivered());
    assert!(history_path(&tmp).exists());
}

/// Reads one HTTP request, then answers 200 with a body shorter than its
/// declared Content-Length and hangs up.
async fn truncated_ok_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let declared = text
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + declared {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"ok\":true")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn telegram_success_status_wins_over_unreadable_body() {
    let base = truncated_ok_server().await;
    let notifier = TelegramNotifier::new(&delivery_config(&base, 5), &credentials()).unwrap();

    let ack = notifier.notify("hi").await.unwrap();
    assert_eq!(ack.status, 200);
    assert_eq!(ack.message_id, None);
}

fn model_config(endpoint: &str) -> ModelConfig {
    ModelConfig {
        endpoint: endpoint.into(),
        name: "phi3:mini".into(),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn ollama_returns_response_verbatim() {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let router = Router::new()
        .route(
            "/api/generate",
            post(
                |State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({"model": "phi3:mini", "response": SAMPLE_IDEA, "done": true}))
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let base = serve(router).await;

    let model = OllamaModel::new(&model_config(&format!("{base}/"))).unwrap();
    let idea = model.complete("suggest something").await.unwrap();
    assert_eq!(idea, SAMPLE_IDEA);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["model"], "phi3:mini");
    assert_eq!(seen[0]["prompt"], "suggest something");
    assert_eq!(seen[0]["stream"], false);
}

#[tokio::test]
async fn ollama_error_status_is_surfaced() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, "model 'phi3:mini' not found") }),
    );
    let base = serve(router).await;

    let model = OllamaModel::new(&model_config(&base)).unwrap();
    match model.complete("x").await {
        Err(ModelError::Status { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_blank_completion_fails_loud() {
    let router = Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({"response": "  \n"})) }),
    );
    let base = serve(router).await;

    let model = OllamaModel::new(&model_config(&base)).unwrap();
    let err = model.complete("x").await.unwrap_err();
    assert!(matches!(err, ModelError::EmptyResponse));
}

#[tokio::test]
async fn end_to_end_cycle_against_stub_services() {
    let (telegram, captured) = accepting_telegram().await;
    let ollama = serve(Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({"response": SAMPLE_IDEA})) }),
    ))
    .await;

    let tmp = TempDir::new().unwrap();
    let mut log = empty_log(&tmp);
    let model = OllamaModel::new(&model_config(&ollama)).unwrap();
    let notifier = TelegramNotifier::new(&delivery_config(&telegram, 5), &credentials()).unwrap();

    let report = run_cycle(&mut log, &model, &notifier, &mut DomainSelector::seeded(0), 5)
        .await
        .unwrap();

    assert!(report.delivered());
    assert_eq!(report.ack.as_ref().unwrap().message_id, Some(77));
    assert!(captured.lock().unwrap()[0]["text"].contains("Project: ChamaBot"));
    assert!(log.entries()[0].as_str().starts_with("Suggested ChamaBot"));
}
