//! End-to-end flow against an in-process fake backend:
//! validation, upload, normalization, workflow, chat, export.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use med_interpret_lib::api::transport::{
    ApiRequest, Method, RawResponse, RequestBody, Transport, TransportError,
};
use med_interpret_lib::{
    export_text, ApiClient, ApiError, AppContext, ChatSession, ClientConfig, FileHandle,
    Language, Phase, Role, Workflow, WorkflowError, APOLOGY_MESSAGE,
};

/// Routes by path the way the interpretation backend does
#[derive(Default)]
struct FakeBackend {
    seen: Mutex<Vec<ApiRequest>>,
    chat_fails: bool,
}

impl FakeBackend {
    fn reply(status: u16, body: Value) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            body: serde_json::to_vec(&body).unwrap(),
        })
    }

    fn record(id: &str) -> Value {
        json!({
            "id": id,
            "interpretation": {
                "summary": "Your blood count is normal.",
                "sections": [{
                    "original": "WBC 6.1 x10^9/L",
                    "simplified": "Your white blood cells are in the normal range.",
                    "terms": [{"term": "WBC", "definition": "White blood cells", "importance": "medium"}]
                }],
                "warnings": [],
                "nextSteps": ["No action needed"]
            },
            "documentType": "Lab Report",
            "confidence": 0.956,
            "processing_time_ms": 900
        })
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        tokio::time::sleep(Duration::from_millis(300)).await;

        match (request.method, request.url.as_str()) {
            (Method::Post, url) if url.ends_with("/interpret/") => {
                let RequestBody::Multipart { file, .. } = &request.body else {
                    return Self::reply(400, json!({"error": "Expected multipart", "statusCode": 400}));
                };
                if file.bytes.is_empty() {
                    return Self::reply(200, json!({"erc": 0, "msg": "Document is empty"}));
                }
                Self::reply(200, json!({"erc": 1, "msg": "ok", "data": Self::record("doc-42")}))
            }
            (Method::Post, url) if url.ends_with("/chat/") => {
                if self.chat_fails {
                    return Self::reply(502, json!({"error": "Upstream unavailable", "statusCode": 502}));
                }
                let RequestBody::Json(body) = &request.body else {
                    return Self::reply(400, json!({"error": "Expected json", "statusCode": 400}));
                };
                let answer = format!(
                    "[{}] About {}: {}",
                    body["language"].as_str().unwrap_or("?"),
                    body["session_id"].as_str().unwrap_or("?"),
                    body["question"].as_str().unwrap_or("?")
                );
                Self::reply(200, json!({"answer": answer}))
            }
            (Method::Get, url) if url.contains("/interpretations/doc-42/") => {
                Self::reply(200, json!({"erc": 1, "msg": "", "data": Self::record("doc-42")}))
            }
            _ => Self::reply(404, json!({"error": "Not found", "statusCode": 404})),
        }
    }
}

fn client(backend: Arc<FakeBackend>, language: Language) -> Arc<ApiClient> {
    Arc::new(ApiClient::with_transport(
        ClientConfig::default().with_base_url("https://api.test/api"),
        Arc::new(AppContext::ephemeral(language)),
        backend,
    ))
}

fn lab_report() -> FileHandle {
    FileHandle::from_bytes("cbc.pdf", "application/pdf", b"%PDF-1.7 cbc".to_vec())
}

#[tokio::test(start_paused = true)]
async fn test_document_to_questions() {
    let backend = Arc::new(FakeBackend::default());
    let client = client(backend.clone(), Language::Es);
    let mut workflow = Workflow::new(client.clone());

    let record = workflow
        .submit(lab_report(), Some(client.context().language()))
        .await
        .unwrap();

    assert_eq!(record.id, "doc-42");
    assert_eq!(
        workflow.state().completion_route().as_deref(),
        Some("/interpret/doc-42")
    );
    assert_eq!(
        export_text(&record),
        "Document Type: Lab Report\nConfidence: 96%\n\nYour blood count is normal."
    );

    let mut session = ChatSession::new(record.id.clone(), client.context().language());
    session.ask(&client, "Is this good?").await.unwrap();
    session.ask(&client, "Anything to do?").await.unwrap();

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[1].content, "[es] About doc-42: Is this good?");
    assert_eq!(transcript[3].content, "[es] About doc-42: Anything to do?");

    let fetched = client.get_interpretation("doc-42").await.unwrap();
    assert_eq!(fetched, record);

    let seen = backend.seen.lock().unwrap();
    match &seen[0].body {
        RequestBody::Multipart { fields, .. } => {
            assert!(fields.contains(&("language".to_string(), "es".to_string())));
        }
        other => panic!("expected multipart, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rejected_document_fails_workflow() {
    let backend = Arc::new(FakeBackend::default());
    let mut workflow = Workflow::new(client(backend, Language::En));

    let empty = FileHandle::from_bytes("blank.png", "image/png", Vec::new());
    let err = workflow.submit(empty, None).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Api(ApiError::Server { ref message, .. }) if message == "Document is empty"
    ));
    assert_eq!(
        workflow.state().phase(),
        &Phase::Failed {
            reason: "Document is empty".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_oversized_document_never_uploads() {
    let backend = Arc::new(FakeBackend::default());
    let mut workflow = Workflow::new(client(backend.clone(), Language::En));

    let scan = FileHandle {
        name: "mri.jpg".to_string(),
        size: 12 * 1024 * 1024,
        content_type: "image/jpeg".to_string(),
        bytes: Vec::new(),
    };
    let err = workflow.submit(scan, None).await.unwrap_err();

    assert_eq!(
        err.user_message().as_deref(),
        Some("File size exceeds 10MB limit (12.0MB)")
    );
    assert_eq!(workflow.state().phase(), &Phase::Idle);
    assert!(backend.seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_chat_failure_keeps_conversation_going() {
    let backend = Arc::new(FakeBackend {
        chat_fails: true,
        ..Default::default()
    });
    let client = client(backend, Language::En);
    let mut session = ChatSession::new("doc-42", Language::En);

    let reply = session.ask(&client, "What is WBC?").await.unwrap();
    assert_eq!(reply.content, APOLOGY_MESSAGE);
    assert!(!session.is_busy());
    assert_eq!(session.transcript().len(), 2);
}
