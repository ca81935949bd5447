//! Drives the axum router end to end with in-memory storage and mock embeddings.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ragops::connector::http::router;
use ragops::{ChatClient, Container, ContainerConfig, DomainError};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const BOUNDARY: &str = "ragops-test-boundary";

#[derive(Default)]
struct StubChat {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatClient for StubChat {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, DomainError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(user.to_string());
        Ok(format!(" Answer number {} ", prompts.len()))
    }

    fn model(&self) -> &str {
        "stub"
    }
}

async fn container(dir: &TempDir) -> Container {
    let config = ContainerConfig {
        upload_dir: dir.path().join("uploads").to_string_lossy().to_string(),
        vectorstore_path: dir.path().join("vectors").to_string_lossy().to_string(),
        mock_embeddings: true,
        memory_storage: true,
        ..ContainerConfig::default()
    };
    Container::new(config).await.expect("container")
}

async fn app(dir: &TempDir) -> axum::Router {
    router(Arc::new(container(dir).await))
}

fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content_type, data)))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn health_check() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn list_files_starts_empty() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, empty_request("GET", "/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn upload_fetch_and_delete_file() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, uploaded) = send(
        &app,
        upload_request("test_file.pdf", "application/pdf", b"%PDF-1.4 test content"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(uploaded["filename"], "test_file.pdf");
    assert_eq!(uploaded["file_type"], "pdf");
    assert_eq!(uploaded["status"], "uploaded");
    assert!(uploaded.get("file_path").is_none());
    let id = uploaded["id"].as_u64().unwrap();

    let stored: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
        .unwrap()
        .collect();
    assert_eq!(stored.len(), 1);

    let (status, fetched) = send(&app, empty_request("GET", &format!("/files/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], uploaded["id"]);

    let (status, listed) = send(&app, empty_request("GET", "/files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, deleted) = send(&app, empty_request("DELETE", &format!("/files/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        deleted["message"],
        format!("File {} deleted successfully", id)
    );
    assert_eq!(deleted["details"]["filename"], "test_file.pdf");
    assert_eq!(
        std::fs::read_dir(dir.path().join("uploads")).unwrap().count(),
        0
    );

    let (status, body) = send(&app, empty_request("GET", &format!("/files/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["detail"], format!("File with ID {} not found", id));

    let (_, second) = send(
        &app,
        upload_request("second.csv", "text/csv", b"a,b\n1,2\n"),
    )
    .await;
    assert!(second["id"].as_u64().unwrap() > id, "ids are not reused");
}

#[tokio::test]
async fn unknown_file_returns_not_found() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, _) = send(&app, empty_request("GET", "/files/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty_request("DELETE", "/files/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_uploads_are_rejected() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, upload_request("notes.txt", "text/plain", b"hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "File type '.txt' not allowed. Allowed types: ['pdf', 'csv', 'xlsx']"
    );

    let (status, body) = send(&app, upload_request("report.pdf", "text/csv", b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid content type 'text/csv' for file type 'pdf'"
    );

    let (status, body) = send(&app, upload_request("README", "application/pdf", b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File must have an extension");

    let oversized = vec![b'a'; 10 * 1024 * 1024 + 1];
    let (status, body) = send(&app, upload_request("big.csv", "text/csv", &oversized)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "File size (10.00 MB) exceeds maximum allowed size (10.00 MB) for csv files"
    );

    let (_, listed) = send(&app, empty_request("GET", "/files")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn chat_without_llm_is_unavailable() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/chat", json!({"question": "What grew?"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn ingest_search_and_chat() {
    let dir = tempdir().unwrap();
    let chat = Arc::new(StubChat::default());
    let container = container(&dir).await.with_chat_client(chat.clone());
    let app = router(Arc::new(container));

    let (status, uploaded) = send(
        &app,
        upload_request("cities.csv", "text/csv", b"city,temp\nOslo,4\nLima,19\n"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = uploaded["id"].as_u64().unwrap();

    let (status, processed) = send(
        &app,
        empty_request("POST", &format!("/files/{}/ingest", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(processed["status"], "processed");
    assert_eq!(processed["chunk_count"], 1);

    let (status, hits) = send(
        &app,
        json_request("POST", "/search", json!({"query": "Oslo", "top_k": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["file_name"], "cities.csv");
    assert_eq!(hits[0]["file_id"], id);
    assert!(hits[0]["content"].as_str().unwrap().contains("Oslo"));

    let (status, first) = send(
        &app,
        json_request("POST", "/chat", json!({"question": "How warm is Lima?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["answer"], "Answer number 1");
    assert_eq!(first["sources"].as_array().unwrap().len(), 1);
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let (status, second) = send(
        &app,
        json_request(
            "POST",
            "/chat",
            json!({"question": "And Oslo?", "session_id": session_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session_id"], session_id);

    let prompts = chat.prompts.lock().unwrap();
    assert!(prompts[0].contains("Lima    19"));
    assert!(prompts[1].contains("How warm is Lima?"));
    assert!(prompts[1].contains("Answer number 1"));
    assert!(prompts[1].contains("Question: And Oslo?"));
}

#[tokio::test]
async fn search_rejects_empty_query() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, json_request("POST", "/search", json!({"query": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn malformed_requests_get_json_error_bodies() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (status, body) = send(&app, json_request("POST", "/search", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["detail"].as_str().unwrap().contains("query"));

    let (status, body) = send(&app, json_request("POST", "/chat", json!({"q": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    for (method, uri) in [
        ("GET", "/files/abc"),
        ("DELETE", "/files/abc"),
        ("POST", "/files/abc/ingest"),
    ] {
        let (status, body) = send(&app, empty_request(method, uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(body["error"], "bad_request");
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn same_name_uploads_are_stored_separately() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (_, first) = send(&app, upload_request("a.csv", "text/csv", b"city,temp\nOslo,4\n")).await;
    let (_, second) = send(&app, upload_request("a.csv", "text/csv", b"city,temp\nLima,19\n")).await;
    let uploads = dir.path().join("uploads");
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 2);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/files/{}", first["id"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 1);

    let (status, ingested) = send(
        &app,
        empty_request("POST", &format!("/files/{}/ingest", second["id"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ingested["status"], "processed");

    let (_, hits) = send(&app, json_request("POST", "/search", json!({"query": "Lima"}))).await;
    assert!(hits[0]["content"].as_str().unwrap().contains("Lima"));
}

#[tokio::test]
async fn uploaded_pdf_and_xlsx_are_searchable() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");

    let uploads = [
        ("quarterly.pdf", "application/pdf"),
        (
            "sales.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
    ];
    for (name, content_type) in uploads {
        let bytes = std::fs::read(data.join(name)).unwrap();
        let (status, uploaded) = send(&app, upload_request(name, content_type, &bytes)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", name);

        let (status, processed) = send(
            &app,
            empty_request("POST", &format!("/files/{}/ingest", uploaded["id"])),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}: {}", name, processed);
        assert_eq!(processed["status"], "processed");
    }

    let (_, hits) = send(
        &app,
        json_request(
            "POST",
            "/search",
            json!({"query": "north", "top_k": 10, "file_names": ["sales.xlsx"]}),
        ),
    )
    .await;
    let hits = hits.as_array().unwrap();
    assert!(!hits.is_empty());
    assert!(hits
        .iter()
        .any(|hit| hit["content"].as_str().unwrap().contains("Unnamed: 1")));
}

#[tokio::test]
async fn ingest_of_unreadable_pdf_marks_file_failed() {
    let dir = tempdir().unwrap();
    let app = app(&dir).await;

    let (_, uploaded) = send(
        &app,
        upload_request("broken.pdf", "application/pdf", b"not really a pdf"),
    )
    .await;
    let id = uploaded["id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        empty_request("POST", &format!("/files/{}/ingest", id)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "extraction_error");

    let (_, fetched) = send(&app, empty_request("GET", &format!("/files/{}", id))).await;
    assert_eq!(fetched["status"], "failed");
    assert!(fetched["error_message"].is_string());
}
