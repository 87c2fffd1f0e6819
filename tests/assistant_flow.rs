//! End-to-end flow through the HTTP API: upload a DOCX, ask about it, and
//! get a reply with numbered references.

use std::io::Write;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

use lexassist::config::Settings;
use lexassist::extract::{ExtractionMethod, TextExtractor};
use lexassist::openai::OpenAiConfig;
use lexassist::server::{create_router, AppState, SESSION_HEADER};

const BOUNDARY: &str = "flow-boundary";

fn docx_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("proyecto.docx");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer
        .write_all(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>PROYECTO DE LEY 001 DE 2025</w:t></w:r></w:p>
<w:p><w:r><w:t>Artículo 1. Objeto.</w:t></w:r></w:p>
</w:body></w:document>"#
                .as_bytes(),
        )
        .unwrap();
    writer.finish().unwrap();
    path
}

fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/assistant/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn docx_fixture_extracts_paragraphs() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = std::fs::read(docx_fixture(dir.path())).unwrap();

    let result = TextExtractor::new()
        .extract_from_bytes("proyecto.docx", &bytes)
        .unwrap();
    assert_eq!(result.method, ExtractionMethod::Docx);
    assert_eq!(result.text, "PROYECTO DE LEY 001 DE 2025\nArtículo 1. Objeto.");
}

#[tokio::test]
async fn upload_then_chat_with_citations() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/files")
                .body_contains("filename=\"proyecto.txt\"")
                .body_contains("Artículo 1. Objeto.");
            then.status(200)
                .json_body(json!({"id": "file-doc", "filename": "proyecto.txt"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/threads");
            then.status(200).json_body(json!({"id": "thread_e2e"}));
        })
        .await;
    let message = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/threads/thread_e2e/messages")
                .body_contains("file-doc");
            then.status(200)
                .json_body(json!({"id": "msg_u", "role": "user", "content": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/threads/thread_e2e/runs");
            then.status(200)
                .json_body(json!({"id": "run_e2e", "status": "queued"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/threads/thread_e2e/runs/run_e2e");
            then.status(200)
                .json_body(json!({"id": "run_e2e", "status": "completed"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/threads/thread_e2e/messages");
            then.status(200).json_body(json!({"data": [{
                "id": "msg_a",
                "role": "assistant",
                "content": [{"type": "text", "text": {
                    "value": "El objeto se define en el artículo 1【3:0†proyecto.txt】.",
                    "annotations": [{
                        "type": "file_citation",
                        "text": "【3:0†proyecto.txt】",
                        "file_citation": {"file_id": "file-doc", "quote": "Artículo 1. Objeto."}
                    }]
                }}]
            }]}));
        })
        .await;

    let mut settings = Settings::default();
    settings.openai = OpenAiConfig::base_default()
        .with_base_url(&server.base_url())
        .with_api_key("sk-test")
        .with_assistant_id("asst_e2e")
        .with_poll_interval_ms(1);
    let app = create_router(AppState::new(&settings).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let bytes = std::fs::read(docx_fixture(dir.path())).unwrap();
    let response = app
        .clone()
        .oneshot(upload_request("proyecto.docx", &bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = response
        .headers()
        .get(SESSION_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(json_body(response).await["status"], "success");
    upload.assert_async().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/assistant/chat")
        .header(SESSION_HEADER, &session)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"prompt": "¿Cuál es el objeto del proyecto?"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chat = json_body(response).await;
    message.assert_async().await;

    assert_eq!(chat["thread_id"], "thread_e2e");
    assert_eq!(
        chat["reply"],
        "El objeto se define en el artículo 1 [1].\n\n**Referencias:**\n\
         [1] \"Artículo 1. Objeto.\" (de proyecto.docx)"
    );
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
    assert_eq!(chat["messages"][0]["role"], "user");

    let request = Request::builder()
        .uri("/api/assistant/messages")
        .header(SESSION_HEADER, &session)
        .body(Body::empty())
        .unwrap();
    let history = json_body(app.oneshot(request).await.unwrap()).await;
    assert_eq!(history, chat["messages"]);
}
