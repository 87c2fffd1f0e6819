//! Client for the hosted Assistants API.
//!
//! Covers the calls the assistant needs: file upload and deletion, threads,
//! messages, runs and tool output submission.

mod config;
mod types;

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

pub use config::OpenAiConfig;
pub use types::{
    Annotation, Attachment, DeletedFile, FileCitation, FileObject, FunctionCall, Message,
    MessageContent, RequiredAction, Run, RunError, RunStatus, TextContent, Thread, ToolCall,
    ToolOutput,
};

use types::MessageList;

/// Errors that can occur talking to the API.
#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,

    #[error("OPENAI_ASSISTANT_ID is not configured")]
    MissingAssistantId,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Assistants API client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OpenAiError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// The configured assistant id.
    pub fn assistant_id(&self) -> Result<&str, OpenAiError> {
        self.config
            .assistant_id
            .as_deref()
            .ok_or(OpenAiError::MissingAssistantId)
    }

    /// Upload extracted text as a `.txt` file for file search.
    ///
    /// The uploaded name keeps the original stem so citations stay readable.
    pub async fn upload_text(
        &self,
        text: &str,
        original_filename: &str,
    ) -> Result<FileObject, OpenAiError> {
        let upload_name = text_upload_name(original_filename);

        let part = Part::bytes(text.as_bytes().to_vec())
            .file_name(upload_name.clone())
            .mime_str("text/plain")
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;
        let form = Form::new().text("purpose", "assistants").part("file", part);

        let request = self.request(Method::POST, "/files")?.multipart(form);
        let file: FileObject = self.send_json(request).await?;

        info!("Uploaded {} with id {}", upload_name, file.id);
        Ok(file)
    }

    /// Delete an uploaded file. Returns the service's `deleted` flag.
    pub async fn delete_file(&self, file_id: &str) -> Result<bool, OpenAiError> {
        let request = self.request(Method::DELETE, &format!("/files/{}", file_id))?;
        let deleted: DeletedFile = self.send_json(request).await?;
        debug!("Delete response for {}: deleted={}", deleted.id, deleted.deleted);
        Ok(deleted.deleted)
    }

    /// Create an empty thread.
    pub async fn create_thread(&self) -> Result<Thread, OpenAiError> {
        let request = self.request(Method::POST, "/threads")?.json(&json!({}));
        self.send_json(request).await
    }

    /// Add a user message, attaching files for `file_search`.
    pub async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
        file_ids: &[String],
    ) -> Result<Message, OpenAiError> {
        let attachments: Vec<Attachment> = file_ids
            .iter()
            .map(|id| Attachment::file_search(id))
            .collect();

        let request = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))?
            .json(&json!({
                "role": "user",
                "content": content,
                "attachments": attachments,
            }));
        self.send_json(request).await
    }

    /// Start a run of the assistant over a thread.
    pub async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run, OpenAiError> {
        let mut body = json!({ "assistant_id": assistant_id });
        if let Some(instructions) = instructions {
            body["instructions"] = json!(instructions);
        }

        let request = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))?
            .json(&body);
        self.send_json(request).await
    }

    /// Fetch the current state of a run.
    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAiError> {
        let request = self.request(
            Method::GET,
            &format!("/threads/{}/runs/{}", thread_id, run_id),
        )?;
        self.send_json(request).await
    }

    /// Return tool outputs to a run waiting in `requires_action`.
    pub async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, OpenAiError> {
        let request = self
            .request(
                Method::POST,
                &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            )?
            .json(&json!({ "tool_outputs": outputs }));
        self.send_json(request).await
    }

    /// The newest message of a thread.
    pub async fn latest_message(&self, thread_id: &str) -> Result<Option<Message>, OpenAiError> {
        let request = self
            .request(Method::GET, &format!("/threads/{}/messages", thread_id))?
            .query(&[("order", "desc"), ("limit", "1")]);
        let list: MessageList = self.send_json(request).await?;
        Ok(list.data.into_iter().next())
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, OpenAiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(OpenAiError::MissingApiKey)?;
        let url = format!("{}/v1{}", self.config.base_url.trim_end_matches('/'), path);

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(api_key)
            .header("OpenAI-Beta", "assistants=v2"))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, OpenAiError> {
        let resp = request
            .send()
            .await
            .map_err(|e| OpenAiError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))
    }
}

/// Name used for the uploaded text version of a document.
fn text_upload_name(original_filename: &str) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");
    format!("{}.txt", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = OpenAiConfig::base_default()
            .with_base_url(&server.base_url())
            .with_api_key("sk-test")
            .with_assistant_id("asst_test");
        OpenAiClient::new(config).unwrap()
    }

    #[test]
    fn test_text_upload_name() {
        assert_eq!(text_upload_name("Ley 1751 de 2015.pdf"), "Ley 1751 de 2015.txt");
        assert_eq!(text_upload_name("demanda.docx"), "demanda.txt");
        assert_eq!(text_upload_name("notas"), "notas.txt");
        assert_eq!(text_upload_name(""), "document.txt");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = OpenAiClient::new(OpenAiConfig::base_default()).unwrap();
        let err = client.create_thread().await.unwrap_err();
        assert!(matches!(err, OpenAiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_upload_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/files")
                    .body_contains("assistants")
                    .body_contains("filename=\"fallo.txt\"");
                then.status(200).json_body(serde_json::json!({
                    "id": "file-123",
                    "object": "file",
                    "filename": "fallo.txt",
                    "purpose": "assistants"
                }));
            })
            .await;

        let client = client_for(&server);
        let file = client.upload_text("Sentencia T-760", "fallo.pdf").await.unwrap();
        assert_eq!(file.id, "file-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_file() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/files/file-123");
                then.status(200).json_body(serde_json::json!({
                    "id": "file-123", "object": "file", "deleted": true
                }));
            })
            .await;

        let client = client_for(&server);
        assert!(client.delete_file("file-123").await.unwrap());
    }

    #[tokio::test]
    async fn test_api_error_message_extracted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/threads");
                then.status(401).json_body(serde_json::json!({
                    "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
                }));
            })
            .await;

        let client = client_for(&server);
        match client.create_thread().await.unwrap_err() {
            OpenAiError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_latest_message_queries_newest_first() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/threads/thread_1/messages")
                    .query_param("order", "desc")
                    .query_param("limit", "1");
                then.status(200).json_body(serde_json::json!({
                    "object": "list",
                    "data": [{
                        "id": "msg_9",
                        "role": "assistant",
                        "content": [{"type": "text", "text": {"value": "Hola", "annotations": []}}]
                    }]
                }));
            })
            .await;

        let client = client_for(&server);
        let message = client.latest_message("thread_1").await.unwrap().unwrap();
        assert_eq!(message.id, "msg_9");
        assert_eq!(message.first_text().unwrap().value, "Hola");
    }
}
