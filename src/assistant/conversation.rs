//! One assistant turn: message, run, polling, tool calls, reply.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::citations::format_with_citations;
use super::prompts::{run_failed_reply, DEFAULT_INSTRUCTIONS, UNREADABLE_REPLY};
use super::session::FileInfo;
use super::tools::ToolRegistry;
use crate::openai::{OpenAiClient, OpenAiError, RunStatus};

/// Drives runs of the hosted assistant over a thread.
#[derive(Debug, Clone)]
pub struct Conversation {
    openai: Arc<OpenAiClient>,
    tools: ToolRegistry,
    instructions: String,
}

impl Conversation {
    pub fn new(openai: Arc<OpenAiClient>, tools: ToolRegistry) -> Self {
        let instructions = openai
            .config()
            .instructions
            .clone()
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());
        Self {
            openai,
            tools,
            instructions,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Create a thread for a new conversation.
    pub async fn start_thread(&self) -> Result<String, OpenAiError> {
        let thread = self.openai.create_thread().await?;
        info!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    /// Send `prompt` with `file_ids` attached and wait for the reply.
    ///
    /// Runs that end in anything but `completed` (or exceed the run timeout)
    /// yield an apology naming the status rather than an error; only API
    /// failures are returned as `Err`.
    pub async fn respond(
        &self,
        thread_id: &str,
        prompt: &str,
        file_ids: &[String],
        known_files: &[FileInfo],
    ) -> Result<String, OpenAiError> {
        let assistant_id = self.openai.assistant_id()?.to_string();

        self.openai
            .add_user_message(thread_id, prompt, file_ids)
            .await?;
        let mut run = self
            .openai
            .create_run(thread_id, &assistant_id, Some(&self.instructions))
            .await?;
        info!("Started run {} on thread {}", run.id, thread_id);

        let poll_interval = self.openai.config().poll_interval();
        let timeout = self.openai.config().run_timeout();
        let started = Instant::now();

        loop {
            debug!("Run {} is {}", run.id, run.status);
            match run.status {
                RunStatus::Completed => break,
                status if status.is_pending() || status == RunStatus::RequiresAction => {
                    if started.elapsed() >= timeout {
                        warn!(
                            "Run {} still {} after {:?}, giving up",
                            run.id, status, timeout
                        );
                        return Ok(run_failed_reply(status.as_str()));
                    }
                }
                status => {
                    match &run.last_error {
                        Some(e) => error!("Run {} ended with status {}: {}", run.id, status, e),
                        None => error!("Run {} ended with status {}", run.id, status),
                    }
                    return Ok(run_failed_reply(status.as_str()));
                }
            }

            if run.status == RunStatus::RequiresAction {
                let calls = run.tool_calls();
                if calls.is_empty() {
                    error!("Run {} requires action but lists no tool calls", run.id);
                    return Ok(run_failed_reply(run.status.as_str()));
                }

                let mut outputs = Vec::with_capacity(calls.len());
                for call in calls {
                    info!("Run {} calls {}", run.id, call.function.name);
                    outputs.push(self.tools.execute(call).await);
                }
                run = self
                    .openai
                    .submit_tool_outputs(thread_id, &run.id, &outputs)
                    .await?;
                continue;
            }

            tokio::time::sleep(poll_interval).await;
            run = self.openai.retrieve_run(thread_id, &run.id).await?;
        }

        let reply = match self.openai.latest_message(thread_id).await? {
            Some(message) => format_with_citations(&message, known_files),
            None => {
                warn!("Thread {} has no messages after run {}", thread_id, run.id);
                UNREADABLE_REPLY.to_string()
            }
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tools::tests::EchoTool;
    use crate::openai::OpenAiConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn conversation(server: &MockServer, timeout_secs: u64) -> Conversation {
        let config = OpenAiConfig::base_default()
            .with_base_url(&server.base_url())
            .with_api_key("sk-test")
            .with_assistant_id("asst_test")
            .with_poll_interval_ms(1)
            .with_run_timeout_secs(timeout_secs);
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(EchoTool));
        Conversation::new(Arc::new(OpenAiClient::new(config).unwrap()), tools)
    }

    async fn mock_message(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/messages")
                    .body_contains("file_search")
                    .body_contains("file-ley");
                then.status(200).json_body(json!({
                    "id": "msg_user", "role": "user", "content": []
                }));
            })
            .await;
    }

    #[tokio::test]
    async fn test_respond_with_tool_call() {
        let server = MockServer::start_async().await;
        mock_message(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/runs")
                    .body_contains("asst_test")
                    .body_contains("instructions");
                then.status(200).json_body(json!({
                    "id": "run_1",
                    "status": "requires_action",
                    "required_action": {
                        "type": "submit_tool_outputs",
                        "submit_tool_outputs": {"tool_calls": [{
                            "id": "call_1", "type": "function",
                            "function": {"name": "eco", "arguments": "{}"}
                        }]}
                    }
                }));
            })
            .await;
        let submit = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/threads/thread_1/runs/run_1/submit_tool_outputs")
                    .body_contains("call_1");
                then.status(200)
                    .json_body(json!({"id": "run_1", "status": "in_progress"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/threads/thread_1/runs/run_1");
                then.status(200)
                    .json_body(json!({"id": "run_1", "status": "completed"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/threads/thread_1/messages");
                then.status(200).json_body(json!({
                    "data": [{
                        "id": "msg_2",
                        "role": "assistant",
                        "content": [{"type": "text", "text": {
                            "value": "Ver la norma【1†ley】",
                            "annotations": [{
                                "text": "【1†ley】",
                                "file_citation": {"file_id": "file-ley", "quote": "Art. 1"}
                            }]
                        }}]
                    }]
                }));
            })
            .await;

        let files = vec![FileInfo::new("file-ley", "ley.pdf")];
        let reply = conversation(&server, 30)
            .respond("thread_1", "Analiza la ley", &["file-ley".to_string()], &files)
            .await
            .unwrap();

        submit.assert_async().await;
        assert_eq!(
            reply,
            "Ver la norma [1]\n\n**Referencias:**\n[1] \"Art. 1\" (de ley.pdf)"
        );
    }

    #[tokio::test]
    async fn test_failed_run_reports_status() {
        let server = MockServer::start_async().await;
        mock_message(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/threads/thread_1/runs");
                then.status(200).json_body(json!({
                    "id": "run_2",
                    "status": "failed",
                    "last_error": {"code": "rate_limit_exceeded", "message": "Too many requests"}
                }));
            })
            .await;

        let reply = conversation(&server, 30)
            .respond("thread_1", "Hola", &["file-ley".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(reply, "Lo siento, ocurrió un error (Estado: failed).");
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let server = MockServer::start_async().await;
        mock_message(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/threads/thread_1/runs");
                then.status(200)
                    .json_body(json!({"id": "run_3", "status": "queued"}));
            })
            .await;

        let reply = conversation(&server, 0)
            .respond("thread_1", "Hola", &["file-ley".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(reply, "Lo siento, ocurrió un error (Estado: queued).");
    }

    #[tokio::test]
    async fn test_missing_assistant_id() {
        let config = OpenAiConfig::base_default().with_api_key("sk-test");
        let conversation = Conversation::new(
            Arc::new(OpenAiClient::new(config).unwrap()),
            ToolRegistry::new(),
        );
        let err = conversation
            .respond("thread_1", "Hola", &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, OpenAiError::MissingAssistantId));
    }

    #[test]
    fn test_custom_instructions() {
        let mut config = OpenAiConfig::base_default();
        config.instructions = Some("Responde en una línea.".into());
        let conversation = Conversation::new(
            Arc::new(OpenAiClient::new(config).unwrap()),
            ToolRegistry::new(),
        );
        assert_eq!(conversation.instructions(), "Responde en una línea.");
    }
}
