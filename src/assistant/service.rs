//! Session-aware assistant operations shared by the server and the CLI.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use super::conversation::Conversation;
use super::session::{ChatMessage, FileInfo, SessionStore};
use super::tools::ToolRegistry;
use super::upload::{delete_remote_file, process_upload, UploadError, UploadResponse};
use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::openai::{OpenAiClient, OpenAiError};
use crate::scrapers::{Bill, CamaraScraper, ScrapeError};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("unknown session: {0}")]
    SessionNotFound(String),

    #[error("file {0} is not part of this session")]
    FileNotFound(String),

    #[error("the service did not delete {0}")]
    DeleteRefused(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("session is busy")]
    Busy,

    #[error(transparent)]
    OpenAi(#[from] OpenAiError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Result of a chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub reply: String,
    pub thread_id: String,
    pub messages: Vec<ChatMessage>,
}

/// The assistant's moving parts plus per-session state.
#[derive(Debug, Clone)]
pub struct AssistantService {
    extractor: TextExtractor,
    openai: Arc<OpenAiClient>,
    scraper: Arc<CamaraScraper>,
    conversation: Conversation,
    sessions: SessionStore,
    max_files: usize,
}

impl AssistantService {
    pub fn new(
        extractor: TextExtractor,
        openai: Arc<OpenAiClient>,
        scraper: Arc<CamaraScraper>,
        tools: ToolRegistry,
        max_files: usize,
    ) -> Self {
        let conversation = Conversation::new(openai.clone(), tools);
        Self {
            extractor,
            openai,
            scraper,
            conversation,
            sessions: SessionStore::new(),
            max_files,
        }
    }

    /// Wire everything up from resolved settings with the built-in tools.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let extractor = TextExtractor::from_config(&settings.extraction);
        let openai = Arc::new(OpenAiClient::new(settings.openai.clone())?);
        let scraper = Arc::new(CamaraScraper::new(settings.scraper.clone())?);
        let tools = ToolRegistry::with_defaults(scraper.clone());

        let sessions = SessionStore::with_limits(
            Duration::from_secs(settings.server.session_ttl_secs),
            settings.server.max_sessions,
        );

        Ok(Self::new(
            extractor,
            openai,
            scraper,
            tools,
            settings.server.max_files_per_session,
        )
        .with_sessions(sessions))
    }

    /// Replace the session store, e.g. to change eviction limits.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn openai(&self) -> &OpenAiClient {
        &self.openai
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Upload a document into a session.
    pub async fn upload(&self, session_id: &str, filename: &str, bytes: Vec<u8>) -> UploadResponse {
        let admitted = self
            .sessions
            .update(session_id, |s| {
                if s.is_processing {
                    Err(UploadError::Busy)
                } else if s.files.len() >= self.max_files {
                    Err(UploadError::FileLimit(self.max_files))
                } else {
                    s.is_processing = true;
                    Ok(())
                }
            })
            .await
            .unwrap_or_else(|| Err(UploadError::Internal(format!("unknown session {}", session_id))));
        if let Err(e) = admitted {
            warn!("Upload of '{}' refused: {}", filename, e);
            return UploadResponse::Error {
                message: e.user_message(),
            };
        }

        let result = process_upload(&self.extractor, &self.openai, filename, bytes).await;

        let outcome = match result {
            Ok(info) => {
                let added = self
                    .sessions
                    .update(session_id, |s| s.add_file(info.clone(), self.max_files))
                    .await;
                match added {
                    Some(Ok(())) => Ok(info),
                    Some(Err(limit)) => {
                        // Filled up by a concurrent upload.
                        delete_remote_file(&self.openai, &info.file_id, &info.filename).await;
                        Err(UploadError::FileLimit(limit))
                    }
                    None => {
                        delete_remote_file(&self.openai, &info.file_id, &info.filename).await;
                        Err(UploadError::Internal(format!(
                            "session {} disappeared during upload",
                            session_id
                        )))
                    }
                }
            }
            Err(e) => Err(e),
        };

        self.sessions
            .update(session_id, |s| s.is_processing = false)
            .await;
        outcome.into()
    }

    pub async fn files(&self, session_id: &str) -> Result<Vec<FileInfo>, AssistantError> {
        self.sessions
            .get(session_id)
            .await
            .map(|s| s.files)
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))
    }

    /// Delete a file remotely and drop it from the session once the service
    /// confirms. Returns the file's display name.
    pub async fn delete_file(&self, session_id: &str, file_id: &str) -> Result<String, AssistantError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))?;
        if !session.has_file(file_id) {
            return Err(AssistantError::FileNotFound(file_id.to_string()));
        }

        let name = session.file_name(file_id);
        if !delete_remote_file(&self.openai, file_id, &name).await {
            return Err(AssistantError::DeleteRefused(file_id.to_string()));
        }

        self.sessions
            .update(session_id, |s| s.remove_file(file_id))
            .await;
        Ok(name)
    }

    /// Run one chat turn for a session.
    pub async fn submit(&self, session_id: &str, prompt: &str) -> Result<ChatTurn, AssistantError> {
        if prompt.trim().is_empty() {
            return Err(AssistantError::EmptyPrompt);
        }

        let begun = self
            .sessions
            .update(session_id, |s| {
                s.begin_turn(prompt)
                    .map(|p| (p, s.thread_id.clone(), s.files.clone()))
            })
            .await
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))?;
        let Some((prompt, thread_id, files)) = begun else {
            return Err(AssistantError::Busy);
        };

        let result = self.run_turn(session_id, &prompt, thread_id, &files).await;

        let reply = result.as_ref().ok().map(|(reply, _)| reply.as_str());
        let messages = self
            .sessions
            .update(session_id, |s| {
                s.end_turn(reply);
                s.messages.clone()
            })
            .await
            .unwrap_or_default();

        match result {
            Ok((reply, thread_id)) => Ok(ChatTurn {
                reply,
                thread_id,
                messages,
            }),
            Err(e) => {
                error!("Chat turn failed for session {}: {}", session_id, e);
                Err(e)
            }
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        prompt: &str,
        thread_id: Option<String>,
        files: &[FileInfo],
    ) -> Result<(String, String), AssistantError> {
        let thread_id = match thread_id {
            Some(id) => id,
            None => {
                let id = self.conversation.start_thread().await?;
                self.sessions
                    .update(session_id, |s| s.thread_id = Some(id.clone()))
                    .await;
                id
            }
        };

        let file_ids: Vec<String> = files.iter().map(|f| f.file_id.clone()).collect();
        let reply = self
            .conversation
            .respond(&thread_id, prompt, &file_ids, files)
            .await?;
        Ok((reply, thread_id))
    }

    pub async fn messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, AssistantError> {
        self.sessions
            .get(session_id)
            .await
            .map(|s| s.messages)
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))
    }

    /// Scrape recent bills into the session. A failed scrape stores an empty
    /// list.
    pub async fn scrape_bills(&self, session_id: &str) -> Result<Vec<Bill>, AssistantError> {
        let started = self
            .sessions
            .update(session_id, |s| {
                if s.is_scraping {
                    false
                } else {
                    s.is_scraping = true;
                    true
                }
            })
            .await
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))?;
        if !started {
            return Err(AssistantError::Busy);
        }

        let limit = self.scraper.config().default_limit;
        let bills = match self.scraper.recent_bills(limit).await {
            Ok(bills) => bills,
            Err(e) => {
                error!("Scraping recent bills failed: {}", e);
                Vec::new()
            }
        };
        info!("Session {} now has {} recent bills", session_id, bills.len());

        self.sessions
            .update(session_id, |s| {
                s.recent_bills = bills.clone();
                s.is_scraping = false;
            })
            .await;
        Ok(bills)
    }

    pub async fn bills(&self, session_id: &str) -> Result<Vec<Bill>, AssistantError> {
        self.sessions
            .get(session_id)
            .await
            .map(|s| s.recent_bills)
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))
    }
}
