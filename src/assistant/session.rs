//! Per-visitor conversation state.
//!
//! Sessions live in memory only. The store lock is held for short updates
//! and never across network calls.

use std::collections::HashMap;
use std::sync::Arc;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_SECS};

use crate::scrapers::Bill;

/// Display name for files the session does not know about.
pub const UNKNOWN_FILE_NAME: &str = "desconocido";

/// A document uploaded to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub filename: String,
}

impl FileInfo {
    pub fn new(file_id: &str, filename: &str) -> Self {
        Self {
            file_id: file_id.to_string(),
            filename: filename.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the visible chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Conversation state for one visitor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    pub id: String,
    pub thread_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub files: Vec<FileInfo>,
    pub is_processing: bool,
    pub is_scraping: bool,
    pub recent_bills: Vec<Bill>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            last_seen: Utc::now(),
            ..Default::default()
        }
    }

    /// Idle sessions can be evicted; busy ones never are.
    fn is_idle(&self) -> bool {
        !self.is_processing && !self.is_scraping
    }

    /// Add an uploaded file. Fails when the session already holds `limit`
    /// files. Either way the upload is no longer in progress.
    pub fn add_file(&mut self, info: FileInfo, limit: usize) -> Result<(), usize> {
        self.is_processing = false;
        if self.files.len() >= limit {
            return Err(limit);
        }
        self.files.push(info);
        Ok(())
    }

    pub fn remove_file(&mut self, file_id: &str) -> Option<FileInfo> {
        let pos = self.files.iter().position(|f| f.file_id == file_id)?;
        Some(self.files.remove(pos))
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.files.iter().any(|f| f.file_id == file_id)
    }

    /// Name shown for a file id.
    pub fn file_name(&self, file_id: &str) -> String {
        self.files
            .iter()
            .find(|f| f.file_id == file_id)
            .map(|f| f.filename.clone())
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
    }

    pub fn file_ids(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_id.clone()).collect()
    }

    /// Start a chat turn: trims the prompt, records it and marks the session
    /// busy. Returns `None` for a blank prompt or a session already busy.
    pub fn begin_turn(&mut self, prompt: &str) -> Option<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() || self.is_processing {
            return None;
        }
        self.is_processing = true;
        self.messages.push(ChatMessage::user(prompt));
        Some(prompt.to_string())
    }

    /// Finish a chat turn, recording the reply if there is one.
    pub fn end_turn(&mut self, reply: Option<&str>) {
        if let Some(reply) = reply {
            self.messages.push(ChatMessage::assistant(reply));
        }
        self.is_processing = false;
    }
}

/// In-memory session store shared by request handlers.
///
/// Idle sessions older than the TTL are swept whenever a session is created,
/// and the least recently seen idle session is dropped once the store is full.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: chrono::Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(
            Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
            max_sessions: max_sessions.max(1),
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        session.is_idle() && now - session.last_seen > self.ttl
    }

    /// Create an empty session and return its id.
    pub async fn create(&self) -> String {
        let session = Session::new();
        let id = session.id.clone();

        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| !self.is_expired(s, now));

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .filter(|s| s.is_idle())
                .min_by_key(|s| s.last_seen)
                .map(|s| s.id.clone());
            if let Some(oldest) = oldest {
                debug!("Session store full, evicting {}", oldest);
                sessions.remove(&oldest);
            }
        }

        sessions.insert(id.clone(), session);
        id
    }

    /// Id of a live session, refreshing its last-seen time. Never creates
    /// one.
    pub async fn existing(&self, id: Option<&str>) -> Option<String> {
        let id = id?;
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired = self.is_expired(sessions.get(id)?, now);
        if expired {
            sessions.remove(id);
            return None;
        }
        if let Some(session) = sessions.get_mut(id) {
            session.last_seen = now;
        }
        Some(id.to_string())
    }

    /// Id of a live session, or of a new one when `id` is absent, unknown or
    /// expired.
    pub async fn resolve(&self, id: Option<&str>) -> String {
        match self.existing(id).await {
            Some(id) => id,
            None => self.create().await,
        }
    }

    /// Drop expired idle sessions. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, s| !self.is_expired(s, now));
        before - sessions.len()
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Snapshot of a session.
    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Apply `f` to a session under the write lock.
    pub async fn update<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.write().await.get_mut(id).map(f)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
