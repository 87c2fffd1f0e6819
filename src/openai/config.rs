//! OpenAI client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the Assistants API client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (normally supplied through `OPENAI_API_KEY`).
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Assistant that runs are created against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    /// API base URL, without the `/v1` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Delay between run status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a run after this many seconds.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Custom run instructions (defaults to the built-in legal analyst prompt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_run_timeout_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl OpenAiConfig {
    /// Base default without env overrides.
    pub fn base_default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            run_timeout_secs: default_run_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            instructions: None,
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OPENAI_API_KEY`: API key
    /// - `OPENAI_ASSISTANT_ID`: assistant to run
    /// - `OPENAI_BASE_URL`: API endpoint (for proxies or compatible servers)
    /// - `OPENAI_POLL_INTERVAL_MS`: run polling interval
    /// - `OPENAI_RUN_TIMEOUT_SECS`: maximum wait for a run
    /// - `ASSISTANT_INSTRUCTIONS`: custom run instructions
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.trim().is_empty() {
                self.api_key = Some(val);
            }
        }
        if let Ok(val) = std::env::var("OPENAI_ASSISTANT_ID") {
            if !val.trim().is_empty() {
                self.assistant_id = Some(val);
            }
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.base_url = val;
        }
        if let Ok(val) = std::env::var("OPENAI_POLL_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.poll_interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("OPENAI_RUN_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.run_timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("ASSISTANT_INSTRUCTIONS") {
            self.instructions = Some(val);
        }
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: &str) -> Self {
        self.assistant_id = Some(assistant_id.to_string());
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_run_timeout_secs(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Key with everything but a short prefix masked, for display.
    pub fn redacted_api_key(&self) -> String {
        match self.api_key.as_deref() {
            None => "(not set)".to_string(),
            Some(key) if key.len() <= 8 => "****".to_string(),
            Some(key) => format!("{}****", key.get(..7).unwrap_or("")),
        }
    }
}
