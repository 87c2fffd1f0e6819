//! Configuration management for lexassist using the prefer crate.
//!
//! A config file (`lexassist.toml`, `.yaml` or `.json`) is discovered with
//! prefer and parsed with serde. Environment variables override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::openai::OpenAiConfig;
use crate::scrapers::ScraperConfig;

/// Default bind address for the web server.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Maximum number of documents attached to one conversation.
pub const MAX_FILES_UPLOAD: usize = 3;

/// Default request body limit for uploads (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Idle time after which a session may be evicted (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Sessions kept in memory before the least recently seen are evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Text extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Tesseract language setting.
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Render resolution for OCR.
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
    /// A PDF text layer shorter than this (trimmed) triggers OCR.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

fn default_ocr_language() -> String {
    "spa+eng".to_string()
}

fn default_ocr_dpi() -> u32 {
    200
}

fn default_min_text_chars() -> usize {
    100
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl ExtractionConfig {
    fn base_default() -> Self {
        Self {
            ocr_language: default_ocr_language(),
            ocr_dpi: default_ocr_dpi(),
            min_text_chars: default_min_text_chars(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `LEXASSIST_OCR_LANGUAGE`: Tesseract languages (e.g. "spa+eng")
    /// - `LEXASSIST_OCR_DPI`: render resolution
    /// - `LEXASSIST_MIN_TEXT_CHARS`: OCR fallback threshold
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("LEXASSIST_OCR_LANGUAGE") {
            if !val.trim().is_empty() {
                self.ocr_language = val;
            }
        }
        if let Ok(val) = std::env::var("LEXASSIST_OCR_DPI") {
            if let Ok(n) = val.parse() {
                self.ocr_dpi = n;
            }
        }
        if let Ok(val) = std::env::var("LEXASSIST_MIN_TEXT_CHARS") {
            if let Ok(n) = val.parse() {
                self.min_text_chars = n;
            }
        }
        self
    }
}

/// Web server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind: PORT, HOST, or HOST:PORT.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Request body limit for uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Documents allowed per conversation.
    #[serde(default = "default_max_files")]
    pub max_files_per_session: usize,
    /// Idle seconds before a session is evicted.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Upper bound on sessions held in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_files() -> usize {
    MAX_FILES_UPLOAD
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            max_files_per_session: default_max_files(),
            session_ttl_secs: default_session_ttl_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load the config file, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load("lexassist").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => {
                // No config file found, use defaults with env overrides
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the given format and apply env overrides.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        let config: Config = match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };
        Ok(config.with_env_overrides())
    }

    /// Environment variables win over file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.extraction = self.extraction.with_env_overrides();
        self.openai = self.openai.with_env_overrides();
        self.scraper = self.scraper.with_env_overrides();
        self
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub openai: OpenAiConfig,
    pub scraper: ScraperConfig,
}

impl From<Config> for Settings {
    fn from(config: Config) -> Self {
        Self {
            server: config.server,
            extraction: config.extraction,
            openai: config.openai,
            scraper: config.scraper,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().into()
    }
}

/// Load settings from an explicit path or by discovery.
pub async fn load_settings_with_options(options: LoadOptions) -> anyhow::Result<(Settings, Config)> {
    let config = match options.config_path {
        Some(ref path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            Config::load_from_path(Path::new(&expanded))
                .await
                .map_err(|e| anyhow::anyhow!(e))?
        }
        None => Config::load().await,
    };

    if config.openai.api_key.is_none() {
        tracing::error!("OPENAI_API_KEY is not configured; assistant operations will fail");
    }

    Ok((config.clone().into(), config))
}

/// Default config file location shown by `lexassist config`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexassist")
        .join("lexassist.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = Config::parse(
            r#"
[server]
bind = "0.0.0.0:8080"

[extraction]
ocr_dpi = 300
"#,
            "toml",
        )
        .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.max_files_per_session, MAX_FILES_UPLOAD);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.server.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert_eq!(config.server.max_sessions, DEFAULT_MAX_SESSIONS);
        assert_eq!(config.extraction.min_text_chars, 100);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse("server:\n  max_files_per_session: 5\n", "yaml").unwrap();
        assert_eq!(yaml.server.max_files_per_session, 5);

        let json = Config::parse(r#"{"scraper": {"timeout_secs": 7}}"#, "json").unwrap();
        assert_eq!(json.scraper.timeout_secs, 7);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Config::parse("server = [", "toml").is_err());
    }

    #[test]
    fn test_extraction_base_default() {
        let config = ExtractionConfig::base_default();
        assert_eq!(config.ocr_language, "spa+eng");
        assert_eq!(config.ocr_dpi, 200);
        assert_eq!(config.min_text_chars, 100);
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexassist.toml");
        std::fs::write(&path, "[server]\nbind = \"4000\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.server.bind, "4000");
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }
}
