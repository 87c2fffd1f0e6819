//! Scraper configuration.

use serde::{Deserialize, Serialize};

/// Listing of bills in the Chamber of Representatives.
pub const CAMARA_BILLS_URL: &str = "https://www.camara.gov.co/secretaria/proyectos-de-ley#menu";

/// Base used to resolve relative links on the listing.
pub const CAMARA_BASE_URL: &str = "https://www.camara.gov.co";

/// Configuration for the bills scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Page listing recent bills.
    #[serde(default = "default_bills_url")]
    pub bills_url: String,
    /// Base for relative links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User agent: unset for the default browser UA, "impersonate" to
    /// rotate real browser UAs, anything else is sent as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Rows returned by `bills` and the scrape endpoint.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Rows handed to the assistant tool.
    #[serde(default = "default_tool_limit")]
    pub tool_limit: usize,
}

fn default_bills_url() -> String {
    CAMARA_BILLS_URL.to_string()
}

fn default_base_url() -> String {
    CAMARA_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_limit() -> usize {
    15
}

fn default_tool_limit() -> usize {
    5
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl ScraperConfig {
    pub fn base_default() -> Self {
        Self {
            bills_url: default_bills_url(),
            base_url: default_base_url(),
            user_agent: None,
            timeout_secs: default_timeout_secs(),
            default_limit: default_limit(),
            tool_limit: default_tool_limit(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `LEXASSIST_USER_AGENT`: user agent mode or string
    /// - `LEXASSIST_BILLS_URL`: alternative listing page
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("LEXASSIST_USER_AGENT") {
            if !val.trim().is_empty() {
                self.user_agent = Some(val);
            }
        }
        if let Ok(val) = std::env::var("LEXASSIST_BILLS_URL") {
            self.bills_url = val;
        }
        self
    }

    pub fn with_urls(mut self, bills_url: &str, base_url: &str) -> Self {
        self.bills_url = bills_url.to_string();
        self.base_url = base_url.to_string();
        self
    }
}
