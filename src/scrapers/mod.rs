//! Scrapers for public legislative sources.

pub mod camara;
pub mod config;
pub mod user_agent;

pub use camara::{bills_tool_payload, parse_bills, Bill, CamaraScraper, ScrapeError, NO_LINK};
pub use config::{ScraperConfig, CAMARA_BASE_URL, CAMARA_BILLS_URL};
pub use user_agent::resolve_user_agent;
