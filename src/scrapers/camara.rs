//! Recent bills from the Colombian Chamber of Representatives.
//!
//! The listing is a plain HTML table (`table.table > tbody >
//! tr.tablacomispro`) whose first three cells hold the bill number, the
//! title (usually a link to the bill's page) and its status.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use super::config::ScraperConfig;
use super::user_agent::resolve_user_agent;

/// Placeholder for rows without a usable link.
pub const NO_LINK: &str = "N/A";

/// Errors that can occur while scraping.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No bills table found at {0}")]
    TableNotFound(String),

    #[error("Bills table has no body")]
    BodyNotFound,

    #[error("Invalid selector {0}")]
    Selector(String),
}

/// A bill as listed by the Chamber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "Número")]
    pub number: String,
    #[serde(rename = "Título")]
    pub title: String,
    #[serde(rename = "Estado")]
    pub status: String,
    #[serde(rename = "Enlace")]
    pub link: String,
}

/// Scraper for the Chamber's bills listing.
#[derive(Debug, Clone)]
pub struct CamaraScraper {
    client: Client,
    config: ScraperConfig,
}

impl CamaraScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(config.user_agent.as_deref()))
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch and parse up to `limit` of the most recent bills.
    pub async fn recent_bills(&self, limit: usize) -> Result<Vec<Bill>, ScrapeError> {
        info!("Fetching bills from {}", self.config.bills_url);

        let body = self
            .client
            .get(&self.config.bills_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let bills = parse_bills(&body, &self.config.base_url, limit).map_err(|e| {
            error!("Could not parse bills from {}: {}", self.config.bills_url, e);
            match e {
                ScrapeError::TableNotFound(_) => {
                    ScrapeError::TableNotFound(self.config.bills_url.clone())
                }
                other => other,
            }
        })?;

        info!("Parsed {} bills", bills.len());
        Ok(bills)
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("'{}': {}", css, e)))
}

/// Text of an element: its whitespace-trimmed text nodes, concatenated.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse the bills listing.
pub fn parse_bills(html: &str, base_url: &str, limit: usize) -> Result<Vec<Bill>, ScrapeError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table.table")?;
    let tbody_sel = selector("tbody")?;
    let row_sel = selector("tr.tablacomispro")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::TableNotFound("document".to_string()))?;
    let tbody = table
        .select(&tbody_sel)
        .next()
        .ok_or(ScrapeError::BodyNotFound)?;

    let base = Url::parse(base_url).ok();

    let bills = tbody
        .select(&row_sel)
        .take(limit)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.len() <= 2 {
                return None;
            }

            let title_link = cells[1].select(&link_sel).next();
            let title = match title_link {
                Some(a) => stripped_text(a),
                None => stripped_text(cells[1]),
            };
            let link = title_link
                .and_then(|a| a.value().attr("href"))
                .filter(|href| !href.is_empty())
                .map(|href| resolve_link(base.as_ref(), href))
                .unwrap_or_else(|| NO_LINK.to_string());

            Some(Bill {
                number: stripped_text(cells[0]),
                title,
                status: stripped_text(cells[2]),
                link,
            })
        })
        .collect();

    Ok(bills)
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// JSON handed back to the assistant when it asks for recent bills.
pub fn bills_tool_payload(result: &Result<Vec<Bill>, ScrapeError>) -> String {
    let value = match result {
        Ok(bills) if bills.is_empty() => json!({
            "info": "No se encontraron propuestas de ley recientes en la fuente."
        }),
        Ok(bills) => json!({
            "propuestas": bills
                .iter()
                .map(|b| json!({ "Número": b.number, "Título": b.title }))
                .collect::<Vec<_>>()
        }),
        Err(_) => json!({
            "error": "No se pudo obtener la información de propuestas desde la fuente."
        }),
    };
    value.to_string()
}
