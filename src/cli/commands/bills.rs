//! Recent bills listing.

use console::style;

use crate::config::Settings;
use crate::scrapers::{CamaraScraper, NO_LINK};
use crate::utils::preview;

pub async fn cmd_bills(settings: &Settings, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let scraper = CamaraScraper::new(settings.scraper.clone())?;
    let limit = limit.unwrap_or(settings.scraper.default_limit);
    let bills = scraper.recent_bills(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bills)?);
        return Ok(());
    }

    if bills.is_empty() {
        println!("{} No bills found", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Recent bills").bold());
    println!("{}", "-".repeat(70));
    for bill in &bills {
        println!(
            "{:<14} {}",
            style(&bill.number).cyan(),
            preview(&bill.title, 90)
        );
        println!("{:<14} {}", "", style(&bill.status).dim());
        if bill.link != NO_LINK {
            println!("{:<14} {}", "", style(&bill.link).dim());
        }
    }
    println!("\n{} bills", bills.len());
    Ok(())
}
