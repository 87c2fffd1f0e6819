//! lexassist library crate.
//!
//! - `extract`: text extraction from PDF, DOCX and plain text, with OCR fallback
//! - `openai`: typed client for the hosted Assistants API
//! - `assistant`: upload pipeline, run loop, tools, citations and sessions
//! - `scrapers`: recent bills from the Chamber of Representatives
//! - `server`: HTTP surface
//! - `cli`: command-line entry points

pub mod assistant;
pub mod cli;
pub mod config;
pub mod extract;
pub mod openai;
pub mod scrapers;
pub mod server;
pub mod utils;
