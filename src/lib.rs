//! Fieldglass supplier portal scraper.
//!
//! Logs in through a browser session, lists archived invoices and credit
//! memos over the portal's grid endpoints, reads every detail page and
//! normalizes the portal status before handing documents to a sink.

pub mod cache;
pub mod cache_key;
pub mod cache_ttl;
pub mod models;
pub mod processing;
pub mod services;
pub mod state;

pub use shared::{ErrorClass, Result, ScraperError};
