//! Shared library for the Fieldglass scraper workspace
//!
//! This library contains functionality used by the scraper crate:
//! - Configuration loaded from the environment
//! - The error taxonomy of a run
//! - Run input and credential types
//! - Common utilities

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{ErrorClass, Result, ScraperError};
