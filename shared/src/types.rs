//! Run input and credential types shared by the scraper crates

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::error::{Result, ScraperError};
use crate::utils::mask;

pub const DEFAULT_ROOT_URL: &str = "https://www.fieldglass.net";

fn default_root_url() -> String {
    DEFAULT_ROOT_URL.to_string()
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Login triple for one portal user. Also the identity of a cached session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub root_url: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        root_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            root_url: root_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("root_url", &self.root_url)
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

// ============================================================================
// DATE RANGES
// ============================================================================

/// Inclusive date range requested for one document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ScraperError::input_validation(format!(
                "fromDate {} is after toDate {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRangeInput {
    #[serde(rename = "fromDate", default)]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "toDate", default)]
    pub to_date: Option<NaiveDate>,
}

impl DateRangeInput {
    /// Fills missing bounds: `toDate` defaults to `today`, `fromDate` to one year before `toDate`.
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange> {
        let to = self.to_date.unwrap_or(today);
        let from = match self.from_date {
            Some(from) => from,
            None => to
                .checked_sub_months(Months::new(12))
                .ok_or_else(|| ScraperError::input_validation(format!("toDate {} out of range", to)))?,
        };
        DateRange::new(from, to)
    }
}

// ============================================================================
// RUN INPUT
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_password_source"))]
pub struct PortalUser {
    #[serde(rename = "_id")]
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub customer: String,
    #[serde(rename = "rootUrl", default = "default_root_url")]
    #[validate(url)]
    pub root_url: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "passwordKey", default, skip_serializing_if = "Option::is_none")]
    pub password_key: Option<String>,
}

impl fmt::Debug for PortalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalUser")
            .field("id", &self.id)
            .field("customer", &self.customer)
            .field("root_url", &self.root_url)
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(mask))
            .field("password_key", &self.password_key)
            .finish()
    }
}

fn validate_password_source(user: &PortalUser) -> std::result::Result<(), ValidationError> {
    match (&user.password, &user.password_key) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => {
            let mut err = ValidationError::new("password_source");
            err.message = Some("exactly one of password or passwordKey is required".into());
            Err(err)
        }
    }
}

/// Job description handed to the scraper, as received from the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_date_ranges"))]
pub struct ScraperInput {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub portal_id: Option<String>,
    #[serde(rename = "eventBus", default)]
    pub event_bus: Option<String>,
    #[validate(nested)]
    pub user: PortalUser,
    #[serde(default)]
    pub invoices: Option<DateRangeInput>,
    #[serde(rename = "creditMemos", default)]
    pub credit_memos: Option<DateRangeInput>,
}

fn validate_date_ranges(input: &ScraperInput) -> std::result::Result<(), ValidationError> {
    for range in [&input.invoices, &input.credit_memos].into_iter().flatten() {
        if let (Some(from), Some(to)) = (range.from_date, range.to_date) {
            if from > to {
                let mut err = ValidationError::new("date_range");
                err.message = Some(format!("fromDate {} is after toDate {}", from, to).into());
                return Err(err);
            }
        }
    }
    Ok(())
}

impl ScraperInput {
    /// Parses and validates the raw JSON input of a run.
    pub fn parse(raw: &str) -> Result<Self> {
        let input: ScraperInput = serde_json::from_str(raw)
            .map_err(|e| ScraperError::input_validation(format!("malformed input: {}", e)))?;
        input
            .validate()
            .map_err(|e| ScraperError::input_validation(e.to_string()))?;
        Ok(input)
    }

    /// Copy of the input that is safe to log.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.user.password = masked.user.password.as_deref().map(mask);
        masked
    }
}
