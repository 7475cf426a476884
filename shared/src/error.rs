//! Error taxonomy for the scraper
//!
//! Every failure of a run ends up as one [`ScraperError`]. Variants are grouped
//! into an [`ErrorClass`] that decides retrying, lifecycle notifications and
//! the process exit code.

use serde::Serialize;

pub type Result<T> = std::result::Result<T, ScraperError>;

/// Coarse grouping of [`ScraperError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    InputValidation,
    Authentication,
    TransientNetwork,
    Structural,
    UnhandledGrowth,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------
    #[error("Input validation error: {message}")]
    InputValidation { message: String },

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------
    #[error("Authentication failed: bad credentials ({message})")]
    AuthenticationBadCredentials { message: String },

    #[error("Authentication failed: the portal requires a password change ({message})")]
    AuthenticationChangePassword { message: String },

    #[error("Authentication failed: a portal session is already active for this user")]
    SessionAlreadyActive,

    #[error("Authentication failure: {message}")]
    AuthenticationFailure { message: String },

    // ------------------------------------------------------------------
    // Network (retryable)
    // ------------------------------------------------------------------
    #[error("Listing request failed for {url} (status {status:?}): {message}")]
    ListingRequestFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Detail request failed for {url} (status {status:?}): {message}")]
    DetailRequestFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    // ------------------------------------------------------------------
    // Structural / parse
    // ------------------------------------------------------------------
    #[error("Unsupported portal date format: {format}")]
    UnsupportedDateFormat { format: String },

    #[error("Listing parse error: {message}")]
    ListingParse { message: String },

    #[error("Script parse error: {message}")]
    ScriptParse { message: String },

    #[error("Required field not found: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidField { field: String, value: String },

    #[error("Currency not found on detail page {url}")]
    CurrencyNotFound { url: String },

    #[error("Unknown document status: '{status}'")]
    UnknownStatus { status: String },

    // ------------------------------------------------------------------
    // Pagination invariants
    // ------------------------------------------------------------------
    #[error("Unhandled new links in {category} / {subcategory}: {count} link(s), {reason}")]
    UnhandledNewLinks {
        category: String,
        subcategory: String,
        count: usize,
        reason: String,
    },

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Delivery error: {message}")]
    Delivery { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScraperError {
    pub fn input_validation(message: impl Into<String>) -> Self {
        Self::InputValidation {
            message: message.into(),
        }
    }

    pub fn bad_credentials(message: impl Into<String>) -> Self {
        Self::AuthenticationBadCredentials {
            message: message.into(),
        }
    }

    pub fn change_password(message: impl Into<String>) -> Self {
        Self::AuthenticationChangePassword {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationFailure {
            message: message.into(),
        }
    }

    pub fn listing_parse(message: impl Into<String>) -> Self {
        Self::ListingParse {
            message: message.into(),
        }
    }

    pub fn script_parse(message: impl Into<String>) -> Self {
        Self::ScriptParse {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ScraperError::InputValidation { .. } => ErrorClass::InputValidation,
            ScraperError::AuthenticationBadCredentials { .. }
            | ScraperError::AuthenticationChangePassword { .. }
            | ScraperError::SessionAlreadyActive
            | ScraperError::AuthenticationFailure { .. } => ErrorClass::Authentication,
            ScraperError::ListingRequestFailed { .. } | ScraperError::DetailRequestFailed { .. } => {
                ErrorClass::TransientNetwork
            }
            ScraperError::UnsupportedDateFormat { .. }
            | ScraperError::ListingParse { .. }
            | ScraperError::ScriptParse { .. }
            | ScraperError::MissingField { .. }
            | ScraperError::InvalidField { .. }
            | ScraperError::CurrencyNotFound { .. }
            | ScraperError::UnknownStatus { .. } => ErrorClass::Structural,
            ScraperError::UnhandledNewLinks { .. } => ErrorClass::UnhandledGrowth,
            ScraperError::Configuration { .. }
            | ScraperError::Cache { .. }
            | ScraperError::Delivery { .. }
            | ScraperError::Serialization(_)
            | ScraperError::Io(_) => ErrorClass::Internal,
        }
    }

    /// Only response-status and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::TransientNetwork
    }

    /// Errors that must be reported as an authentication failure lifecycle event.
    pub fn is_auth_failure_event(&self) -> bool {
        matches!(
            self,
            ScraperError::AuthenticationBadCredentials { .. }
                | ScraperError::AuthenticationChangePassword { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ScraperError::InputValidation { .. } => "SCRAPER_INPUT_VALIDATION_ERROR",
            ScraperError::AuthenticationBadCredentials { .. } => "AUTHENTICATION_BAD_CREDENTIALS",
            ScraperError::AuthenticationChangePassword { .. } => "AUTHENTICATION_CHANGE_PASSWORD",
            ScraperError::SessionAlreadyActive => "SESSION_ALREADY_ACTIVE",
            ScraperError::AuthenticationFailure { .. } => "AUTHENTICATION_FAILURE",
            ScraperError::ListingRequestFailed { .. } => "LISTING_REQUEST_FAILED",
            ScraperError::DetailRequestFailed { .. } => "DETAIL_REQUEST_FAILED",
            ScraperError::UnsupportedDateFormat { .. } => "UNSUPPORTED_DATE_FORMAT",
            ScraperError::ListingParse { .. } => "LISTING_PARSE_ERROR",
            ScraperError::ScriptParse { .. } => "SCRIPT_PARSE_ERROR",
            ScraperError::MissingField { .. } => "MISSING_FIELD",
            ScraperError::InvalidField { .. } => "INVALID_FIELD",
            ScraperError::CurrencyNotFound { .. } => "CURRENCY_NOT_FOUND",
            ScraperError::UnknownStatus { .. } => "UNKNOWN_STATUS",
            ScraperError::UnhandledNewLinks { .. } => "UNHANDLED_NEW_LINKS",
            ScraperError::Configuration { .. } => "CONFIG_ERROR",
            ScraperError::Cache { .. } => "CACHE_ERROR",
            ScraperError::Delivery { .. } => "DELIVERY_ERROR",
            ScraperError::Serialization(_) => "SERIALIZATION_ERROR",
            ScraperError::Io(_) => "IO_ERROR",
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::InputValidation => 2,
            ErrorClass::Authentication => 3,
            ErrorClass::UnhandledGrowth => 4,
            ErrorClass::TransientNetwork | ErrorClass::Structural | ErrorClass::Internal => 1,
        }
    }

    /// URL of the page the error happened on, when the variant knows it.
    pub fn page_context(&self) -> Option<&str> {
        match self {
            ScraperError::ListingRequestFailed { url, .. }
            | ScraperError::DetailRequestFailed { url, .. }
            | ScraperError::CurrencyNotFound { url } => Some(url),
            _ => None,
        }
    }
}
