use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{Result, ScraperError};
use std::fmt;
use std::str::FromStr;

/// Authenticated portal context obtained by logging in.
///
/// Field names on the wire follow the portal's own vocabulary so that the
/// persisted cache file stays readable next to captured requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cookie: String,
    #[serde(rename = "sgjy")]
    pub csrf_token: String,
    #[serde(rename = "__cid")]
    pub client_id: String,
    /// Absolute expiry, epoch milliseconds.
    #[serde(rename = "expiration")]
    pub expires_at: i64,
    #[serde(rename = "rootUrl")]
    pub root_url: String,
    pub username: String,
    /// Raw display pattern reported by the portal, e.g. `MM/DD/YYYY`.
    #[serde(rename = "dateFormat")]
    pub date_format: String,
}

impl Session {
    pub fn is_usable_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }

    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now().timestamp_millis())
    }

    /// Parses the portal date pattern; unsupported patterns fail here, not at login.
    pub fn date_format(&self) -> Result<DateFormat> {
        self.date_format.parse()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &format_args!("<{} bytes>", self.cookie.len()))
            .field("csrf_token", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("expires_at", &self.expires_at)
            .field("root_url", &self.root_url)
            .field("username", &self.username)
            .field("date_format", &self.date_format)
            .finish()
    }
}

/// Date display patterns a portal account can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

impl DateFormat {
    /// Equivalent `chrono` format string.
    pub fn chrono_pattern(self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::YearMonthDay => "%Y/%m/%d",
        }
    }

    pub fn render(self, date: NaiveDate) -> String {
        date.format(self.chrono_pattern()).to_string()
    }

    pub fn parse_date(self, field: &str, text: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), self.chrono_pattern())
            .map_err(|_| ScraperError::invalid_field(field, text))
    }
}

impl FromStr for DateFormat {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "MM/DD/YYYY" => Ok(DateFormat::MonthDayYear),
            "DD/MM/YYYY" => Ok(DateFormat::DayMonthYear),
            "YYYY/MM/DD" => Ok(DateFormat::YearMonthDay),
            other => Err(ScraperError::UnsupportedDateFormat {
                format: other.to_string(),
            }),
        }
    }
}
