use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Result, ScraperError};
use std::fmt;
use url::Url;

pub const PORTAL_NAME: &str = "Fieldglass";

// ============================================================================
// CATEGORIES
// ============================================================================

/// Document category requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Invoice")]
    Invoice,
    #[serde(rename = "Credit Memo")]
    CreditMemo,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentType::Invoice => f.write_str("invoice"),
            DocumentType::CreditMemo => f.write_str("credit memo"),
        }
    }
}

/// The portal's two document-age buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcategory {
    Current,
    Archived,
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcategory::Current => f.write_str("current"),
            Subcategory::Archived => f.write_str("archived"),
        }
    }
}

// ============================================================================
// LISTING
// ============================================================================

/// URL of one document's detail page, discovered in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentLink {
    pub url: Url,
}

impl DocumentLink {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Document id carried by the link's `id` query parameter.
    pub fn document_id(&self) -> Result<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ScraperError::missing_field("id"))
    }
}

impl fmt::Display for DocumentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridColumn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridRow {
    pub columns: Vec<GridColumn>,
}

/// Grid payload embedded in a listing response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    pub rows: Vec<GridRow>,
    #[serde(rename = "maxRowCountReached", default)]
    pub max_row_count_reached: bool,
    #[serde(rename = "totalRows", default)]
    pub total_rows: Option<usize>,
}

/// Links discovered by one listing request.
#[derive(Debug, Clone)]
pub struct ListingResult {
    pub links: Vec<DocumentLink>,
    pub max_row_count_reached: bool,
    pub total_rows: Option<usize>,
    /// Endpoint that was queried, used as referer for detail requests.
    pub listing_url: Url,
}

// ============================================================================
// DOCUMENTS
// ============================================================================

/// Fields read from one detail page, before status normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub portal_name: String,
    pub document_number: String,
    pub po_number: Option<String>,
    pub buyer: String,
    pub status_text: String,
    pub submit_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub total: Decimal,
}

impl RawDocument {
    pub fn is_draft(&self) -> bool {
        self.status_text.trim().eq_ignore_ascii_case("draft")
    }
}

/// Closed set of statuses downstream accounting understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Canceled")]
    Canceled,
}

/// Caller-supplied metadata merged into every delivered document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOverrides {
    pub portal_user_id: String,
    pub customer_name: String,
    pub portal_user: String,
    pub username: String,
}

/// Terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub id: String,
    pub portal_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub po_number: Option<String>,
    pub buyer: String,
    pub status: DocumentStatus,
    pub submit_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub total: Decimal,
    #[serde(flatten)]
    pub overrides: DocumentOverrides,
}

impl NormalizedDocument {
    pub fn from_raw(
        raw: RawDocument,
        document_type: DocumentType,
        status: DocumentStatus,
        overrides: &DocumentOverrides,
    ) -> Self {
        Self {
            id: raw.id,
            portal_name: raw.portal_name,
            document_type,
            document_number: raw.document_number,
            po_number: raw.po_number,
            buyer: raw.buyer,
            status,
            submit_date: raw.submit_date,
            due_date: raw.due_date,
            currency: raw.currency,
            total: raw.total,
            overrides: overrides.clone(),
        }
    }
}
