#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use fieldglass_scraper::models::{
    DocumentLink, DocumentType, ListingResult, NormalizedDocument, RawDocument, Session, Subcategory, PORTAL_NAME,
};
use fieldglass_scraper::services::{
    AuthEvent, AuthEventNotifier, Authenticator, DetailFetcher, DocumentLister, DocumentSink, PasswordResolver,
};
use fieldglass_scraper::{Result, ScraperError};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::types::{Credentials, DateRange};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

pub const ROOT: &str = "https://www.fieldglass.net";

pub fn credentials() -> Credentials {
    Credentials::new(ROOT, "supplier", "hunter22")
}

pub fn session(root_url: &str) -> Session {
    Session {
        cookie: "JSESSIONID=abc; ".into(),
        csrf_token: "tok".into(),
        client_id: "cid".into(),
        expires_at: i64::MAX,
        root_url: root_url.into(),
        username: "supplier".into(),
        date_format: "MM/DD/YYYY".into(),
    }
}

pub fn january_2024() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
}

pub fn link(id: &str) -> DocumentLink {
    DocumentLink::new(Url::parse(&format!("{}/invoice_detail.do?id={}&cf=1", ROOT, id)).unwrap())
}

pub fn listing(ids: &[&str], total_rows: Option<usize>, truncated: bool) -> ListingResult {
    ListingResult {
        links: ids.iter().map(|id| link(id)).collect(),
        max_row_count_reached: truncated,
        total_rows,
        listing_url: Url::parse(&format!("{}/past_invoice_list.do?moduleId=180&cf=1", ROOT)).unwrap(),
    }
}

pub fn raw(id: &str, status: &str) -> RawDocument {
    RawDocument {
        id: id.into(),
        portal_name: PORTAL_NAME.into(),
        document_number: format!("INV-{}", id),
        po_number: Some("PO-1".into()),
        buyer: "Acme Corporation".into(),
        status_text: status.into(),
        submit_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        due_date: None,
        currency: "USD".into(),
        total: Decimal::new(10000, 2),
    }
}

// ============================================================================
// FAKE COLLABORATORS
// ============================================================================

pub enum AuthBehavior {
    Succeed,
    BadCredentials,
}

pub struct FakeAuthenticator {
    pub calls: Arc<AtomicUsize>,
    behavior: AuthBehavior,
    root_url: String,
}

impl FakeAuthenticator {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self::with_root(calls, ROOT)
    }

    pub fn with_root(calls: Arc<AtomicUsize>, root_url: &str) -> Self {
        Self {
            calls,
            behavior: AuthBehavior::Succeed,
            root_url: root_url.to_string(),
        }
    }

    pub fn rejecting(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            behavior: AuthBehavior::BadCredentials,
            root_url: ROOT.to_string(),
        }
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self, _credentials: &Credentials) -> Result<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            AuthBehavior::Succeed => Ok(session(&self.root_url)),
            AuthBehavior::BadCredentials => Err(ScraperError::bad_credentials("wrong password")),
        }
    }
}

/// Lister answering from a table keyed by (category, subcategory, page).
/// Missing entries answer with an empty page.
#[derive(Default)]
pub struct ScriptedLister {
    pages: HashMap<(DocumentType, Subcategory, u32), ListingResult>,
    pub requests: Arc<Mutex<Vec<(DocumentType, Subcategory, u32)>>>,
}

impl ScriptedLister {
    pub fn with_page(mut self, document_type: DocumentType, subcategory: Subcategory, page: u32, result: ListingResult) -> Self {
        self.pages.insert((document_type, subcategory, page), result);
        self
    }
}

#[async_trait]
impl DocumentLister for ScriptedLister {
    async fn list(
        &self,
        _session: &Session,
        document_type: DocumentType,
        subcategory: Subcategory,
        _range: &DateRange,
        page: u32,
    ) -> Result<ListingResult> {
        self.requests.lock().push((document_type, subcategory, page));
        Ok(self
            .pages
            .get(&(document_type, subcategory, page))
            .cloned()
            .unwrap_or_else(|| listing(&[], None, false)))
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    documents: HashMap<String, RawDocument>,
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn with_document(mut self, doc: RawDocument) -> Self {
        self.documents.insert(doc.id.clone(), doc);
        self
    }
}

#[async_trait]
impl DetailFetcher for FakeFetcher {
    async fn fetch(&self, _session: &Session, link: &DocumentLink, _referer: &Url) -> Result<RawDocument> {
        let id = link.document_id()?;
        self.fetched.lock().push(id.clone());
        self.documents
            .get(&id)
            .cloned()
            .ok_or_else(|| ScraperError::missing_field("document number"))
    }
}

#[derive(Default)]
pub struct CollectingSink {
    pub delivered: Mutex<Vec<NormalizedDocument>>,
    pub fail_ids: Vec<String>,
}

#[async_trait]
impl DocumentSink for CollectingSink {
    async fn deliver(&self, document: &NormalizedDocument) -> Result<()> {
        if self.fail_ids.contains(&document.id) {
            return Err(ScraperError::Delivery {
                message: format!("queue rejected {}", document.id),
            });
        }
        self.delivered.lock().push(document.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<AuthEvent>>,
}

#[async_trait]
impl AuthEventNotifier for RecordingNotifier {
    async fn authentication_succeeded(&self, event: &AuthEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    async fn authentication_failed(&self, event: &AuthEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

pub struct StaticPasswords(pub HashMap<String, String>);

#[async_trait]
impl PasswordResolver for StaticPasswords {
    async fn resolve(&self, key: &str) -> Result<String> {
        self.0
            .get(key)
            .cloned()
            .ok_or_else(|| ScraperError::configuration(format!("unknown key {}", key)))
    }
}
