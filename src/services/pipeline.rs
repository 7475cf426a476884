use crate::cache::SessionCache;
use crate::cache_ttl::get_session_ttl;
use crate::models::{
    DocumentLink, DocumentOverrides, DocumentStatus, DocumentType, ListingResult, NormalizedDocument, RawDocument,
    Session, Subcategory,
};
use crate::processing::web_scraping::portal::MAX_ROWS;
use crate::services::retry::RetryPolicy;
use async_trait::async_trait;
use shared::types::{Credentials, DateRange};
use shared::{Result, ScraperError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

// ============================================================================
// COLLABORATORS
// ============================================================================

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;
}

#[async_trait]
pub trait DocumentLister: Send + Sync {
    /// One page of links for a category/subcategory; `page` is 1-based.
    async fn list(
        &self,
        session: &Session,
        document_type: DocumentType,
        subcategory: Subcategory,
        range: &DateRange,
        page: u32,
    ) -> Result<ListingResult>;
}

#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch(&self, session: &Session, link: &DocumentLink, referer: &Url) -> Result<RawDocument>;
}

pub trait StatusMapper: Send + Sync {
    fn map(&self, status_text: &str) -> Result<DocumentStatus>;
}

// ============================================================================
// RUN TYPES
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub credentials: Credentials,
    pub invoices: Option<DateRange>,
    pub credit_memos: Option<DateRange>,
    pub overrides: DocumentOverrides,
}

impl RunRequest {
    /// Requested categories in extraction order.
    pub fn categories(&self) -> Vec<(DocumentType, DateRange)> {
        [
            (DocumentType::Invoice, self.invoices),
            (DocumentType::CreditMemo, self.credit_memos),
        ]
        .into_iter()
        .filter_map(|(document_type, range)| range.map(|r| (document_type, r)))
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub document_type: DocumentType,
    pub documents: Vec<NormalizedDocument>,
    pub drafts_skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub categories: Vec<CategoryReport>,
}

impl RunReport {
    pub fn documents(&self) -> impl Iterator<Item = &NormalizedDocument> {
        self.categories.iter().flat_map(|c| c.documents.iter())
    }

    pub fn drafts_skipped(&self) -> usize {
        self.categories.iter().map(|c| c.drafts_skipped).sum()
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Session → listing → detail → status mapping, for each requested category.
///
/// The current listing has always been empty in practice and archived
/// listings are capped by the portal at [`MAX_ROWS`] rows. Both assumptions
/// are checked on every run and a violation stops the run with
/// `UnhandledNewLinks` instead of silently skipping documents.
pub struct Pipeline {
    cache: Arc<dyn SessionCache>,
    authenticator: Box<dyn Authenticator>,
    lister: Box<dyn DocumentLister>,
    fetcher: Box<dyn DetailFetcher>,
    mapper: Box<dyn StatusMapper>,
    retry: RetryPolicy,
    session_ttl: Duration,
}

impl Pipeline {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        authenticator: Box<dyn Authenticator>,
        lister: Box<dyn DocumentLister>,
        fetcher: Box<dyn DetailFetcher>,
        mapper: Box<dyn StatusMapper>,
    ) -> Self {
        Self {
            cache,
            authenticator,
            lister,
            fetcher,
            mapper,
            retry: RetryPolicy::default(),
            session_ttl: get_session_ttl(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let session = self.obtain_session(&request.credentials).await?;
        self.extract_all(&session, request).await
    }

    /// Cached session for the credentials, logging in only on a miss.
    pub async fn obtain_session(&self, credentials: &Credentials) -> Result<Session> {
        match self.cache.get(credentials)? {
            Some(session) if session.is_usable() => {
                info!("✅ Reusing cached session for {}", credentials.username);
                return Ok(session);
            }
            Some(_) => debug!("Cached session for {} is past its own expiry", credentials.username),
            None => debug!("Session cache miss for {}", credentials.username),
        }

        let session = self.authenticator.authenticate(credentials).await?;
        self.cache.set(credentials, session.clone(), self.session_ttl)?;
        Ok(session)
    }

    pub async fn extract_all(&self, session: &Session, request: &RunRequest) -> Result<RunReport> {
        let mut report = RunReport::default();
        for (document_type, range) in request.categories() {
            let category = self
                .extract_category(session, document_type, &range, &request.overrides)
                .await?;
            report.categories.push(category);
        }
        Ok(report)
    }

    pub async fn extract_category(
        &self,
        session: &Session,
        document_type: DocumentType,
        range: &DateRange,
        overrides: &DocumentOverrides,
    ) -> Result<CategoryReport> {
        self.check_current_listing(session, document_type, range).await?;
        let (links, referer) = self.collect_archived_links(session, document_type, range).await?;
        info!("📄 {} archived {} link(s) to fetch", links.len(), document_type);

        let mut raw_documents = Vec::with_capacity(links.len());
        for link in &links {
            let raw = self
                .retry
                .run("detail fetch", || self.fetcher.fetch(session, link, &referer))
                .await?;
            raw_documents.push(raw);
        }

        let total = raw_documents.len();
        let kept = exclude_drafts(raw_documents);
        let drafts_skipped = total - kept.len();
        if drafts_skipped > 0 {
            debug!("Skipped {} draft {}(s)", drafts_skipped, document_type);
        }

        let documents = kept
            .into_iter()
            .map(|raw| {
                let status = self.mapper.map(&raw.status_text)?;
                Ok(NormalizedDocument::from_raw(raw, document_type, status, overrides))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("✅ Extracted {} {}(s)", documents.len(), document_type);
        Ok(CategoryReport {
            document_type,
            documents,
            drafts_skipped,
        })
    }

    async fn check_current_listing(
        &self,
        session: &Session,
        document_type: DocumentType,
        range: &DateRange,
    ) -> Result<()> {
        let current = self
            .retry
            .run("current listing", || {
                self.lister.list(session, document_type, Subcategory::Current, range, 1)
            })
            .await?;

        if current.links.is_empty() {
            return Ok(());
        }
        warn!("Current {} listing returned {} link(s)", document_type, current.links.len());
        Err(unhandled(
            document_type,
            Subcategory::Current,
            current.links.len(),
            "the current listing is expected to be empty",
        ))
    }

    async fn collect_archived_links(
        &self,
        session: &Session,
        document_type: DocumentType,
        range: &DateRange,
    ) -> Result<(Vec<DocumentLink>, Url)> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut page = 1;

        loop {
            let result = self
                .retry
                .run("archived listing", || {
                    self.lister.list(session, document_type, Subcategory::Archived, range, page)
                })
                .await?;
            check_row_limits(document_type, &result)?;

            let before = links.len();
            links.extend(result.links.into_iter().filter(|link| seen.insert(link.clone())));
            let added = links.len() - before;

            let more_expected = result.total_rows.map(|total| links.len() < total).unwrap_or(false);
            if !more_expected {
                return Ok((links, result.listing_url));
            }
            if added == 0 {
                warn!(
                    "Archived {} listing stalled at {} of {:?} row(s)",
                    document_type,
                    links.len(),
                    result.total_rows
                );
                return Err(unhandled(
                    document_type,
                    Subcategory::Archived,
                    links.len(),
                    "listing stalled before totalRows",
                ));
            }
            page += 1;
            debug!("Fetching archived {} page {}", document_type, page);
        }
    }
}

fn check_row_limits(document_type: DocumentType, result: &ListingResult) -> Result<()> {
    if result.links.len() > MAX_ROWS {
        return Err(unhandled(
            document_type,
            Subcategory::Archived,
            result.links.len(),
            &format!("more than {} rows on one page", MAX_ROWS),
        ));
    }
    if result.max_row_count_reached {
        return Err(unhandled(
            document_type,
            Subcategory::Archived,
            result.links.len(),
            "the portal truncated the listing",
        ));
    }
    Ok(())
}

fn unhandled(document_type: DocumentType, subcategory: Subcategory, count: usize, reason: &str) -> ScraperError {
    ScraperError::UnhandledNewLinks {
        category: document_type.to_string(),
        subcategory: subcategory.to_string(),
        count,
        reason: reason.to_string(),
    }
}

/// Drops draft documents, keeping the order of the rest.
pub fn exclude_drafts(documents: Vec<RawDocument>) -> Vec<RawDocument> {
    documents.into_iter().filter(|doc| !doc.is_draft()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PORTAL_NAME;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn raw(id: &str, status: &str) -> RawDocument {
        RawDocument {
            id: id.into(),
            portal_name: PORTAL_NAME.into(),
            document_number: format!("INV-{}", id),
            po_number: None,
            buyer: "Acme".into(),
            status_text: status.into(),
            submit_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            due_date: None,
            currency: "USD".into(),
            total: Decimal::ONE,
        }
    }

    fn listing(count: usize, truncated: bool) -> ListingResult {
        let links = (0..count)
            .map(|i| DocumentLink::new(Url::parse(&format!("https://www.fieldglass.net/d.do?id={}", i)).unwrap()))
            .collect();
        ListingResult {
            links,
            max_row_count_reached: truncated,
            total_rows: None,
            listing_url: Url::parse("https://www.fieldglass.net/past_invoice_list.do").unwrap(),
        }
    }

    #[test]
    fn drafts_are_removed_in_order() {
        let docs = vec![raw("1", "Paid"), raw("2", "Draft"), raw("3", "Approved"), raw("4", "draft")];
        let ids: Vec<_> = exclude_drafts(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn row_limits() {
        assert!(check_row_limits(DocumentType::Invoice, &listing(MAX_ROWS, false)).is_ok());
        assert!(matches!(
            check_row_limits(DocumentType::Invoice, &listing(MAX_ROWS + 1, false)),
            Err(ScraperError::UnhandledNewLinks { count, .. }) if count == MAX_ROWS + 1
        ));
        assert!(matches!(
            check_row_limits(DocumentType::CreditMemo, &listing(3, true)),
            Err(ScraperError::UnhandledNewLinks { subcategory, .. }) if subcategory == "archived"
        ));
    }

    #[test]
    fn categories_keep_request_order() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();
        let request = RunRequest {
            credentials: Credentials::new("https://www.fieldglass.net", "u", "p"),
            invoices: None,
            credit_memos: Some(range),
            overrides: DocumentOverrides::default(),
        };
        let kinds: Vec<_> = request.categories().into_iter().map(|(t, _)| t).collect();
        assert_eq!(kinds, vec![DocumentType::CreditMemo]);
    }
}
