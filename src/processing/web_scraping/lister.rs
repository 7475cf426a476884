use crate::models::{DateFormat, DocumentLink, DocumentType, ListingPage, ListingResult, Session, Subcategory};
use crate::processing::web_scraping::http_client::{self, PortalResponse};
use crate::processing::web_scraping::portal::{
    listing_body_template, listing_headers, listing_path, CURRENT_LINK_SELECTOR, PAST_LINK_SELECTOR,
};
use crate::services::pipeline::DocumentLister;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use shared::types::DateRange;
use shared::{Result, ScraperError};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

lazy_static! {
    static ref HREF_PATTERN: Regex =
        Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("href pattern is valid");
}

// ============================================================================
// HTTP LISTER
// ============================================================================

/// Lists document links by posting the portal's grid search form.
pub struct HttpDocumentLister {
    client: Client,
}

impl HttpDocumentLister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentLister for HttpDocumentLister {
    async fn list(
        &self,
        session: &Session,
        document_type: DocumentType,
        subcategory: Subcategory,
        range: &DateRange,
        page: u32,
    ) -> Result<ListingResult> {
        let date_format = session.date_format()?;
        let root = root_url(&session.root_url)?;
        let url = listing_url(&root, document_type, subcategory)?;
        let form = build_listing_form(document_type, subcategory, session, date_format, range, page);

        info!(
            "📋 Listing {} {} documents, page {} ({} → {})",
            subcategory,
            document_type,
            page,
            date_format.render(range.from),
            date_format.render(range.to)
        );

        let headers = listing_headers(document_type, subcategory);
        let response = http_client::post_form(&self.client, &url, &headers, &session.cookie, &form).await?;

        let result = parse_listing_response(&response, &root, url)?;
        debug!(
            "Found {} link(s), totalRows={:?}, maxRowCountReached={}",
            result.links.len(),
            result.total_rows,
            result.max_row_count_reached
        );
        Ok(result)
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// Root URL with a trailing slash so relative endpoints resolve beneath it.
pub fn root_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| ScraperError::invalid_field("rootUrl", format!("{} ({})", raw, e)))
}

pub fn listing_url(root: &Url, document_type: DocumentType, subcategory: Subcategory) -> Result<Url> {
    let path = listing_path(document_type, subcategory);
    root.join(path)
        .map_err(|e| ScraperError::invalid_field("listing url", format!("{}{} ({})", root, path, e)))
}

/// Full form body of a listing request: template, dates, pager and tokens.
pub fn build_listing_form(
    document_type: DocumentType,
    subcategory: Subcategory,
    session: &Session,
    date_format: DateFormat,
    range: &DateRange,
    page: u32,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("filterStartDate".to_string(), date_format.render(range.from)),
        ("filterEndDate".to_string(), date_format.render(range.to)),
    ];
    form.extend(
        listing_body_template(document_type, subcategory)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    form.push(("fgGridPager".to_string(), page.to_string()));
    form.push(("sgjy".to_string(), session.csrf_token.clone()));
    form.push(("sgjy_duplicate".to_string(), session.csrf_token.clone()));
    form.push(("__cid".to_string(), session.client_id.clone()));
    form
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

pub fn parse_listing_response(response: &PortalResponse, root: &Url, listing_url: Url) -> Result<ListingResult> {
    let page = if response.is_json() {
        parse_grid_payload(&response.body)?
    } else {
        let payload = extract_grid_payload(&response.body)?;
        parse_grid_payload(&payload)?
    };

    Ok(ListingResult {
        links: extract_links(&page, root)?,
        max_row_count_reached: page.max_row_count_reached,
        total_rows: page.total_rows,
        listing_url,
    })
}

/// Text of the grid wrapper of an HTML listing; the page title decides which wrapper.
pub fn extract_grid_payload(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").map_err(|e| ScraperError::listing_parse(e.to_string()))?;
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().to_lowercase())
        .unwrap_or_default();

    let wrapper = if title.contains("archive") || title.contains("past") {
        PAST_LINK_SELECTOR
    } else {
        CURRENT_LINK_SELECTOR
    };
    let wrapper_selector = Selector::parse(wrapper).map_err(|e| ScraperError::listing_parse(e.to_string()))?;

    let text = document
        .select(&wrapper_selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| ScraperError::listing_parse(format!("grid wrapper {} not found", wrapper)))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ScraperError::listing_parse(format!("grid wrapper {} is empty", wrapper)));
    }
    Ok(text.to_string())
}

pub fn parse_grid_payload(payload: &str) -> Result<ListingPage> {
    serde_json::from_str(payload).map_err(|e| ScraperError::listing_parse(format!("invalid grid payload: {}", e)))
}

/// Detail links of every row, in row order, without duplicates.
pub fn extract_links(page: &ListingPage, root: &Url) -> Result<Vec<DocumentLink>> {
    let mut seen = HashSet::new();
    let mut links = Vec::with_capacity(page.rows.len());

    for (index, row) in page.rows.iter().enumerate() {
        let href = row
            .columns
            .iter()
            .filter_map(|column| column.html.as_deref())
            .find_map(|html| HREF_PATTERN.captures(html))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().replace("&amp;", "&"))
            .ok_or_else(|| ScraperError::listing_parse(format!("row {} has no document link", index)))?;

        let url = root
            .join(&href)
            .map_err(|e| ScraperError::listing_parse(format!("row {} has an invalid link '{}': {}", index, href, e)))?;

        if seen.insert(url.clone()) {
            links.push(DocumentLink::new(url));
        }
    }

    Ok(links)
}
