use crate::models::{DateFormat, DocumentLink, RawDocument, Session, PORTAL_NAME};
use crate::processing::web_scraping::http_client;
use crate::processing::web_scraping::portal::{
    BUYER_KEY, DOCUMENT_NUMBER_LABELS, DUE_DATE_LABELS, FETCH_DETAIL_HEADERS, HEADER_INFO_INITIALIZER,
    HEADER_REGION_SELECTOR, LABEL_CELL_SELECTOR, PO_NUMBER_LABELS, STATUS_KEY, SUBMIT_DATE_KEY, TOTAL_LABELS,
};
use crate::services::pipeline::DetailFetcher;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use shared::{Result, ScraperError};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;
use url::Url;

lazy_static! {
    static ref CURRENCY_SUFFIX: Regex = Regex::new(r"\(([A-Z]{3})\)\s*$").expect("currency pattern is valid");
    // Sign marks only count when they touch the number: a minus right before
    // it, or parentheses wrapping it (currency marks may sit inside).
    static ref SIGNED_AMOUNT: Regex = Regex::new(
        r"(?P<open>\()?\s*(?:[A-Z]{3}|[$€£¥])?\s*(?P<minus>-)?\s*(?:[A-Z]{3}|[$€£¥])?\s*(?P<number>\d[\d,]*(?:\.\d+)?)\s*(?:[A-Z]{3}|[$€£¥])?\s*(?P<close>\))?"
    )
    .expect("amount pattern is valid");
}

pub struct HttpDetailFetcher {
    client: Client,
}

impl HttpDetailFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch(&self, session: &Session, link: &DocumentLink, referer: &Url) -> Result<RawDocument> {
        let date_format = session.date_format()?;
        let response =
            http_client::fetch_document(&self.client, &link.url, &FETCH_DETAIL_HEADERS, &session.cookie, referer)
                .await?;
        parse_detail_page(&response.body, link, date_format)
    }
}

// ============================================================================
// DETAIL PAGE PARSING
// ============================================================================

/// Extracts one document from its detail page.
///
/// Fields come from three places: label/value cells in the page body, the
/// currency suffix of the page header and the JSON handed to the header
/// info widget in an inline script.
pub fn parse_detail_page(html: &str, link: &DocumentLink, date_format: DateFormat) -> Result<RawDocument> {
    let id = link.document_id()?;
    let document = Html::parse_document(html);

    let header_info = extract_header_info(&document)?;
    let status_text = required_item(&header_info, STATUS_KEY)?;
    let buyer = required_item(&header_info, BUYER_KEY)?;
    let submit_date = date_format.parse_date(SUBMIT_DATE_KEY, &required_item(&header_info, SUBMIT_DATE_KEY)?)?;

    let document_number =
        label_value(&document, DOCUMENT_NUMBER_LABELS).ok_or_else(|| ScraperError::missing_field("document number"))?;
    let po_number = label_value(&document, PO_NUMBER_LABELS);
    let due_date = label_value(&document, DUE_DATE_LABELS)
        .map(|text| date_format.parse_date("due date", &text))
        .transpose()?;
    let total_text = label_value(&document, TOTAL_LABELS).ok_or_else(|| ScraperError::missing_field("total"))?;
    let total = parse_amount(&total_text).ok_or_else(|| ScraperError::invalid_field("total", total_text.as_str()))?;

    let currency = extract_currency(&document).ok_or_else(|| ScraperError::CurrencyNotFound {
        url: link.url.to_string(),
    })?;

    debug!("🧾 Parsed {} ({}, {})", document_number, status_text, currency);

    Ok(RawDocument {
        id,
        portal_name: PORTAL_NAME.to_string(),
        document_number,
        po_number,
        buyer,
        status_text,
        submit_date,
        due_date,
        currency,
        total,
    })
}

#[derive(Debug, Deserialize)]
struct HeaderInfo {
    items: Vec<HeaderItem>,
}

#[derive(Debug, Deserialize)]
struct HeaderItem {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Name/value pairs passed to `FGHeaderInfo.init({...})`.
fn extract_header_info(document: &Html) -> Result<HashMap<String, String>> {
    let script_selector = Selector::parse("script").map_err(|e| ScraperError::script_parse(e.to_string()))?;

    let script = document
        .select(&script_selector)
        .map(|s| s.text().collect::<String>())
        .find(|text| text.contains(HEADER_INFO_INITIALIZER))
        .ok_or_else(|| ScraperError::script_parse(format!("{} call not found", HEADER_INFO_INITIALIZER)))?;

    let call_start = script
        .find(HEADER_INFO_INITIALIZER)
        .ok_or_else(|| ScraperError::script_parse(format!("{} call not found", HEADER_INFO_INITIALIZER)))?;
    let after_call = &script[call_start + HEADER_INFO_INITIALIZER.len()..];
    let object_start = after_call
        .find('{')
        .ok_or_else(|| ScraperError::script_parse("header info argument is not an object"))?;

    // Only the first JSON value is read; the trailing `);` is ignored.
    let info: HeaderInfo = serde_json::Deserializer::from_str(&after_call[object_start..])
        .into_iter::<HeaderInfo>()
        .next()
        .ok_or_else(|| ScraperError::script_parse("header info argument is empty"))?
        .map_err(|e| ScraperError::script_parse(format!("invalid header info JSON: {}", e)))?;

    Ok(info
        .items
        .into_iter()
        .map(|item| {
            let value = match item.value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (item.name.trim().to_string(), value.trim().to_string())
        })
        .collect())
}

fn required_item(items: &HashMap<String, String>, key: &str) -> Result<String> {
    items
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ScraperError::missing_field(key))
}

/// Text of the element right after a cell whose own text is one of `labels`.
/// Labels are tried in order; the first one that yields a value wins.
fn label_value(document: &Html, labels: &[&str]) -> Option<String> {
    let cell_selector = Selector::parse(LABEL_CELL_SELECTOR).ok()?;

    labels.iter().find_map(|label| {
        document
            .select(&cell_selector)
            .filter(|cell| normalized_label(cell) == *label)
            .find_map(|cell| {
                cell.next_siblings()
                    .find_map(ElementRef::wrap)
                    .map(|value| collapse_whitespace(&value.text().collect::<String>()))
                    .filter(|value| !value.is_empty())
            })
    })
}

fn normalized_label(cell: &ElementRef) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
        .trim_end_matches(':')
        .trim_end()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_currency(document: &Html) -> Option<String> {
    let selector = Selector::parse(HEADER_REGION_SELECTOR).ok()?;
    document.select(&selector).find_map(|el| {
        let text = collapse_whitespace(&el.text().collect::<String>());
        CURRENCY_SUFFIX
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Parses a displayed amount, dropping currency symbols and thousands separators.
fn parse_amount(text: &str) -> Option<Decimal> {
    let caps = SIGNED_AMOUNT.captures(text)?;
    let digits = caps.name("number")?.as_str().replace(',', "");
    let amount = Decimal::from_str(&digits).ok()?;

    let wrapped = caps.name("open").is_some() && caps.name("close").is_some();
    let negative = wrapped || caps.name("minus").is_some();
    Some(if negative { -amount } else { amount })
}
