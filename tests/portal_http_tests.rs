mod common;

use common::*;
use fieldglass_scraper::cache::CredentialCache;
use fieldglass_scraper::models::{DocumentOverrides, DocumentStatus, DocumentType, Subcategory};
use fieldglass_scraper::processing::web_scraping::http_client::build_client;
use fieldglass_scraper::processing::web_scraping::{HttpDetailFetcher, HttpDocumentLister, PortalStatusMapper};
use fieldglass_scraper::services::{DetailFetcher, DocumentLister, Pipeline, RetryPolicy, RunRequest};
use fieldglass_scraper::ScraperError;
use rust_decimal::Decimal;
use shared::config::Config;
use shared::types::Credentials;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAST_LISTING: &str = include_str!("fixtures/past_invoice_listing.html");
const INVOICE_DETAIL: &str = include_str!("fixtures/invoice_detail.html");
const NO_CURRENCY_DETAIL: &str = include_str!("fixtures/credit_memo_detail_no_currency.html");

fn http_client() -> reqwest::Client {
    build_client(&Config::default().http).unwrap()
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=UTF-8")
}

#[tokio::test]
async fn archived_listing_posts_dates_in_session_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/past_invoice_list.do"))
        .and(query_param("moduleId", "180"))
        .and(header("cookie", "JSESSIONID=abc; "))
        .and(body_string_contains("filterStartDate=01%2F01%2F2024"))
        .and(body_string_contains("filterEndDate=01%2F31%2F2024"))
        .and(body_string_contains("sgjy_duplicate=tok"))
        .and(body_string_contains("fgGridPager=1"))
        .respond_with(html(PAST_LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let lister = HttpDocumentLister::new(http_client());
    let result = lister
        .list(&session(&server.uri()), DocumentType::Invoice, Subcategory::Archived, &january_2024(), 1)
        .await
        .unwrap();

    let urls: Vec<String> = result.links.iter().map(|l| l.to_string()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/invoice_detail.do?id=A&cf=1", server.uri()),
            format!("{}/invoice_detail.do?id=B&cf=1", server.uri()),
        ]
    );
    assert_eq!(result.total_rows, Some(2));
    assert!(!result.max_row_count_reached);
}

#[tokio::test]
async fn listing_is_retried_after_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/past_crdb_list.do"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/past_crdb_list.do"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"rows":[],"totalRows":0}"#, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let lister = HttpDocumentLister::new(http_client());
    let session = session(&server.uri());
    let range = january_2024();
    let policy = RetryPolicy::new().with_min_backoff(Duration::from_millis(5));

    let result = policy
        .run("archived listing", || {
            lister.list(&session, DocumentType::CreditMemo, Subcategory::Archived, &range, 1)
        })
        .await
        .unwrap();
    assert!(result.links.is_empty());
}

#[tokio::test]
async fn unsupported_date_format_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(html("")).expect(0).mount(&server).await;

    let mut session = session(&server.uri());
    session.date_format = "DD.MM.YYYY".into();

    let err = HttpDocumentLister::new(http_client())
        .list(&session, DocumentType::Invoice, Subcategory::Current, &january_2024(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::UnsupportedDateFormat { .. }));
}

#[tokio::test]
async fn detail_without_currency_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/crdb_detail.do"))
        .and(query_param("id", "CM7"))
        .respond_with(html(NO_CURRENCY_DETAIL))
        .mount(&server)
        .await;

    let link_url = Url::parse(&format!("{}/crdb_detail.do?id=CM7&cf=1", server.uri())).unwrap();
    let referer = Url::parse(&format!("{}/past_crdb_list.do?moduleId=412&cf=1", server.uri())).unwrap();
    let err = HttpDetailFetcher::new(http_client())
        .fetch(
            &session(&server.uri()),
            &fieldglass_scraper::models::DocumentLink::new(link_url),
            &referer,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::CurrencyNotFound { ref url } if url.contains("id=CM7")));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn end_to_end_invoice_run_against_mock_portal() {
    let server = MockServer::start().await;
    let root = server.uri();

    Mock::given(method("POST"))
        .and(path("/invoice_list.do"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"rows":[]}"#, "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/past_invoice_list.do"))
        .respond_with(html(PAST_LISTING))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoice_detail.do"))
        .and(query_param("id", "A"))
        .and(header("Referer", format!("{}/past_invoice_list.do?moduleId=180&cf=1", root).as_str()))
        .respond_with(html(INVOICE_DETAIL))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoice_detail.do"))
        .and(query_param("id", "B"))
        .respond_with(html(INVOICE_DETAIL.replace("Approved - Pending Payment", "Draft")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(CredentialCache::load(dir.path().join("cache.json"))),
        Box::new(FakeAuthenticator::with_root(Arc::new(AtomicUsize::new(0)), &root)),
        Box::new(HttpDocumentLister::new(http_client())),
        Box::new(HttpDetailFetcher::new(http_client())),
        Box::new(PortalStatusMapper),
    )
    .with_retry_policy(RetryPolicy::new().with_min_backoff(Duration::from_millis(1)));

    let request = RunRequest {
        credentials: Credentials::new(root.clone(), "supplier", "hunter22"),
        invoices: Some(january_2024()),
        credit_memos: None,
        overrides: DocumentOverrides::default(),
    };
    let report = pipeline.run(&request).await.unwrap();

    let docs: Vec<_> = report.documents().collect();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "A");
    assert_eq!(docs[0].status, DocumentStatus::Approved);
    assert_eq!(docs[0].currency, "USD");
    assert_eq!(docs[0].total, Decimal::new(1234567, 2));
    assert_eq!(report.drafts_skipped(), 1);
}
