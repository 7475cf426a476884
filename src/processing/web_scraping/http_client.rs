use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use shared::config::HttpConfig;
use shared::{Result, ScraperError};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// Which side of the portal a request targets; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Listing,
    Detail,
}

impl RequestKind {
    fn failure(self, url: &Url, status: Option<u16>, message: impl Into<String>) -> ScraperError {
        let url = url.to_string();
        let message = message.into();
        match self {
            RequestKind::Listing => ScraperError::ListingRequestFailed { url, status, message },
            RequestKind::Detail => ScraperError::DetailRequestFailed { url, status, message },
        }
    }
}

/// Body and content type of a successful portal response.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub content_type: Option<String>,
    pub body: String,
    pub final_url: Url,
}

impl PortalResponse {
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }
}

pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .build()
        .map_err(|e| ScraperError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// POST a url-encoded form to a listing endpoint.
pub async fn post_form(
    client: &Client,
    url: &Url,
    headers: &[(&str, &str)],
    cookie: &str,
    form: &[(String, String)],
) -> Result<PortalResponse> {
    debug!("🌐 POST {} ({} form fields)", url, form.len());

    let mut request = client.post(url.clone());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let request = request
        .header("cookie", cookie)
        .header("Referer", url.as_str())
        .form(form);

    let response = request
        .send()
        .await
        .map_err(|e| RequestKind::Listing.failure(url, None, e.to_string()))?;

    read_response(RequestKind::Listing, url, response).await
}

/// GET a detail page with the session cookie.
pub async fn fetch_document(
    client: &Client,
    url: &Url,
    headers: &[(&str, &str)],
    cookie: &str,
    referer: &Url,
) -> Result<PortalResponse> {
    debug!("🌐 GET {}", url);

    let mut request = client.get(url.clone());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request
        .header("cookie", cookie)
        .header("Referer", referer.as_str())
        .send()
        .await
        .map_err(|e| RequestKind::Detail.failure(url, None, e.to_string()))?;

    read_response(RequestKind::Detail, url, response).await
}

async fn read_response(kind: RequestKind, url: &Url, response: reqwest::Response) -> Result<PortalResponse> {
    let status = response.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("unexpected status").to_string();
        return Err(kind.failure(url, Some(status.as_u16()), reason));
    }

    let final_url = response.url().clone();
    if &final_url != url {
        info!("🔄 URL redirection detected: {} → {}", url, final_url);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .map_err(|e| kind.failure(url, Some(status.as_u16()), format!("Failed to read response text: {}", e)))?;

    debug!("📄 Fetched {} chars from {}", body.len(), final_url);

    Ok(PortalResponse {
        content_type,
        body,
        final_url,
    })
}
