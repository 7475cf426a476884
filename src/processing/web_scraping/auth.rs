use crate::models::Session;
use crate::processing::web_scraping::portal::{
    CHANGE_PASSWORD_HEADER_SELECTOR, COOKIE_STATEMENT_BUTTON_SELECTOR, COOKIE_STATEMENT_SELECTOR,
    PASSWORD_INPUT_SELECTOR, SESSION_ALREADY_ACTIVE_SELECTOR, USERNAME_INPUT_SELECTOR,
    WRONG_IDENTIFIERS_HEADER_SELECTOR,
};
use crate::services::pipeline::Authenticator;
use async_trait::async_trait;
use chrono::Utc;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use shared::config::BrowserConfig;
use shared::types::Credentials;
use shared::{Result, ScraperError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const ENTER_KEY: &str = "\u{e007}";

const PORTAL_CONTEXT_SCRIPT: &str = r#"
return {
    csrfToken: window._CSRF_TOKEN_VALUE || null,
    clientId: window.__cid || null,
    dateFormat: typeof window.getDateFormat === 'function' ? window.getDateFormat() : null
};
"#;

// ============================================================================
// BROWSER AUTHENTICATOR
// ============================================================================

/// Logs in through a real browser session driven over WebDriver.
///
/// The login form is typed one character at a time; the portal rejects
/// input that arrives faster than a person could type it.
pub struct BrowserAuthenticator {
    config: BrowserConfig,
    session_ttl: Duration,
}

impl BrowserAuthenticator {
    pub fn new(config: BrowserConfig, session_ttl: Duration) -> Self {
        Self { config, session_ttl }
    }

    async fn connect(&self) -> Result<Client> {
        debug!("🌐 Connecting to WebDriver at {}", self.config.webdriver_url);
        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities(self.config.headless));
        builder
            .connect(&self.config.webdriver_url)
            .await
            .map_err(|e| ScraperError::authentication(format!("WebDriver connection failed: {}", e)))
    }

    async fn login(&self, client: &Client, credentials: &Credentials) -> Result<Session> {
        client.goto(&credentials.root_url).await.map_err(browser_error)?;

        if client.find(Locator::Css(COOKIE_STATEMENT_SELECTOR)).await.is_ok() {
            debug!("🍪 Accepting cookie statement");
            self.wait_for(client, COOKIE_STATEMENT_BUTTON_SELECTOR)
                .await?
                .click()
                .await
                .map_err(browser_error)?;
        }

        let username = self.wait_for(client, USERNAME_INPUT_SELECTOR).await?;
        self.type_slowly(&username, &credentials.username).await?;
        tokio::time::sleep(self.settle_delay()).await;

        let password = self.wait_for(client, PASSWORD_INPUT_SELECTOR).await?;
        self.type_slowly(&password, &credentials.password).await?;
        password.send_keys(ENTER_KEY).await.map_err(browser_error)?;

        let context = self.wait_for_portal_context(client).await?;
        let cookies = client
            .get_all_cookies()
            .await
            .map_err(browser_error)?
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect::<Vec<_>>();

        let expires_at = session_expiry(Utc::now().timestamp_millis(), self.session_ttl)?;
        let session = context.into_session(compose_cookie_header(&cookies), credentials, expires_at)?;

        info!("🔐 Logged in to {} as {}", credentials.root_url, credentials.username);
        Ok(session)
    }

    /// Polls until the landing page exposes all of its tokens, failing early on a login banner.
    async fn wait_for_portal_context(&self, client: &Client) -> Result<PortalContext> {
        let deadline = Instant::now() + Duration::from_secs(self.config.navigation_timeout_seconds);

        loop {
            tokio::time::sleep(self.settle_delay()).await;
            check_login_banners(client).await?;

            let raw = client
                .execute(PORTAL_CONTEXT_SCRIPT, Vec::new())
                .await
                .map_err(browser_error)?;
            let context: PortalContext = serde_json::from_value(raw)?;
            if context.is_complete() || Instant::now() >= deadline {
                return Ok(context);
            }
            debug!("Waiting for the portal landing page");
        }
    }

    async fn wait_for(&self, client: &Client, selector: &str) -> Result<Element> {
        client
            .wait()
            .at_most(Duration::from_secs(self.config.navigation_timeout_seconds))
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| ScraperError::authentication(format!("{} not found: {}", selector, e)))
    }

    async fn type_slowly(&self, element: &Element, text: &str) -> Result<()> {
        let delay = Duration::from_millis(self.config.keystroke_delay_ms);
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            element
                .send_keys(ch.encode_utf8(&mut buf))
                .await
                .map_err(browser_error)?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.settle_delay_ms)
    }
}

#[async_trait]
impl Authenticator for BrowserAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        info!("🔑 Authenticating {} on {}", credentials.username, credentials.root_url);
        let client = self.connect().await?;

        let outcome = self.login(&client, credentials).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        outcome
    }
}

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortalContext {
    csrf_token: Option<String>,
    client_id: Option<String>,
    date_format: Option<String>,
}

impl PortalContext {
    /// The login page already carries a CSRF token; only the landing page has all three.
    fn is_complete(&self) -> bool {
        self.csrf_token.is_some() && self.client_id.is_some() && self.date_format.is_some()
    }

    fn into_session(self, cookie: String, credentials: &Credentials, expires_at: i64) -> Result<Session> {
        let missing = |what: &str| ScraperError::authentication(format!("{} not available after login", what));
        Ok(Session {
            cookie,
            csrf_token: self.csrf_token.ok_or_else(|| missing("CSRF token"))?,
            client_id: self.client_id.ok_or_else(|| missing("client id"))?,
            expires_at,
            root_url: credentials.root_url.clone(),
            username: credentials.username.clone(),
            date_format: self.date_format.ok_or_else(|| missing("date format"))?,
        })
    }
}

async fn check_login_banners(client: &Client) -> Result<()> {
    let banners: [(&str, fn() -> ScraperError); 3] = [
        (WRONG_IDENTIFIERS_HEADER_SELECTOR, || {
            ScraperError::bad_credentials("the username or password is incorrect")
        }),
        (CHANGE_PASSWORD_HEADER_SELECTOR, || {
            ScraperError::change_password("the portal asks for a new password")
        }),
        (SESSION_ALREADY_ACTIVE_SELECTOR, || ScraperError::SessionAlreadyActive),
    ];

    for (selector, error) in banners {
        let found = client
            .find_all(Locator::Css(selector))
            .await
            .map_err(browser_error)?;
        if !found.is_empty() {
            return Err(error());
        }
    }
    Ok(())
}

/// Cookie header in the `name=value; ` form the portal's own client sends.
pub fn compose_cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}; ", name, value))
        .collect()
}

fn session_expiry(now_ms: i64, ttl: Duration) -> Result<i64> {
    let ttl_ms = i64::try_from(ttl.as_millis())
        .map_err(|_| ScraperError::configuration(format!("session TTL out of range: {:?}", ttl)))?;
    Ok(now_ms.saturating_add(ttl_ms))
}

fn chrome_capabilities(headless: bool) -> Map<String, Value> {
    let mut args = vec!["--no-sandbox", "--disable-gpu", "--window-size=1920,1080"];
    if headless {
        args.push("--headless=new");
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

fn browser_error(e: fantoccini::error::CmdError) -> ScraperError {
    ScraperError::authentication(e.to_string())
}
