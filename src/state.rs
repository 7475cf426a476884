use crate::cache::CredentialCache;
use crate::cache_ttl::get_session_ttl;
use crate::processing::web_scraping::http_client::build_client;
use crate::processing::web_scraping::{BrowserAuthenticator, HttpDetailFetcher, HttpDocumentLister, PortalStatusMapper};
use crate::services::{EnvPasswordResolver, JobRunner, Pipeline, RetryPolicy, StdoutSink, TracingNotifier};
use shared::config::Config;
use std::sync::Arc;
use tracing::info;

/// Production wiring of the scraper: file-backed cache, browser login,
/// HTTP listing/detail clients, stdout delivery and log-based events.
pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
    pub passwords: EnvPasswordResolver,
    pub sink: StdoutSink,
    pub notifier: TracingNotifier,
}

impl AppState {
    pub fn new(config: Config, event_bus: Option<String>) -> anyhow::Result<Self> {
        let session_ttl = get_session_ttl();
        let cache = Arc::new(CredentialCache::load(&config.cache.file));
        let http_client = build_client(&config.http)?;

        let pipeline = Pipeline::new(
            cache,
            Box::new(BrowserAuthenticator::new(config.browser.clone(), session_ttl)),
            Box::new(HttpDocumentLister::new(http_client.clone())),
            Box::new(HttpDetailFetcher::new(http_client)),
            Box::new(PortalStatusMapper),
        )
        .with_retry_policy(RetryPolicy::from_config(&config.http))
        .with_session_ttl(session_ttl);

        info!(
            "🚀 Scraper state initialized (cache: {}, webdriver: {})",
            config.cache.file.display(),
            config.browser.webdriver_url
        );

        Ok(Self {
            config,
            pipeline,
            passwords: EnvPasswordResolver,
            sink: StdoutSink,
            notifier: TracingNotifier::new(event_bus),
        })
    }

    pub fn runner(&self) -> JobRunner<'_> {
        JobRunner {
            pipeline: &self.pipeline,
            passwords: &self.passwords,
            sink: &self.sink,
            notifier: &self.notifier,
        }
    }
}
