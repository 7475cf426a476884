// ============================================================================
// SCRAPER SERVICES
// ============================================================================
pub mod delivery;
pub mod pipeline;
pub mod retry;
pub mod runner;

pub use delivery::{
    AuthEvent, AuthEventNotifier, AuthOutcome, DocumentSink, EnvPasswordResolver, PasswordResolver, StdoutSink,
    TracingNotifier,
};
pub use pipeline::{
    Authenticator, CategoryReport, DetailFetcher, DocumentLister, Pipeline, RunReport, RunRequest, StatusMapper,
};
pub use retry::RetryPolicy;
pub use runner::{JobRunner, JobSummary};
