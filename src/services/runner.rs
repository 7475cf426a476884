use crate::models::DocumentOverrides;
use crate::services::delivery::{AuthEvent, AuthEventNotifier, AuthOutcome, DocumentSink, PasswordResolver};
use crate::services::pipeline::{CategoryReport, Pipeline, RunRequest};
use chrono::NaiveDate;
use shared::types::{Credentials, ScraperInput};
use shared::{Result, ScraperError};
use tracing::{error, info};

/// Outcome of one job, once every document has been handed to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub delivered: usize,
    pub delivery_failures: usize,
    pub drafts_skipped: usize,
}

/// Runs one scraping job end to end.
///
/// Each category is delivered as soon as it is extracted, so a failing
/// category does not discard the ones before it. Delivery failures are
/// logged per document and never abort the job.
/// Authentication outcomes are published through the notifier; bad
/// credentials and forced password changes count as failure events.
pub struct JobRunner<'a> {
    pub pipeline: &'a Pipeline,
    pub passwords: &'a dyn PasswordResolver,
    pub sink: &'a dyn DocumentSink,
    pub notifier: &'a dyn AuthEventNotifier,
}

impl<'a> JobRunner<'a> {
    pub async fn run(&self, input: &ScraperInput, today: NaiveDate) -> Result<JobSummary> {
        let request = self.build_request(input, today).await?;

        let session = match self.pipeline.obtain_session(&request.credentials).await {
            Ok(session) => session,
            Err(e) => {
                if e.is_auth_failure_event() {
                    self.publish(input, AuthOutcome::Failure, Some(&e)).await;
                }
                return Err(e);
            }
        };
        self.publish(input, AuthOutcome::Success, None).await;

        let mut summary = JobSummary::default();
        for (document_type, range) in request.categories() {
            let category = self
                .pipeline
                .extract_category(&session, document_type, &range, &request.overrides)
                .await;
            let category = match category {
                Ok(category) => category,
                Err(e) => {
                    error!(
                        "❌ {} extraction failed after {} delivered document(s): {}",
                        document_type, summary.delivered, e
                    );
                    return Err(e);
                }
            };
            summary.drafts_skipped += category.drafts_skipped;
            self.deliver(&category, &mut summary).await;
        }

        info!(
            "✅ Job finished: {} delivered, {} delivery failure(s), {} draft(s) skipped",
            summary.delivered, summary.delivery_failures, summary.drafts_skipped
        );
        Ok(summary)
    }

    async fn deliver(&self, category: &CategoryReport, summary: &mut JobSummary) {
        for document in &category.documents {
            match self.sink.deliver(document).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    error!("❌ Failed to deliver {} {}: {}", document.document_type, document.id, e);
                    summary.delivery_failures += 1;
                }
            }
        }
    }

    async fn build_request(&self, input: &ScraperInput, today: NaiveDate) -> Result<RunRequest> {
        let user = &input.user;
        let password = match (&user.password, &user.password_key) {
            (Some(password), _) => password.clone(),
            (None, Some(key)) => self.passwords.resolve(key).await?,
            (None, None) => return Err(ScraperError::input_validation("password or passwordKey is required")),
        };

        Ok(RunRequest {
            credentials: Credentials::new(user.root_url.clone(), user.username.clone(), password),
            invoices: input.invoices.as_ref().map(|r| r.resolve(today)).transpose()?,
            credit_memos: input.credit_memos.as_ref().map(|r| r.resolve(today)).transpose()?,
            overrides: DocumentOverrides {
                portal_user_id: user.id.clone(),
                customer_name: user.customer.clone(),
                portal_user: user.username.clone(),
                username: user.username.clone(),
            },
        })
    }

    async fn publish(&self, input: &ScraperInput, outcome: AuthOutcome, cause: Option<&ScraperError>) {
        let event = AuthEvent {
            job_id: input.job_id.clone(),
            portal_id: input.portal_id.clone(),
            portal_user_id: input.user.id.clone(),
            auth_event: outcome,
            fail_reason: cause.map(|e| e.error_code().to_string()),
        };

        let published = match outcome {
            AuthOutcome::Success => self.notifier.authentication_succeeded(&event).await,
            AuthOutcome::Failure => self.notifier.authentication_failed(&event).await,
        };
        if let Err(e) = published {
            error!("❌ Failed to publish auth event: {}", e);
        }
    }
}
