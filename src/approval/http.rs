//! HTTP approval client built on `ureq`.
//!
//! Both calls are JSON `POST`s. Non-2xx statuses and transport errors are
//! reported as `ExternalSyncFailure`; nothing is retried here.

use super::{ApprovalClient, ApprovalResponse, SubmittedQuote};
use crate::error::{QuoteError, Result};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Approval client speaking to configured HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpApprovalClient {
    agent: ureq::Agent,
    status_url: Option<String>,
    notify_url: Option<String>,
}

impl HttpApprovalClient {
    pub fn new(
        status_url: Option<String>,
        notify_url: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        if timeout.is_zero() {
            return Err(QuoteError::UserError(
                "approval timeout must be > 0".to_string(),
            ));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(user_agent)
            .build();
        Ok(Self {
            agent,
            status_url,
            notify_url,
        })
    }

    fn post<T: Serialize>(&self, url: &str, number: &str, body: &T) -> Result<ApprovalResponse> {
        let payload = serde_json::to_value(body).map_err(|e| {
            QuoteError::ExternalSyncFailure(format!(
                "failed to encode approval payload for '{}': {}",
                number, e
            ))
        })?;

        debug!(quote = %number, url = %url, "approval request");
        match self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_json(payload)
        {
            Ok(response) => Ok(ApprovalResponse::from_headers(|name| {
                response.header(name).map(str::to_string)
            })),
            Err(ureq::Error::Status(code, _)) => Err(QuoteError::ExternalSyncFailure(format!(
                "approval system answered {} for quote '{}'",
                code, number
            ))),
            Err(ureq::Error::Transport(transport)) => {
                Err(QuoteError::ExternalSyncFailure(format!(
                    "approval request for quote '{}' failed: {}",
                    number, transport
                )))
            }
        }
    }
}

impl ApprovalClient for HttpApprovalClient {
    fn poll_status(&self, number: &str) -> Result<ApprovalResponse> {
        let url = self.status_url.as_deref().ok_or_else(|| {
            QuoteError::ExternalSyncFailure(format!(
                "cannot poll quote '{}': approval.status_url is not configured",
                number
            ))
        })?;
        self.post(url, number, &json!({ "vcQuoteNumber": number }))
    }

    fn notify_submitted(&self, quote: &SubmittedQuote) -> Result<ApprovalResponse> {
        let url = self.notify_url.as_deref().ok_or_else(|| {
            QuoteError::ExternalSyncFailure(format!(
                "cannot notify submission of '{}': approval.notify_url is not configured",
                quote.number
            ))
        })?;
        self.post(url, &quote.number, quote)
    }
}
