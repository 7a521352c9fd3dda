//! REST client for the Report Store.
//!
//! Wraps `GET /api/reports` and the multipart `POST /api/reports` using
//! [`reqwest`]. Every call runs under the configured timeout and stops early
//! when its [`CancellationToken`] fires.

use std::future::Future;

use async_trait::async_trait;
use crowdalert_core::report::Report;
use crowdalert_core::submission::ValidatedSubmission;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Request header carrying the de-duplication key of a submission.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Identifies this client to the store.
pub const USER_AGENT: &str = concat!("CrowdAlert-client/", env!("CARGO_PKG_VERSION"));

/// The two store operations the views depend on.
#[async_trait]
pub trait ReportsApi: Send + Sync {
    /// The full collection, newest first.
    async fn list_reports(&self, cancel: &CancellationToken) -> Result<Vec<Report>, ClientError>;

    /// Submit one report. Retrying with the same `idempotency_key` returns
    /// the report created by the first attempt.
    async fn create_report(
        &self,
        submission: &ValidatedSubmission,
        idempotency_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError>;
}

/// Error payload sent by the store.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for one Report Store.
pub struct ReportsClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReportsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn reports_url(&self) -> String {
        format!("{}/api/reports", self.config.base_url)
    }

    /// Drive `request` to completion unless it times out or `cancel` fires.
    async fn run<T>(
        &self,
        cancel: &CancellationToken,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ClientError::Cancelled),
            result = tokio::time::timeout(self.config.timeout, request) => {
                result.unwrap_or(Err(ClientError::Timeout))
            }
        }
    }

    /// Ensure the response has a success status code, otherwise extract the
    /// store's `error` message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn multipart(submission: &ValidatedSubmission) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (name, value) in submission.text_fields() {
            form = form.text(name, value);
        }
        if let Some(ref image) = submission.image {
            let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
            if let Some(ref content_type) = image.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl ReportsApi for ReportsClient {
    async fn list_reports(&self, cancel: &CancellationToken) -> Result<Vec<Report>, ClientError> {
        self.run(cancel, async {
            let response = self.client.get(self.reports_url()).send().await?;
            let reports: Vec<Report> = Self::ensure_success(response).await?.json().await?;
            tracing::debug!(count = reports.len(), "Fetched report collection");
            Ok(reports)
        })
        .await
    }

    async fn create_report(
        &self,
        submission: &ValidatedSubmission,
        idempotency_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        let form = Self::multipart(submission)?;
        self.run(cancel, async {
            let response = self
                .client
                .post(self.reports_url())
                .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
                .multipart(form)
                .send()
                .await?;
            let report: Report = Self::ensure_success(response).await?.json().await?;
            tracing::info!(report_id = %report.id, "Report submitted");
            Ok(report)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn reports_url_joins_base() {
        let client = ReportsClient::new(ClientConfig::new("http://store.test/")).unwrap();
        assert_eq!(client.reports_url(), "http://store.test/api/reports");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let client = ReportsClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = client.list_reports(&cancel).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let client = ReportsClient::new(
            ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(20)),
        )
        .unwrap();
        let result = client
            .run(&CancellationToken::new(), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ClientError>(())
            })
            .await;
        assert!(matches!(result, Err(ClientError::Timeout)));
    }
}
