#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use crowdalert_client::api::ReportsApi;
use crowdalert_client::error::ClientError;
use crowdalert_core::geo::Position;
use crowdalert_core::report::Report;
use crowdalert_core::submission::ValidatedSubmission;
use crowdalert_geocode::{GeocodeCandidate, GeocodeError, Geocoder};
use tokio_util::sync::CancellationToken;

pub fn report(description: &str) -> Report {
    Report {
        id: uuid::Uuid::new_v4(),
        emergency_type: None,
        severity: None,
        description: description.to_string(),
        lat: None,
        lng: None,
        address: None,
        phone: None,
        image_url: None,
        timestamp: Some(Utc::now()),
    }
}

/// In-process stand-in for the Report Store.
#[derive(Default)]
pub struct StubApi {
    pub reports: Mutex<Vec<Report>>,
    /// Every create attempt with its idempotency key.
    pub creates: Mutex<Vec<(ValidatedSubmission, String)>>,
    pub list_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    /// Error returned by the next create instead of succeeding.
    pub fail_next_create: Mutex<Option<ClientError>>,
    pub create_delay: Option<Duration>,
    /// How long a list takes; 10 ms when unset. Honors cancellation.
    pub list_delay: Option<Duration>,
}

impl StubApi {
    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
            ..Self::default()
        }
    }

    pub fn create_keys(&self) -> Vec<String> {
        self.creates.lock().unwrap().iter().map(|(_, k)| k.clone()).collect()
    }
}

#[async_trait]
impl ReportsApi for StubApi {
    async fn list_reports(&self, cancel: &CancellationToken) -> Result<Vec<Report>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.list_delay.unwrap_or(Duration::from_millis(10));
        tokio::select! {
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Timeout);
        }
        Ok(self.reports.lock().unwrap().clone())
    }

    async fn create_report(
        &self,
        submission: &ValidatedSubmission,
        idempotency_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Report, ClientError> {
        self.creates
            .lock()
            .unwrap()
            .push((submission.clone(), idempotency_key.to_string()));
        if let Some(delay) = self.create_delay {
            tokio::select! {
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
        if let Some(err) = self.fail_next_create.lock().unwrap().take() {
            return Err(err);
        }
        let mut created = report(&submission.description);
        created.emergency_type = submission.emergency_type;
        created.severity = submission.severity;
        created.lat = submission.position.map(|p| p.lat);
        created.lng = submission.position.map(|p| p.lng);
        created.address = submission.address.clone();
        self.reports.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }
}

/// Geocoder with canned answers.
#[derive(Default)]
pub struct StubGeocoder {
    pub address: Option<String>,
    pub candidates: Vec<GeocodeCandidate>,
    pub fail: bool,
    pub searches: AtomicUsize,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn reverse(&self, _position: Position) -> Result<Option<String>, GeocodeError> {
        if self.fail {
            return Err(GeocodeError::Api {
                status: 503,
                body: String::new(),
            });
        }
        Ok(self.address.clone())
    }

    async fn search(&self, _query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GeocodeError::Api {
                status: 503,
                body: String::new(),
            });
        }
        Ok(self.candidates.clone())
    }
}
