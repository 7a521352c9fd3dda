//! Report submission form state.
//!
//! [`ReportForm`] holds the draft of one of the two form variants, resolves
//! positions through the geolocation and geocoding collaborators, and
//! submits through [`ReportsApi`]. Methods take `&self` so the form can be
//! shared with the tasks that drive it; at most one submit is in flight at
//! a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use crowdalert_core::geo::{Position, DEFAULT_CENTER, DEFAULT_ZOOM, SELECTED_ZOOM};
use crowdalert_core::report::{EmergencyType, Report, Severity};
use crowdalert_core::submission::{
    FormVariant, ImageAttachment, SubmissionDraft, ValidatedSubmission, ValidationError,
};
use crowdalert_geocode::{is_searchable, GeocodeCandidate, Geocoder};
use tokio_util::sync::CancellationToken;

use crate::api::ReportsApi;
use crate::cache::{ReportCache, REPORTS_COLLECTION};
use crate::error::ClientError;

pub const SUBMITTED_MESSAGE: &str = "Report submitted!";
pub const LOCATION_UNAVAILABLE_MESSAGE: &str = "Unable to retrieve your location.";
pub const GEOLOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported on this device.";

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,
}

/// Device position source.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Position, GeolocationError>;
}

/// Invoked with the created report after a successful submit.
pub type SubmitCallback = Box<dyn Fn(&Report) + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error("A submission is already in progress")]
    InFlight,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Failed(#[from] ClientError),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct FormState {
    draft: SubmissionDraft,
    candidates: Vec<GeocodeCandidate>,
    error: Option<String>,
    success: Option<String>,
    /// Last attempted submission and its idempotency key, kept after a
    /// failure so that retrying the same content reuses the key.
    pending: Option<(ValidatedSubmission, String)>,
}

/// Clears the in-flight flag when a submit finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReportForm {
    state: Mutex<FormState>,
    submitting: AtomicBool,
    api: Arc<dyn ReportsApi>,
    cache: Arc<ReportCache>,
    geocoder: Option<Arc<dyn Geocoder>>,
    geolocator: Option<Arc<dyn Geolocator>>,
    on_submitted: Option<SubmitCallback>,
}

impl ReportForm {
    pub fn new(variant: FormVariant, api: Arc<dyn ReportsApi>, cache: Arc<ReportCache>) -> Self {
        Self {
            state: Mutex::new(FormState {
                draft: SubmissionDraft::new(variant),
                ..FormState::default()
            }),
            submitting: AtomicBool::new(false),
            api,
            cache,
            geocoder: None,
            geolocator: None,
            on_submitted: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    pub fn on_submitted(mut self, callback: impl Fn(&Report) + Send + Sync + 'static) -> Self {
        self.on_submitted = Some(Box::new(callback));
        self
    }

    fn state(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- accessors ----

    pub fn variant(&self) -> FormVariant {
        self.state().draft.variant
    }

    /// Snapshot of the current draft.
    pub fn draft(&self) -> SubmissionDraft {
        self.state().draft.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn success(&self) -> Option<String> {
        self.state().success.clone()
    }

    pub fn candidates(&self) -> Vec<GeocodeCandidate> {
        self.state().candidates.clone()
    }

    /// Whether the submit control should be disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Center and zoom of the location picker map.
    pub fn map_view(&self) -> (Position, u8) {
        match self.state().draft.position {
            Some(position) => (position, SELECTED_ZOOM),
            None => (DEFAULT_CENTER, DEFAULT_ZOOM),
        }
    }

    // ---- field setters ----

    pub fn set_description(&self, description: impl Into<String>) {
        self.state().draft.description = description.into();
    }

    pub fn set_emergency_type(&self, emergency_type: Option<EmergencyType>) {
        self.state().draft.emergency_type = emergency_type;
    }

    pub fn set_severity(&self, severity: Option<Severity>) {
        self.state().draft.severity = severity;
    }

    pub fn set_phone(&self, phone: impl Into<String>) {
        self.state().draft.phone = phone.into();
    }

    /// Free-text location. Any previously resolved position no longer
    /// applies.
    pub fn set_location_text(&self, text: impl Into<String>) {
        let mut state = self.state();
        state.draft.address = text.into();
        state.draft.position = None;
    }

    /// Attach the report's image, replacing any earlier one.
    pub fn attach_image(&self, image: ImageAttachment) {
        self.state().draft.image = Some(image);
    }

    pub fn remove_image(&self) {
        self.state().draft.image = None;
    }

    pub fn dismiss_error(&self) {
        self.state().error = None;
    }

    // ---- location ----

    /// Place the marker at a map click and look up its address.
    pub async fn pick_on_map(&self, position: Position) {
        self.set_position(position).await;
    }

    /// Use the device position. Failures surface as a dismissible error and
    /// leave the draft unchanged.
    pub async fn use_current_location(&self) {
        let Some(geolocator) = self.geolocator.clone() else {
            self.state().error = Some(GEOLOCATION_UNSUPPORTED_MESSAGE.to_string());
            return;
        };
        match geolocator.current_position().await {
            Ok(position) => self.set_position(position).await,
            Err(e) => {
                tracing::debug!(error = %e, "Geolocation failed");
                self.state().error = Some(LOCATION_UNAVAILABLE_MESSAGE.to_string());
            }
        }
    }

    async fn set_position(&self, position: Position) {
        let variant = {
            let mut state = self.state();
            state.draft.position = Some(position);
            state.draft.address.clear();
            state.draft.variant
        };

        let address = self.reverse_geocode(position).await;

        let mut state = self.state();
        // A later pick may have superseded this one.
        if state.draft.position != Some(position) {
            return;
        }
        state.draft.address = match (address, variant) {
            (Some(address), _) => address,
            // The detailed form needs location text; fall back to the
            // coordinate encoding the store understands.
            (None, FormVariant::Detailed) => position.to_coordinate_text(),
            (None, FormVariant::Quick) => String::new(),
        };
    }

    async fn reverse_geocode(&self, position: Position) -> Option<String> {
        let geocoder = self.geocoder.as_ref()?;
        match geocoder.reverse(position).await {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "Reverse geocoding failed");
                None
            }
        }
    }

    /// Autocomplete the location field. Short queries and geocoder failures
    /// yield no candidates.
    pub async fn search_location(&self, query: &str) -> Vec<GeocodeCandidate> {
        {
            let mut state = self.state();
            state.draft.address = query.to_string();
            state.draft.position = None;
            state.candidates.clear();
        }

        let candidates = match (&self.geocoder, is_searchable(query)) {
            (Some(geocoder), true) => geocoder.search(query).await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Location search failed");
                Vec::new()
            }),
            _ => Vec::new(),
        };

        let mut state = self.state();
        if state.draft.address == query {
            state.candidates = candidates.clone();
        }
        candidates
    }

    /// Fix the location to an autocomplete candidate.
    pub fn select_candidate(&self, candidate: &GeocodeCandidate) {
        let mut state = self.state();
        state.draft.address = candidate.display_name.clone();
        state.draft.position = Some(candidate.position);
        state.candidates.clear();
    }

    // ---- submit ----

    /// Validate and submit the draft.
    ///
    /// Validation failures never reach the network. On success every field
    /// is cleared, the success message is shown, the callback runs and the
    /// cached report collection is invalidated. On failure the draft is
    /// kept; submitting the same content again reuses the idempotency key.
    pub async fn submit(&self, cancel: &CancellationToken) -> Result<Report, SubmitError> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::InFlight);
        }
        let _guard = InFlightGuard(&self.submitting);

        let (submission, key) = {
            let mut state = self.state();
            state.error = None;
            state.success = None;

            let submission = match state.draft.validate() {
                Ok(submission) => submission,
                Err(e) => {
                    state.error = Some(e.to_string());
                    return Err(e.into());
                }
            };
            let key = match state.pending {
                Some((ref previous, ref key)) if *previous == submission => key.clone(),
                _ => uuid::Uuid::new_v4().to_string(),
            };
            state.pending = Some((submission.clone(), key.clone()));
            (submission, key)
        };

        match self.api.create_report(&submission, &key, cancel).await {
            Ok(report) => {
                {
                    let mut state = self.state();
                    let variant = state.draft.variant;
                    *state = FormState {
                        draft: SubmissionDraft::new(variant),
                        success: Some(SUBMITTED_MESSAGE.to_string()),
                        ..FormState::default()
                    };
                }
                self.cache.invalidate(REPORTS_COLLECTION);
                if let Some(ref callback) = self.on_submitted {
                    callback(&report);
                }
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Report submission failed");
                if !matches!(e, ClientError::Cancelled) {
                    self.state().error = Some(e.user_message());
                }
                Err(e.into())
            }
        }
    }
}
