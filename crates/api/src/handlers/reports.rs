//! Handlers for the report collection.
//!
//! The create handler accepts both the canonical multipart field names and
//! the legacy ones, resolves a position, stores the optional image and
//! de-duplicates on the `Idempotency-Key` header.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crowdalert_core::error::CoreError;
use crowdalert_core::intake::{normalize, NewReport, RawSubmission};
use crowdalert_core::report::Report;
use crowdalert_core::types::ReportId;
use crowdalert_core::validation::validate_idempotency_key;
use crowdalert_db::models::report::CreateReport;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::uploads::UPLOADS_URL_PREFIX;

/// Request header carrying the client's de-duplication key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Multipart names accepted for the image part (`photo` is legacy).
const IMAGE_FIELDS: &[&str] = &["image", "photo"];

// ---------------------------------------------------------------------------
// POST /reports
// ---------------------------------------------------------------------------

/// Create a report from a multipart form.
///
/// Responds `201` with the new report, or `200` with the original report
/// when the idempotency key was already used.
pub async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let idempotency_key = idempotency_key(&headers)?;

    let mut raw = RawSubmission::default();
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if IMAGE_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            // Browsers send an empty part for an untouched file input.
            if file_name.as_deref().unwrap_or("").is_empty() && data.is_empty() {
                continue;
            }
            if image.is_some() {
                return Err(AppError::BadRequest(
                    "Only one image may be attached per report".into(),
                ));
            }
            image = Some((file_name.unwrap_or_default(), data.to_vec()));
        } else {
            let text = field.text().await?;
            if !raw.set_field(&name, text) {
                tracing::debug!(field = %name, "Ignoring unknown report field");
            }
        }
    }

    // A retry returns the original before any geocoding or image writes.
    // Concurrent retries that both miss here still meet the insert conflict
    // below.
    if let Some(ref key) = idempotency_key {
        if let Some(existing) = state.store.find_by_idempotency_key(key).await? {
            tracing::info!(report_id = %existing.id, "Replayed report for repeated idempotency key");
            return Ok((StatusCode::OK, Json(existing)).into_response());
        }
    }

    let new = normalize(raw)?;
    let new = resolve_position(&state, new).await;

    let stored = match image {
        Some((file_name, bytes)) => Some(state.uploads.save(&file_name, &bytes).await?),
        None => None,
    };

    let severity_inferred = new.severity_inferred;
    let input = CreateReport::new(
        new,
        stored.as_ref().map(|s| s.url.clone()),
        idempotency_key,
    );
    let created = match state.store.create(input).await {
        Ok(created) => created,
        Err(e) => {
            if let Some(ref s) = stored {
                state.uploads.remove(&s.file_name).await;
            }
            return Err(e.into());
        }
    };

    if created.replayed {
        // Lost the race to a concurrent retry; the original keeps its image.
        if let Some(ref s) = stored {
            state.uploads.remove(&s.file_name).await;
        }
        tracing::info!(report_id = %created.report.id, "Replayed report for repeated idempotency key");
        return Ok((StatusCode::OK, Json(created.report)).into_response());
    }

    tracing::info!(
        report_id = %created.report.id,
        severity = ?created.report.severity,
        severity_inferred,
        has_image = stored.is_some(),
        "Report created",
    );
    Ok((StatusCode::CREATED, Json(created.report)).into_response())
}

fn idempotency_key(headers: &HeaderMap) -> AppResult<Option<String>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Idempotency-Key must be printable ASCII".into()))?
        .trim();
    if key.is_empty() {
        return Ok(None);
    }
    validate_idempotency_key(key)?;
    Ok(Some(key.to_string()))
}

/// Forward-geocode an address-only report. Failures leave it unchanged.
async fn resolve_position(state: &AppState, new: NewReport) -> NewReport {
    let (Some(geocoder), true) = (state.geocoder.as_ref(), new.needs_geocoding()) else {
        return new;
    };
    let address = new.address.clone().unwrap_or_default();

    match geocoder.locate(&address).await {
        Ok(Some(position)) => new.clone().with_geocoded_position(position).unwrap_or_else(|e| {
            tracing::warn!(address = %address, error = %e, "Discarding geocoded position");
            new
        }),
        Ok(None) => {
            tracing::debug!(address = %address, "No geocoding match for address");
            new
        }
        Err(e) => {
            tracing::warn!(address = %address, error = %e, "Forward geocoding failed");
            new
        }
    }
}

// ---------------------------------------------------------------------------
// GET /reports
// ---------------------------------------------------------------------------

/// All reports, newest first.
pub async fn list_reports(State(state): State<AppState>) -> AppResult<Json<Vec<Report>>> {
    let reports = state.store.list().await?;
    Ok(Json(reports))
}

// ---------------------------------------------------------------------------
// GET /reports/{id}
// ---------------------------------------------------------------------------

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Report>> {
    let id = parse_report_id(&id)?;
    let report = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id.to_string()))?;
    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// DELETE /reports/{id}
// ---------------------------------------------------------------------------

/// Remove a report and its stored image.
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_report_id(&id)?;
    let report = state.store.find_by_id(id).await?;

    if !state.store.delete(id).await? {
        return Err(not_found(id.to_string()));
    }

    let stored_image = report
        .and_then(|r| r.image_url)
        .and_then(|url| {
            url.strip_prefix(UPLOADS_URL_PREFIX)
                .map(|rest| rest.trim_start_matches('/').to_string())
        })
        .filter(|name| !name.is_empty());
    if let Some(file_name) = stored_image {
        state.uploads.remove(&file_name).await;
    }

    tracing::info!(report_id = %id, "Report deleted");
    Ok(Json(json!({ "success": true })))
}

/// No report can have an id that is not a UUID, so malformed ids are
/// reported as missing.
fn parse_report_id(raw: &str) -> AppResult<ReportId> {
    raw.parse::<ReportId>().map_err(|_| not_found(raw.to_string()))
}

fn not_found(id: String) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Report",
        id,
    })
}
