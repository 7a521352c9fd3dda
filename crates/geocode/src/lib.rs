//! Geocoding collaborator.
//!
//! Wraps a Nominatim-compatible HTTP API (`/reverse` and `/search`) using
//! [`reqwest`]. Both the store service (forward-geocoding free-text
//! addresses) and the report client (map picks, autocomplete) use it through
//! the [`Geocoder`] trait.

use std::time::Duration;

use async_trait::async_trait;
use crowdalert_core::geo::Position;
use serde::Deserialize;

/// Queries shorter than this (after trimming) are not sent.
pub const MIN_QUERY_CHARS: usize = 3;

/// Maximum candidates requested from `/search`.
pub const SEARCH_LIMIT: usize = 5;

/// Public Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying user agent.
pub const USER_AGENT: &str = concat!("CrowdAlert/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One forward-geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub display_name: String,
    pub position: Position,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body).
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Geocoding service error ({status}): {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Human-readable address for a position, if the service knows one.
    async fn reverse(&self, position: Position) -> Result<Option<String>, GeocodeError>;

    /// Up to [`SEARCH_LIMIT`] candidates for a free-text query.
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;

    /// First candidate's position, if any.
    async fn locate(&self, query: &str) -> Result<Option<Position>, GeocodeError> {
        Ok(self.search(query).await?.into_iter().next().map(|c| c.position))
    }
}

/// Whether a query is long enough to be worth sending.
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    display_name: String,
    lat: String,
    lon: String,
}

impl SearchHit {
    /// Nominatim sends coordinates as strings; unparsable hits are dropped.
    fn into_candidate(self) -> Option<GeocodeCandidate> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lng = self.lon.trim().parse::<f64>().ok()?;
        let position = Position::new(lat, lng);
        position.is_valid().then_some(GeocodeCandidate {
            display_name: self.display_name,
            position,
        })
    }
}

// ---------------------------------------------------------------------------
// Nominatim client
// ---------------------------------------------------------------------------

/// HTTP client for a Nominatim-compatible service.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Build a client against `base_url` (no trailing slash needed) with a
    /// per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`]. The caller is responsible for
    /// its user agent and timeout.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GeocodeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, position: Position) -> Result<Option<String>, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", position.lat.to_string()),
                ("lon", position.lng.to_string()),
            ])
            .send()
            .await?;
        let body: ReverseResponse = Self::ensure_success(response).await?.json().await?;
        Ok(body.display_name.filter(|name| !name.is_empty()))
    }

    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query.trim()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let hits: Vec<SearchHit> = Self::ensure_success(response).await?.json().await?;
        let candidates: Vec<GeocodeCandidate> = hits
            .into_iter()
            .filter_map(SearchHit::into_candidate)
            .take(SEARCH_LIMIT)
            .collect();
        tracing::debug!(query, count = candidates.len(), "Geocode search completed");
        Ok(candidates)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
