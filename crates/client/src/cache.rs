//! Shared read-through cache of report collections.
//!
//! All views read through one [`ReportCache`]. Concurrent readers of a
//! collection share a single in-flight fetch; a successful write
//! invalidates the collection. Each collection carries a generation number
//! that [`ReportCache::invalidate`] bumps, and a fetch only stores its
//! result if the generation is unchanged since it started.
//!
//! The shared fetch belongs to the cache, not to any one reader: it runs on
//! the cache's own token and is bounded by the client timeout. Each reader
//! waits under its own [`CancellationToken`]; a reader that cancels gets
//! [`ClientError::Cancelled`] immediately and the others keep waiting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crowdalert_core::report::Report;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio_util::sync::CancellationToken;

use crate::api::ReportsApi;
use crate::error::ClientError;

/// Identity of the full report collection.
pub const REPORTS_COLLECTION: &str = "reports";

pub type Reports = Arc<Vec<Report>>;

type SharedFetch = Shared<BoxFuture<'static, Result<Reports, ClientError>>>;

#[derive(Default)]
struct Slot {
    generation: u64,
    value: Option<Reports>,
    /// Fetch in progress and the generation it started under.
    in_flight: Option<(u64, SharedFetch)>,
}

#[derive(Default)]
pub struct ReportCache {
    slots: Mutex<HashMap<String, Slot>>,
    /// Token shared fetches run under. Cancelled when the cache is dropped.
    fetch_token: CancellationToken,
}

impl Drop for ReportCache {
    fn drop(&mut self) {
        self.fetch_token.cancel();
    }
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value of `key`, if present.
    pub fn peek(&self, key: &str) -> Option<Reports> {
        self.slots().get(key).and_then(|slot| slot.value.clone())
    }

    /// Return the cached collection, or run `fetch` once for everyone
    /// currently asking for `key`.
    ///
    /// `cancel` only stops this caller's wait. The fetch stays in flight for
    /// the other readers and for whoever asks next.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        cancel: &CancellationToken,
        fetch: F,
    ) -> Result<Reports, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Report>, ClientError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let (generation, shared) = {
            let mut slots = self.slots();
            let slot = slots.entry(key.to_string()).or_default();
            if let Some(ref value) = slot.value {
                return Ok(Arc::clone(value));
            }
            match slot.in_flight {
                Some((started, ref shared)) if started == slot.generation => {
                    tracing::debug!(collection = key, "Joining in-flight fetch");
                    (started, shared.clone())
                }
                _ => {
                    let shared = fetch().map(|r| r.map(Arc::new)).boxed().shared();
                    slot.in_flight = Some((slot.generation, shared.clone()));
                    (slot.generation, shared)
                }
            }
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(collection = key, "Reader cancelled; fetch left in flight");
                return Err(ClientError::Cancelled);
            }
            result = shared => result,
        };

        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            if slot.generation == generation {
                slot.in_flight = None;
                if let Ok(ref value) = result {
                    slot.value = Some(Arc::clone(value));
                }
            } else {
                tracing::debug!(collection = key, "Discarding fetch that predates invalidation");
            }
        }
        result
    }

    /// Drop the cached value of `key`. Fetches already in flight will not
    /// repopulate it.
    pub fn invalidate(&self, key: &str) {
        let mut slots = self.slots();
        let slot = slots.entry(key.to_string()).or_default();
        slot.generation += 1;
        slot.value = None;
        slot.in_flight = None;
        tracing::debug!(collection = key, generation = slot.generation, "Cache invalidated");
    }

    /// The report collection, read through the cache. `cancel` ends this
    /// caller's wait only.
    pub async fn reports(
        &self,
        api: Arc<dyn ReportsApi>,
        cancel: &CancellationToken,
    ) -> Result<Reports, ClientError> {
        let token = self.fetch_token.clone();
        self.get_or_fetch(REPORTS_COLLECTION, cancel, move || async move {
            api.list_reports(&token).await
        })
        .await
    }
}
