//! The CrowdAlert Report Store HTTP service.
//!
//! The binary in `main.rs` wires configuration, the report store and the
//! geocoder into [`state::AppState`] and serves [`router::build_app_router`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod uploads;
