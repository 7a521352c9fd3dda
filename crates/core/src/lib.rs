//! Domain logic for crowd-sourced emergency reports.
//!
//! Everything here is pure: no I/O, no clocks read implicitly. The store
//! service, the geocoding client, and the report client all build on these
//! types and rules.

pub mod classify;
pub mod error;
pub mod feed;
pub mod geo;
pub mod intake;
pub mod marker;
pub mod report;
pub mod status;
pub mod submission;
pub mod types;
pub mod validation;
