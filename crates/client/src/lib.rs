//! Client side of the CrowdAlert report contract.
//!
//! [`api::ReportsClient`] talks to the Report Store; [`cache::ReportCache`]
//! shares one copy of the collection between views; [`form::ReportForm`],
//! [`feed::FeedView`] and [`feed::HomeFeed`] are the view models built on
//! top of them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod form;
