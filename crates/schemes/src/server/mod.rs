//! REST API and pipeline services for the scheme assistant
//!
//! `services` holds the retrieval pipeline; the rest is the axum layer that
//! exposes it over HTTP.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod startup;
pub mod types;
