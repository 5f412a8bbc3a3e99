//! The dashboard backend's JSON-over-POST API.

mod client;
mod types;

pub use client::{DashboardApi, HttpApi};
pub use types::{
    ApiFailure, CheckResponse, DetailResponse, FetchResultsResponse, ResultsPayload, SyncResponse,
};

use thiserror::Error;

/// Failures below the business level: the request did not produce a usable
/// response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(String),
}
