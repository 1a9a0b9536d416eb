//! Granule to orbit file redirect.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use orbits_core::Granule;
use regex_lite::Regex;
use serde::Serialize;
use tracing::{error, info};

use crate::state::AppState;

/// Sentinel-1 product name: mission, mode, product type and level, start,
/// stop, absolute orbit, datatake id and unique id.
static GRANULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^S1[A-D]_(IW|EW|WV|S[1-6])_(GRD[FHM_]|SLC_|RAW_|OCN_)_[0-9A-Z]{4}_\d{8}T\d{6}_\d{8}T\d{6}_\d{6}_[0-9A-F]{6}_[0-9A-F]{4}$",
    )
    .unwrap()
});

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Whether `name` is a syntactically valid Sentinel-1 granule name.
pub fn is_valid_granule(name: &str) -> bool {
    GRANULE_PATTERN.is_match(name)
}

/// GET /{granule}
///
/// Redirect to the orbit file covering the granule, or 404 when the mirror
/// holds none.
pub async fn get_orbit(
    State(state): State<Arc<AppState>>,
    Path(granule): Path<String>,
) -> Response {
    if !is_valid_granule(&granule) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid granule name: {}", granule),
            }),
        )
            .into_response();
    }

    let parsed = match Granule::parse(&granule) {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    match state.resolver().resolve(&parsed).await {
        Ok(Some(location)) => {
            info!(granule = granule.as_str(), location = location.as_str(), "Resolved orbit");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            format!("No orbit file found for {}", granule),
        )
            .into_response(),
        Err(e) => {
            error!(granule = granule.as_str(), error = %e, "Orbit resolution failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
