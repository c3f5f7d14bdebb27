use axum::{
    extract::{Json, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};
use utoipa::{IntoParams, ToSchema};

use my_lab_guide_data::models::reference::Gender;

use crate::entities::reference::{PublicReferenceList, PublicReferenceRow};

use super::session::session_id_from_headers;
use super::{AppState, ErrorResponse};

/// Query parameters for browsing the reference catalog
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReferenceQueryParams {
    /// Gender tag to resolve intervals for ("male", "female" or "unknown").
    /// Unrecognized tags resolve gender-free intervals only.
    pub g: Option<String>,

    /// Age in years to resolve intervals for
    pub age: Option<u32>,
}

/// Browse the reference catalog resolved for a demographic
///
/// Works without a session. When `g` is absent and the request carries a
/// wizard session, the session's gender answer fills in.
#[utoipa::path(
    get,
    path = "/api/v1/reference",
    params(ReferenceQueryParams),
    responses(
        (status = 200, description = "Resolved reference catalog", body = PublicReferenceList),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "reference"
)]
#[instrument(skip(state, headers))]
pub async fn get_reference_ranges(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReferenceQueryParams>,
) -> Result<impl IntoResponse, Response> {
    // An explicit query parameter beats the session's answer.
    let gender = match &params.g {
        Some(tag) => Gender::from_tag(tag),
        None => session_gender(&state, &headers).await.unwrap_or(Gender::Unknown),
    };

    let rows = state.report_service.reference_rows(gender, params.age);

    let response = PublicReferenceList {
        gender: gender.as_tag().to_string(),
        age: params.age,
        tests: rows.into_iter().map(PublicReferenceRow::from).collect(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// The gender answer of the request's wizard session, if any
async fn session_gender(state: &AppState, headers: &HeaderMap) -> Option<Gender> {
    let session_id = session_id_from_headers(headers)?;

    match state.session_store.get(session_id).await {
        Ok(Some(session)) => session.gender,
        Ok(None) => None,
        Err(e) => {
            warn!("session lookup failed while browsing references: {}", e);
            None
        }
    }
}
