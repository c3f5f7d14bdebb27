use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use indexmap::IndexMap;
use tracing::{error, info, instrument, warn};
use validator::Validate;

use my_lab_guide_data::models::reference::Gender;
use my_lab_guide_data::models::session::WizardSession;
use my_lab_guide_data::session::SessionStoreError;
use my_lab_guide_domain::models::LabReport;
use my_lab_guide_domain::services::ReportServiceError;

use crate::entities::report::PublicLabReport;
use crate::entities::wizard::{PublicWizardSession, StartWizardRequest, SubmitValuesRequest};
use crate::pdf::render_report_pdf;

use super::session::{session_cookie, session_id_from_headers};
use super::{AppState, ErrorResponse};

/// Start a new wizard session
///
/// Restarting while a session is live replaces it with a fresh one.
#[utoipa::path(
    post,
    path = "/api/v1/wizard/start",
    request_body = StartWizardRequest,
    responses(
        (status = 201, description = "Wizard session created", body = PublicWizardSession),
        (status = 400, description = "Invalid demographics", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "wizard"
)]
#[instrument(skip(state, headers, request))]
pub async fn start_wizard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartWizardRequest>,
) -> Result<impl IntoResponse, Response> {
    if let Err(validation_errors) = request.validate() {
        warn!("invalid wizard start payload: {}", validation_errors);
        let details = serde_json::to_value(&validation_errors).ok();
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::validation_error("Invalid demographics", details)),
        )
            .into_response());
    }

    let gender = Gender::from_tag(&request.gender);

    // A restart always issues a fresh session, the old one is dropped.
    if let Some(previous) = session_id_from_headers(&headers) {
        if let Err(e) = state.session_store.delete(previous).await {
            warn!(session_id = %previous, "failed to drop replaced session: {}", e);
        }
    }

    match state
        .session_store
        .create(Some(request.age), Some(gender))
        .await
    {
        Ok(session) => {
            info!(session_id = %session.id, "wizard session started");
            let cookie = session_cookie(session.id, state.session_ttl_secs);
            Ok((
                StatusCode::CREATED,
                [(header::SET_COOKIE, cookie)],
                Json(PublicWizardSession::from(session)),
            ))
        }
        Err(e) => {
            error!("failed to create wizard session: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response())
        }
    }
}

/// Submit laboratory values to the current wizard session
#[utoipa::path(
    put,
    path = "/api/v1/wizard/values",
    request_body = SubmitValuesRequest,
    responses(
        (status = 200, description = "Values merged into the session", body = PublicWizardSession),
        (status = 400, description = "Unknown test, empty panel or non-finite value", body = ErrorResponse),
        (status = 409, description = "No active wizard session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "wizard"
)]
#[instrument(skip(state, session, request))]
pub async fn submit_values(
    State(state): State<AppState>,
    Extension(session): Extension<WizardSession>,
    Json(request): Json<SubmitValuesRequest>,
) -> Result<impl IntoResponse, Response> {
    let values = normalize_keys(request.values);

    if let Err(e) = state.report_service.validate_panel(&values) {
        warn!(session_id = %session.id, "rejected value panel: {}", e);
        return Err(panel_rejection(e));
    }

    match state.session_store.merge_values(session.id, values).await {
        Ok(updated) => {
            info!(session_id = %updated.id, values = updated.values.len(), "lab values merged");
            Ok((StatusCode::OK, Json(PublicWizardSession::from(updated))))
        }
        // The session can expire between the middleware check and the write.
        Err(SessionStoreError::NotFound(_)) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::wizard_incomplete(
                "The wizard session expired, start over",
            )),
        )
            .into_response()),
        Err(e) => {
            error!("failed to merge values: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response())
        }
    }
}

/// Get the classified report for the current wizard session
#[utoipa::path(
    get,
    path = "/api/v1/wizard/report",
    responses(
        (status = 200, description = "Classified lab report", body = PublicLabReport),
        (status = 409, description = "Wizard incomplete", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "wizard"
)]
#[instrument(skip(state, session))]
pub async fn get_report(
    State(state): State<AppState>,
    Extension(session): Extension<WizardSession>,
) -> Result<impl IntoResponse, Response> {
    let report = build_session_report(&state, &session)?;
    info!(session_id = %session.id, abnormal = report.abnormal_count, "report served");
    Ok((StatusCode::OK, Json(PublicLabReport::from(report))))
}

/// Export the classified report as a PDF document
#[utoipa::path(
    get,
    path = "/api/v1/wizard/report.pdf",
    responses(
        (status = 200, description = "The report rendered as a PDF document", content_type = "application/pdf"),
        (status = 409, description = "Wizard incomplete", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "wizard"
)]
#[instrument(skip(state, session))]
pub async fn get_report_pdf(
    State(state): State<AppState>,
    Extension(session): Extension<WizardSession>,
) -> Result<impl IntoResponse, Response> {
    let report = build_session_report(&state, &session)?;

    match render_report_pdf(&report) {
        Ok(bytes) => {
            info!(session_id = %session.id, size = bytes.len(), "pdf report served");
            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"lab-report.pdf\"".to_string(),
                    ),
                ],
                bytes,
            ))
        }
        Err(e) => {
            error!("failed to render pdf report: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response())
        }
    }
}

/// Uppercase and trim submitted test keys so `sodium` and `SODIUM`
/// address the same catalog entry
fn normalize_keys(values: IndexMap<String, f64>) -> IndexMap<String, f64> {
    values
        .into_iter()
        .map(|(key, value)| (key.trim().to_ascii_uppercase(), value))
        .collect()
}

/// Build the report for a session, translating the wizard preconditions
/// into error responses
fn build_session_report(state: &AppState, session: &WizardSession) -> Result<LabReport, Response> {
    if !session.has_demographics() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::wizard_incomplete(
                "Complete the demographics step before requesting the report",
            )),
        )
            .into_response());
    }

    let gender = session.gender.unwrap_or(Gender::Unknown);

    match state
        .report_service
        .build_report(session.age, gender, &session.values)
    {
        Ok(report) => Ok(report),
        Err(ReportServiceError::EmptyPanel) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::wizard_incomplete(
                "Submit laboratory values before requesting the report",
            )),
        )
            .into_response()),
        Err(e) => {
            error!("failed to build report: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response())
        }
    }
}

/// Map a rejected panel onto the right 400 response
fn panel_rejection(error: ReportServiceError) -> Response {
    let response = match &error {
        ReportServiceError::EmptyPanel => {
            ErrorResponse::bad_request("At least one laboratory value is required")
        }
        ReportServiceError::UnknownTest(key) => ErrorResponse::validation_error(
            &error.to_string(),
            Some(serde_json::json!({ "test": key })),
        ),
        ReportServiceError::NonFiniteValue(key) => ErrorResponse::validation_error(
            &error.to_string(),
            Some(serde_json::json!({ "test": key })),
        ),
    };

    (StatusCode::BAD_REQUEST, Json(response)).into_response()
}
