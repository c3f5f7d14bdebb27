use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AppState, ErrorResponse};

/// Name of the cookie that carries the wizard session id
pub const SESSION_COOKIE: &str = "mlg_session";

/// Header that may carry the session id instead of the cookie
pub const SESSION_HEADER: &str = "x-session-id";

/// Extract the wizard session id from a request.
///
/// The explicit header wins over the cookie so API clients can drive
/// the wizard without cookie handling.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    if let Some(value) = headers.get(SESSION_HEADER) {
        if let Some(id) = value.to_str().ok().and_then(|raw| Uuid::parse_str(raw.trim()).ok()) {
            return Some(id);
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

/// Build the Set-Cookie value for a freshly issued session
pub fn session_cookie(id: Uuid, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

/// Middleware for wizard steps that require a live session
///
/// Looks the session up once and hands it to the handler as a request
/// extension. Requests without a live session are answered with the
/// `wizard_incomplete` error, the caller has to start over.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let session_id = match session_id_from_headers(request.headers()) {
        Some(id) => id,
        None => {
            debug!(path = %request.uri().path(), "wizard request without session id");
            return wizard_incomplete_response();
        }
    };

    match state.session_store.get(session_id).await {
        Ok(Some(session)) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(None) => {
            debug!(session_id = %session_id, "wizard session missing or expired");
            wizard_incomplete_response()
        }
        Err(e) => {
            warn!("session store failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error()),
            )
                .into_response()
        }
    }
}

fn wizard_incomplete_response() -> Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse::wizard_incomplete(
            "No active wizard session. Start the wizard and complete the demographics step first",
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_id_from_cookie() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("mlg_session={}", id));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_session_id_from_cookie_among_others() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("theme=dark; mlg_session={} ; lang=en", id));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let cookie_id = Uuid::new_v4();
        let header_id = Uuid::new_v4();
        let mut headers = headers_with_cookie(&format!("mlg_session={}", cookie_id));
        headers.insert(
            SESSION_HEADER,
            HeaderValue::from_str(&header_id.to_string()).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(header_id));
    }

    #[test]
    fn test_garbage_session_id_is_ignored() {
        let headers = headers_with_cookie("mlg_session=not-a-uuid");
        assert_eq!(session_id_from_headers(&headers), None);

        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id, 1800);
        assert!(cookie.starts_with(&format!("mlg_session={}", id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=1800"));
    }
}
