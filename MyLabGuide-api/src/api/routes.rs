use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::handlers::{health, reference, session, wizard, AppState, ErrorResponse};
use crate::openapi::configure_swagger_routes;

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    // Create health service over the shared catalog and store
    let health_service =
        health::create_health_service(state.catalog.clone(), state.session_store.clone());

    // Wizard steps that need a live session
    let guarded_routes = Router::new()
        .route("/wizard/values", put(wizard::submit_values))
        .route("/wizard/report", get(wizard::get_report))
        .route("/wizard/report.pdf", get(wizard::get_report_pdf))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    // Wizard entry and anonymous reference browsing
    let open_routes = Router::new()
        .route("/wizard/start", post(wizard::start_wizard))
        .route("/reference", get(reference::get_reference_ranges));

    let api_routes = open_routes.merge(guarded_routes);

    debug!("API routes configured");

    // Routes outside the versioned prefix
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service));

    debug!("Public routes configured");

    // Combine all routes
    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    debug!("API routes nested");

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);

    debug!("Swagger UI merged");

    // Apply security configuration
    let app = configure_security(app);
    debug!("Security configuration applied");

    // Initialize health check service startup time
    health::initialize_server_start_time();
    debug!("Health check service initialized");

    app
}

/// JSON 404 for anything outside the routing table
async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found("resource")),
    )
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    // Get Swagger UI routes
    let swagger = configure_swagger_routes();

    // Merge Swagger UI with the app router
    app.merge(swagger)
}

/// Apply CORS and security headers to the whole application
pub fn configure_security(app: Router) -> Router {
    // The wizard is driven from browsers, so allow the session header
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(session::SESSION_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    // Add security headers
    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; script-src 'self'; connect-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; font-src 'self'; frame-ancestors 'none'; form-action 'self'; base-uri 'self'",
            ),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    // Apply the security headers and CORS to the entire application
    app.layer(cors).layer(security_headers)
}
