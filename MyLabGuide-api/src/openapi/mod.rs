use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Wizard endpoints
        crate::api::handlers::wizard::start_wizard,
        crate::api::handlers::wizard::submit_values,
        crate::api::handlers::wizard::get_report,
        crate::api::handlers::wizard::get_report_pdf,

        // Reference catalog endpoints
        crate::api::handlers::reference::get_reference_ranges,
    ),
    components(
        schemas(
            // Entities
            crate::entities::wizard::StartWizardRequest,
            crate::entities::wizard::SubmitValuesRequest,
            crate::entities::wizard::PublicWizardSession,
            crate::entities::report::PublicLabResult,
            crate::entities::report::PublicLabReport,
            crate::entities::reference::PublicReferenceRow,
            crate::entities::reference::PublicReferenceList,
            crate::entities::common::PublicErrorResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Shared handler schemas
            crate::api::handlers::ErrorResponse,
            crate::api::handlers::reference::ReferenceQueryParams,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "wizard", description = "Three step lab report wizard"),
        (name = "reference", description = "Reference range browsing")
    ),
    info(
        title = "MyLabGuide API",
        version = "0.1.0",
        description = "API for classifying laboratory values against reference ranges",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
struct ApiDoc;
