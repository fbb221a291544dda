use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::TokenService;
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every documented path and schema into the OpenAPI document served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::issue_token, handlers::check_admin, handlers::register_user,
        handlers::list_users, handlers::get_user, handlers::delete_user, handlers::make_admin,
        handlers::create_event, handlers::list_events, handlers::get_event,
        handlers::update_event, handlers::delete_event,
        handlers::create_gallery_item, handlers::list_gallery, handlers::get_gallery_item,
        handlers::update_gallery_item, handlers::delete_gallery_item, handlers::search_gallery
    ),
    components(
        schemas(
            models::Role, models::User, models::Event, models::GalleryItem,
            models::TokenRequest, models::TokenResponse, models::RegisterUserRequest,
            models::CreateEventRequest, models::UpdateEventRequest,
            models::CreateGalleryItemRequest, models::UpdateGalleryItemRequest,
            models::InsertResponse, models::UpdateResponse, models::DeleteResponse,
            models::AdminStatus, models::GallerySearchResponse,
        )
    ),
    tags(
        (name = "event-hub", description = "Events, gallery and user management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of shared services, cloned into every request. The
/// store client is injected here at startup rather than held in a global.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer: Postgres in production, in-memory for local runs and tests.
    pub repo: RepositoryState,
    /// Session token issuer/verifier built from the configured secret.
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: &AppConfig) -> Self {
        Self {
            repo,
            tokens: TokenService::new(&config.jwt_secret),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

/// create_router
///
/// Assembles the routing structure and the gate pipeline. The authenticated router is
/// wrapped in `require_auth`; the admin routes carry their own two-stage gate.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .merge(admin::admin_routes(&state))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its method, URI and
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
