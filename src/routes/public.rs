use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and reachable by any client: liveness, token
/// issuance, registration and every read on events and the gallery.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness check.
        .route("/", get(|| async { "running" }))
        // POST /jwt
        // Issues a one-hour session token for the posted email.
        .route("/jwt", post(handlers::issue_token))
        // POST /users
        // Registration. A repeated email is answered with a no-op acknowledgement.
        .route("/users", post(handlers::register_user))
        // GET /events, GET /events/{id}
        .route("/events", get(handlers::list_events))
        .route("/events/{id}", get(handlers::get_event))
        // GET /gallery, GET /gallery/{id}
        .route("/gallery", get(handlers::list_gallery))
        .route("/gallery/{id}", get(handlers::get_gallery_item))
        // GET /gallery-search?title=...&year=...
        // Title substring + exact year filter, plus the distinct event years.
        .route("/gallery-search", get(handlers::search_gallery))
}
