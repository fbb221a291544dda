use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that need a valid session token but no particular role. The router is wrapped
/// in the `require_auth` stage by `create_router`; handlers receive the caller through
/// the `AuthUser` extractor.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /user/admin/{email}
        // Self-check of the caller's admin role. The path email must match the token's.
        .route("/user/admin/{email}", get(handlers::check_admin))
}
