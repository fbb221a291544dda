use crate::{AppState, auth, handlers};
use axum::{
    Router, middleware,
    routing::{MethodRouter, get, patch, post},
};

/// Admin Router Module
///
/// Every write on events and the gallery, and all user management.
///
/// Access Control:
/// Each method router is wrapped in the full gate: `require_auth` first, then
/// `require_admin`, which re-reads the caller's role from the `users` collection before
/// any handler here runs. The gate sits on the method routers rather than the whole
/// router so that paths shared with the public routes keep answering unknown methods
/// with 405 instead of 401.
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    // Route layers run outermost last-added.
    let gated = |routes: MethodRouter<AppState>| {
        routes
            .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth))
    };

    Router::new()
        // --- User management ---
        .route("/users", gated(get(handlers::list_users)))
        .route(
            "/user/{id}",
            gated(get(handlers::get_user).delete(handlers::delete_user)),
        )
        // PATCH /user/make-admin/{id}
        // Promotes a member. The role change applies on the user's next gated request.
        .route("/user/make-admin/{id}", gated(patch(handlers::make_admin)))
        // --- Events ---
        .route("/events", gated(post(handlers::create_event)))
        .route(
            "/events/{id}",
            gated(patch(handlers::update_event).delete(handlers::delete_event)),
        )
        // --- Gallery ---
        .route("/gallery", gated(post(handlers::create_gallery_item)))
        .route(
            "/gallery/{id}",
            gated(patch(handlers::update_gallery_item).delete(handlers::delete_gallery_item)),
        )
}
