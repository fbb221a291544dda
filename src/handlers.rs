use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        AdminStatus, CreateEventRequest, CreateGalleryItemRequest, DeleteResponse, Event,
        GalleryItem, GallerySearchResponse, InsertResponse, RegisterUserRequest, Role,
        TokenRequest, TokenResponse, UpdateEventRequest, UpdateGalleryItemRequest,
        UpdateResponse, User,
    },
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use uuid::Uuid;

/// Message returned when a registration hits an existing email.
pub const EMAIL_EXISTS: &str = "email exists";

// --- Filter Structs ---

/// GallerySearchQuery
///
/// Query parameters of `GET /gallery-search`. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GallerySearchQuery {
    /// Case-insensitive substring of the item title.
    pub title: Option<String>,
    /// Exact year the item is filed under.
    pub year: Option<String>,
}

// --- Helpers ---

/// Parses a path identifier, rejecting anything that is not a store identifier.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid identifier: {raw}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_field(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

// --- Token ---

/// issue_token
///
/// [Public Route] Issues a one-hour session token for the posted identity.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing email")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload?;
    require_field(&payload.email, "email")?;

    let token = state.tokens.issue(payload.email.trim())?;
    Ok(Json(TokenResponse { token }))
}

// --- Users ---

/// check_admin
///
/// [Authenticated Route] Reports whether the caller is an admin. The path email must be
/// the caller's own; probing another user's role is forbidden.
#[utoipa::path(
    get,
    path = "/user/admin/{email}",
    params(("email" = String, Path, description = "The caller's own email")),
    responses(
        (status = 200, description = "Admin status", body = AdminStatus),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Email is not the caller's")
    )
)]
pub async fn check_admin(
    AuthUser { email: caller }: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, ApiError> {
    if caller != email {
        tracing::warn!(%caller, requested = %email, "cross-user admin check rejected");
        return Err(ApiError::Forbidden);
    }

    let admin = state
        .repo
        .find_user_by_email(&email)
        .await?
        .is_some_and(|user| user.is_admin());

    Ok(Json(AdminStatus { admin }))
}

/// register_user
///
/// [Public Route] Stores a new member. Registering an email that already exists is not an
/// error: the response reports the skipped insert with `insertedId: null`.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (
            status = 200,
            description = "Inserted, or skipped for an existing email",
            body = InsertResponse
        ),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, ApiError> {
    let Json(mut payload) = payload?;
    require_field(&payload.email, "email")?;
    payload.email = payload.email.trim().to_string();

    if state.repo.find_user_by_email(&payload.email).await?.is_some() {
        return Ok(Json(InsertResponse::skipped(EMAIL_EXISTS)));
    }

    let response = match state.repo.insert_user(payload).await? {
        Some(id) => {
            tracing::info!(user_id = %id, "user registered");
            InsertResponse::inserted(id)
        }
        // Lost a race against a concurrent registration of the same email.
        None => InsertResponse::skipped(EMAIL_EXISTS),
    };
    Ok(Json(response))
}

/// list_users
///
/// [Admin Route] Lists every registered user.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.repo.list_users().await?))
}

/// get_user
///
/// [Admin Route] Retrieves a single user record.
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id)?;
    state
        .repo
        .find_user(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("user"))
}

/// delete_user
///
/// [Admin Route] Removes a user record.
#[utoipa::path(
    delete,
    path = "/user/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Delete acknowledgement", body = DeleteResponse))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.repo.delete_user(id).await?))
}

/// make_admin
///
/// [Admin Route] Promotes a user to the admin role. Takes effect on the user's next
/// admin-gated request, since the gate re-reads the role every time.
#[utoipa::path(
    patch,
    path = "/user/make-admin/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses((status = 200, description = "Update acknowledgement", body = UpdateResponse))
)]
pub async fn make_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_id(&id)?;
    let outcome = state.repo.set_user_role(id, Role::Admin).await?;
    if outcome.modified_count > 0 {
        tracing::info!(user_id = %id, "user promoted to admin");
    }
    Ok(Json(outcome))
}

// --- Events ---

/// create_event
///
/// [Admin Route] Inserts a new event.
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Insert acknowledgement", body = InsertResponse),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, ApiError> {
    let Json(payload) = payload?;
    require_field(&payload.title, "title")?;

    let id = state.repo.insert_event(payload).await?;
    tracing::info!(event_id = %id, "event created");
    Ok(Json(InsertResponse::inserted(id)))
}

/// list_events
///
/// [Public Route] Lists every event.
#[utoipa::path(
    get,
    path = "/events",
    responses((status = 200, description = "All events", body = [Event]))
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.repo.list_events().await?))
}

/// get_event
///
/// [Public Route] Retrieves a single event.
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = Event),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = parse_id(&id)?;
    state
        .repo
        .find_event(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("event"))
}

/// update_event
///
/// [Admin Route] Partially updates an event. Every stored field is sourced from the input
/// field of the same name. A present `title` must not be empty.
#[utoipa::path(
    patch,
    path = "/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Update acknowledgement", body = UpdateResponse),
        (status = 400, description = "Malformed payload or empty title")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    if let Some(title) = &payload.title {
        require_field(title, "title")?;
    }
    Ok(Json(state.repo.update_event(id, payload).await?))
}

/// delete_event
///
/// [Admin Route] Removes an event.
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = String, Path, description = "Event ID")),
    responses((status = 200, description = "Delete acknowledgement", body = DeleteResponse))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.repo.delete_event(id).await?))
}

// --- Gallery ---

/// create_gallery_item
///
/// [Admin Route] Inserts a new gallery item.
#[utoipa::path(
    post,
    path = "/gallery",
    request_body = CreateGalleryItemRequest,
    responses(
        (status = 200, description = "Insert acknowledgement", body = InsertResponse),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn create_gallery_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateGalleryItemRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, ApiError> {
    let Json(payload) = payload?;
    require_field(&payload.title, "title")?;
    require_field(&payload.image_ref, "imageRef")?;

    let id = state.repo.insert_gallery_item(payload).await?;
    tracing::info!(gallery_id = %id, "gallery item created");
    Ok(Json(InsertResponse::inserted(id)))
}

/// list_gallery
///
/// [Public Route] Lists every gallery item.
#[utoipa::path(
    get,
    path = "/gallery",
    responses((status = 200, description = "All gallery items", body = [GalleryItem]))
)]
pub async fn list_gallery(
    State(state): State<AppState>,
) -> Result<Json<Vec<GalleryItem>>, ApiError> {
    Ok(Json(state.repo.list_gallery().await?))
}

/// get_gallery_item
///
/// [Public Route] Retrieves a single gallery item.
#[utoipa::path(
    get,
    path = "/gallery/{id}",
    params(("id" = String, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Found", body = GalleryItem),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_gallery_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GalleryItem>, ApiError> {
    let id = parse_id(&id)?;
    state
        .repo
        .find_gallery_item(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("gallery item"))
}

/// update_gallery_item
///
/// [Admin Route] Partially updates a gallery item. A present `title` or `imageRef` must not
/// be empty.
#[utoipa::path(
    patch,
    path = "/gallery/{id}",
    params(("id" = String, Path, description = "Gallery item ID")),
    request_body = UpdateGalleryItemRequest,
    responses(
        (status = 200, description = "Update acknowledgement", body = UpdateResponse),
        (status = 400, description = "Malformed payload or empty required field")
    )
)]
pub async fn update_gallery_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateGalleryItemRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    if let Some(title) = &payload.title {
        require_field(title, "title")?;
    }
    if let Some(image_ref) = &payload.image_ref {
        require_field(image_ref, "imageRef")?;
    }
    Ok(Json(state.repo.update_gallery_item(id, payload).await?))
}

/// delete_gallery_item
///
/// [Admin Route] Removes a gallery item.
#[utoipa::path(
    delete,
    path = "/gallery/{id}",
    params(("id" = String, Path, description = "Gallery item ID")),
    responses((status = 200, description = "Delete acknowledgement", body = DeleteResponse))
)]
pub async fn delete_gallery_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.repo.delete_gallery_item(id).await?))
}

/// search_gallery
///
/// [Public Route] Filters gallery items by title substring and exact year, and returns
/// the distinct years of all events for the client's year dropdown.
#[utoipa::path(
    get,
    path = "/gallery-search",
    params(GallerySearchQuery),
    responses(
        (
            status = 200,
            description = "Matching items and event years",
            body = GallerySearchResponse
        ),
        (status = 500, description = "Store failure")
    )
)]
pub async fn search_gallery(
    State(state): State<AppState>,
    query: Result<Query<GallerySearchQuery>, QueryRejection>,
) -> Result<Json<GallerySearchResponse>, ApiError> {
    let Query(query) = query?;
    let title = non_empty(query.title);
    let year = non_empty(query.year);

    let result = state
        .repo
        .search_gallery(title.as_deref(), year.as_deref())
        .await?;
    let years = state.repo.event_years().await?;

    Ok(Json(GallerySearchResponse { result, years }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_uuid() {
        assert!(matches!(parse_id("not-an-id"), Err(ApiError::BadRequest(_))));
        assert!(parse_id("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
    }

    #[test]
    fn blank_filters_are_dropped() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" sun ".into())), Some("sun".into()));
        assert_eq!(non_empty(None), None);
    }
}
