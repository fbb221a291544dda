use crate::models::{
    CreateEventRequest, CreateGalleryItemRequest, DeleteResponse, Event, GalleryItem,
    RegisterUserRequest, Role, UpdateEventRequest, UpdateGalleryItemRequest, UpdateResponse,
    User,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// StoreError
///
/// Any failure of the persistence layer. Handlers convert it into `ApiError::Internal`;
/// the details are only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Repository Trait
///
/// The document store contract. Each method maps to exactly one store operation on one
/// collection (`users`, `events`, `gallery`), so every handler performs a predictable
/// number of reads and writes.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    /// Inserts a member-role user. Returns `None` without inserting when the email is
    /// already registered.
    async fn insert_user(&self, req: RegisterUserRequest) -> Result<Option<Uuid>, StoreError>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<UpdateResponse, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<DeleteResponse, StoreError>;

    // --- Events ---
    async fn insert_event(&self, req: CreateEventRequest) -> Result<Uuid, StoreError>;
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
    /// Partial update: only the fields present in `req` are written.
    async fn update_event(
        &self,
        id: Uuid,
        req: UpdateEventRequest,
    ) -> Result<UpdateResponse, StoreError>;
    async fn delete_event(&self, id: Uuid) -> Result<DeleteResponse, StoreError>;
    /// Distinct non-empty `year` values across all events, newest first.
    async fn event_years(&self) -> Result<Vec<String>, StoreError>;

    // --- Gallery ---
    async fn insert_gallery_item(&self, req: CreateGalleryItemRequest) -> Result<Uuid, StoreError>;
    async fn list_gallery(&self) -> Result<Vec<GalleryItem>, StoreError>;
    async fn find_gallery_item(&self, id: Uuid) -> Result<Option<GalleryItem>, StoreError>;
    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> Result<UpdateResponse, StoreError>;
    async fn delete_gallery_item(&self, id: Uuid) -> Result<DeleteResponse, StoreError>;
    /// Case-insensitive substring match on `title` and exact match on `year`.
    /// A `None` filter matches everything.
    async fn search_gallery(
        &self,
        title: Option<&str>,
        year: Option<&str>,
    ) -> Result<Vec<GalleryItem>, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
