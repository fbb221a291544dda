use super::{Repository, StoreError};
use crate::models::{
    CreateEventRequest, CreateGalleryItemRequest, DeleteResponse, Event, GalleryItem,
    RegisterUserRequest, Role, UpdateEventRequest, UpdateGalleryItemRequest, UpdateResponse,
    User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, photo, role, created_at";
const EVENT_COLUMNS: &str =
    "id, title, description, date, event_time, location, status, category, year, created_at";
const GALLERY_COLUMNS: &str = "id, title, year, image_ref, description, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL. Each
/// collection is a table; queries are checked at runtime so the crate builds without a
/// live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Escapes LIKE wildcards so user input is matched literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn update_counts((matched, modified): (i64, i64)) -> UpdateResponse {
    UpdateResponse::new(matched.max(0) as u64, modified.max(0) as u64)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// insert_user
    ///
    /// Uses `ON CONFLICT DO NOTHING` against the unique email index, so a registration that
    /// races past the handler's existence check is still reported as a no-op.
    async fn insert_user(&self, req: RegisterUserRequest) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (id, email, name, photo, role, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.email)
        .bind(req.name)
        .bind(req.photo)
        .bind(Role::Member.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// set_user_role
    ///
    /// Single statement: the CTE counts the matched row, the UPDATE only touches it when the
    /// role actually changes.
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<UpdateResponse, StoreError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH target AS (
                SELECT id, role FROM users WHERE id = $1
            ), updated AS (
                UPDATE users u SET role = $2
                FROM target t
                WHERE u.id = t.id AND t.role <> $2
                RETURNING u.id
            )
            SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(update_counts(counts))
    }

    async fn delete_user(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(DeleteResponse::new(res.rows_affected()))
    }

    async fn insert_event(&self, req: CreateEventRequest) -> Result<Uuid, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO events (
                id, title, description, date, event_time, location, status, category, year,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.description)
        .bind(req.date)
        .bind(req.event_time)
        .bind(req.location)
        .bind(req.status)
        .bind(req.category)
        .bind(req.year)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    /// update_event
    ///
    /// Uses `COALESCE` to handle `Option<T>` fields: a column is only written when the
    /// matching field of `req` is `Some`. Every column is sourced from its own parameter.
    async fn update_event(
        &self,
        id: Uuid,
        req: UpdateEventRequest,
    ) -> Result<UpdateResponse, StoreError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH target AS (
                SELECT * FROM events WHERE id = $1
            ), updated AS (
                UPDATE events e
                SET title = COALESCE($2::text, t.title),
                    description = COALESCE($3::text, t.description),
                    date = COALESCE($4::text, t.date),
                    event_time = COALESCE($5::text, t.event_time),
                    location = COALESCE($6::text, t.location),
                    status = COALESCE($7::text, t.status),
                    category = COALESCE($8::text, t.category),
                    year = COALESCE($9::text, t.year)
                FROM target t
                WHERE e.id = t.id
                  AND (COALESCE($2::text, t.title), COALESCE($3::text, t.description),
                       COALESCE($4::text, t.date), COALESCE($5::text, t.event_time),
                       COALESCE($6::text, t.location), COALESCE($7::text, t.status),
                       COALESCE($8::text, t.category), COALESCE($9::text, t.year))
                      IS DISTINCT FROM
                      (t.title, t.description, t.date, t.event_time,
                       t.location, t.status, t.category, t.year)
                RETURNING e.id
            )
            SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.date)
        .bind(req.event_time)
        .bind(req.location)
        .bind(req.status)
        .bind(req.category)
        .bind(req.year)
        .fetch_one(&self.pool)
        .await?;
        Ok(update_counts(counts))
    }

    async fn delete_event(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let res = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(DeleteResponse::new(res.rows_affected()))
    }

    async fn event_years(&self) -> Result<Vec<String>, StoreError> {
        let years = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT year FROM events WHERE year <> '' ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(years)
    }

    async fn insert_gallery_item(&self, req: CreateGalleryItemRequest) -> Result<Uuid, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO gallery (id, title, year, image_ref, description, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.year)
        .bind(req.image_ref)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_gallery(&self) -> Result<Vec<GalleryItem>, StoreError> {
        let items = sqlx::query_as::<_, GalleryItem>(&format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_gallery_item(&self, id: Uuid) -> Result<Option<GalleryItem>, StoreError> {
        let item = sqlx::query_as::<_, GalleryItem>(&format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> Result<UpdateResponse, StoreError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH target AS (
                SELECT * FROM gallery WHERE id = $1
            ), updated AS (
                UPDATE gallery g
                SET title = COALESCE($2::text, t.title),
                    year = COALESCE($3::text, t.year),
                    image_ref = COALESCE($4::text, t.image_ref),
                    description = COALESCE($5::text, t.description)
                FROM target t
                WHERE g.id = t.id
                  AND (COALESCE($2::text, t.title), COALESCE($3::text, t.year),
                       COALESCE($4::text, t.image_ref), COALESCE($5::text, t.description))
                      IS DISTINCT FROM
                      (t.title, t.year, t.image_ref, t.description)
                RETURNING g.id
            )
            SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.year)
        .bind(req.image_ref)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(update_counts(counts))
    }

    async fn delete_gallery_item(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let res = sqlx::query("DELETE FROM gallery WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(DeleteResponse::new(res.rows_affected()))
    }

    /// search_gallery
    ///
    /// Builds the filter with `QueryBuilder` so both inputs stay bound parameters.
    async fn search_gallery(
        &self,
        title: Option<&str>,
        year: Option<&str>,
    ) -> Result<Vec<GalleryItem>, StoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {GALLERY_COLUMNS} FROM gallery WHERE TRUE"));

        if let Some(t) = title {
            builder.push(" AND title ILIKE ");
            builder.push_bind(like_pattern(t));
            builder.push(r" ESCAPE '\'");
        }

        if let Some(y) = year {
            builder.push(" AND year = ");
            builder.push_bind(y.to_string());
        }

        builder.push(" ORDER BY created_at ASC");

        let items = builder
            .build_query_as::<GalleryItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("sun"), "%sun%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
