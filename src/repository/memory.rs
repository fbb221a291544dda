use super::{Repository, StoreError};
use crate::models::{
    CreateEventRequest, CreateGalleryItemRequest, DeleteResponse, Event, GalleryItem,
    RegisterUserRequest, Role, UpdateEventRequest, UpdateGalleryItemRequest, UpdateResponse,
    User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    events: Vec<Event>,
    gallery: Vec<GalleryItem>,
}

/// MemoryRepository
///
/// In-process implementation of the `Repository` contract. Used when no `DATABASE_URL` is
/// configured in the local environment, and as the store behind the integration tests.
/// Collections keep insertion order.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Collections>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user record as-is, bypassing registration rules. Lets local setups and
    /// tests seed an initial admin.
    pub async fn seed_user(&self, email: &str, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.users.push(User {
            id,
            email: email.to_string(),
            name: None,
            photo: None,
            role,
            created_at: Utc::now(),
        });
        id
    }
}

/// Writes `value` into `slot` when present, reporting whether the stored value changed.
fn apply<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

fn update_outcome(found: bool, changed: bool) -> UpdateResponse {
    UpdateResponse::new(found as u64, (found && changed) as u64)
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn insert_user(&self, req: RegisterUserRequest) -> Result<Option<Uuid>, StoreError> {
        // Check and insert under one write lock.
        let mut guard = self.inner.write().await;
        if guard.users.iter().any(|u| u.email == req.email) {
            return Ok(None);
        }
        let id = Uuid::new_v4();
        guard.users.push(User {
            id,
            email: req.email,
            name: req.name,
            photo: req.photo,
            role: Role::Member,
            created_at: Utc::now(),
        });
        Ok(Some(id))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<UpdateResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let outcome = match guard.users.iter_mut().find(|u| u.id == id) {
            Some(user) => update_outcome(true, apply(&mut user.role, Some(role))),
            None => update_outcome(false, false),
        };
        Ok(outcome)
    }

    async fn delete_user(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let before = guard.users.len();
        guard.users.retain(|u| u.id != id);
        Ok(DeleteResponse::new((before - guard.users.len()) as u64))
    }

    async fn insert_event(&self, req: CreateEventRequest) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.inner.write().await.events.push(Event {
            id,
            title: req.title,
            description: req.description,
            date: req.date,
            event_time: req.event_time,
            location: req.location,
            status: req.status,
            category: req.category,
            year: req.year,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.inner.read().await.events.clone())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.events.iter().find(|e| e.id == id).cloned())
    }

    async fn update_event(
        &self,
        id: Uuid,
        req: UpdateEventRequest,
    ) -> Result<UpdateResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let Some(event) = guard.events.iter_mut().find(|e| e.id == id) else {
            return Ok(update_outcome(false, false));
        };
        let changes = [
            apply(&mut event.title, req.title),
            apply(&mut event.description, req.description),
            apply(&mut event.date, req.date),
            apply(&mut event.event_time, req.event_time),
            apply(&mut event.location, req.location),
            apply(&mut event.status, req.status),
            apply(&mut event.category, req.category),
            apply(&mut event.year, req.year),
        ];
        Ok(update_outcome(true, changes.contains(&true)))
    }

    async fn delete_event(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let before = guard.events.len();
        guard.events.retain(|e| e.id != id);
        Ok(DeleteResponse::new((before - guard.events.len()) as u64))
    }

    async fn event_years(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.inner.read().await;
        let years: BTreeSet<&str> = guard
            .events
            .iter()
            .map(|e| e.year.as_str())
            .filter(|y| !y.is_empty())
            .collect();
        Ok(years.into_iter().rev().map(str::to_string).collect())
    }

    async fn insert_gallery_item(&self, req: CreateGalleryItemRequest) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.inner.write().await.gallery.push(GalleryItem {
            id,
            title: req.title,
            year: req.year,
            image_ref: req.image_ref,
            description: req.description,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_gallery(&self) -> Result<Vec<GalleryItem>, StoreError> {
        Ok(self.inner.read().await.gallery.clone())
    }

    async fn find_gallery_item(&self, id: Uuid) -> Result<Option<GalleryItem>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.gallery.iter().find(|g| g.id == id).cloned())
    }

    async fn update_gallery_item(
        &self,
        id: Uuid,
        req: UpdateGalleryItemRequest,
    ) -> Result<UpdateResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let Some(item) = guard.gallery.iter_mut().find(|g| g.id == id) else {
            return Ok(update_outcome(false, false));
        };
        let changes = [
            apply(&mut item.title, req.title),
            apply(&mut item.year, req.year),
            apply(&mut item.image_ref, req.image_ref),
            apply(&mut item.description, req.description.map(Some)),
        ];
        Ok(update_outcome(true, changes.contains(&true)))
    }

    async fn delete_gallery_item(&self, id: Uuid) -> Result<DeleteResponse, StoreError> {
        let mut guard = self.inner.write().await;
        let before = guard.gallery.len();
        guard.gallery.retain(|g| g.id != id);
        Ok(DeleteResponse::new((before - guard.gallery.len()) as u64))
    }

    async fn search_gallery(
        &self,
        title: Option<&str>,
        year: Option<&str>,
    ) -> Result<Vec<GalleryItem>, StoreError> {
        let needle = title.map(str::to_lowercase);
        let guard = self.inner.read().await;
        let items = guard
            .gallery
            .iter()
            .filter(|g| {
                needle
                    .as_deref()
                    .is_none_or(|n| g.title.to_lowercase().contains(n))
            })
            .filter(|g| year.is_none_or(|y| g.year == y))
            .cloned()
            .collect();
        Ok(items)
    }
}
