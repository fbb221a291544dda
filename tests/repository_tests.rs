use event_hub::{
    MemoryRepository,
    models::{
        CreateEventRequest, CreateGalleryItemRequest, RegisterUserRequest, Role,
        UpdateEventRequest, UpdateResponse,
    },
    repository::Repository,
};
use std::sync::Arc;
use uuid::Uuid;

fn event(title: &str, year: &str) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        description: format!("{title} description"),
        date: format!("{year}-06-01"),
        year: year.to_string(),
        ..CreateEventRequest::default()
    }
}

fn gallery(title: &str, year: &str) -> CreateGalleryItemRequest {
    CreateGalleryItemRequest {
        title: title.to_string(),
        year: year.to_string(),
        image_ref: format!("{title}.png"),
        description: None,
    }
}

fn register(email: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        email: email.to_string(),
        ..RegisterUserRequest::default()
    }
}

#[tokio::test]
async fn test_insert_user_skips_existing_email() {
    let repo = MemoryRepository::new();

    let first = repo.insert_user(register("dup@example.com")).await.unwrap();
    let second = repo.insert_user(register("dup@example.com")).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(repo.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_registrations_insert_once() {
    let repo = Arc::new(MemoryRepository::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.insert_user(register("race@example.com"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            inserted += 1;
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(repo.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_new_users_are_members() {
    let repo = MemoryRepository::new();
    let id = repo.insert_user(register("m@example.com")).await.unwrap().unwrap();

    let user = repo.find_user(id).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Member);
    assert!(!user.is_admin());
}

#[tokio::test]
async fn test_set_user_role_counts() {
    let repo = MemoryRepository::new();
    let id = repo.seed_user("x@example.com", Role::Member).await;

    assert_eq!(repo.set_user_role(id, Role::Admin).await.unwrap(), UpdateResponse::new(1, 1));
    assert_eq!(repo.set_user_role(id, Role::Admin).await.unwrap(), UpdateResponse::new(1, 0));
    assert_eq!(
        repo.set_user_role(Uuid::new_v4(), Role::Admin).await.unwrap(),
        UpdateResponse::new(0, 0)
    );
}

#[tokio::test]
async fn test_update_event_only_touches_given_fields() {
    let repo = MemoryRepository::new();
    let id = repo.insert_event(event("Gala", "2024")).await.unwrap();

    let outcome = repo
        .update_event(
            id,
            UpdateEventRequest {
                description: Some("Updated".to_string()),
                ..UpdateEventRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, UpdateResponse::new(1, 1));

    let stored = repo.find_event(id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Gala");
    assert_eq!(stored.description, "Updated");
    assert_eq!(stored.year, "2024");
}

#[tokio::test]
async fn test_event_years_are_distinct_and_skip_blanks() {
    let repo = MemoryRepository::new();
    for (title, year) in [("a", "2022"), ("b", "2024"), ("c", "2022"), ("d", "")] {
        repo.insert_event(event(title, year)).await.unwrap();
    }

    assert_eq!(repo.event_years().await.unwrap(), ["2024", "2022"]);
}

#[tokio::test]
async fn test_search_gallery_filters() {
    let repo = MemoryRepository::new();
    for (title, year) in [("Sunset", "2023"), ("sunrise", "2022"), ("Harbour", "2023")] {
        repo.insert_gallery_item(gallery(title, year)).await.unwrap();
    }

    let by_title = repo.search_gallery(Some("SUN"), None).await.unwrap();
    assert_eq!(by_title.len(), 2);

    let by_year = repo.search_gallery(None, Some("2023")).await.unwrap();
    let titles: Vec<&str> = by_year.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, ["Sunset", "Harbour"]);

    let both = repo.search_gallery(Some("rise"), Some("2023")).await.unwrap();
    assert!(both.is_empty());

    // Year is an exact match, not a prefix.
    assert!(repo.search_gallery(None, Some("202")).await.unwrap().is_empty());

    assert_eq!(repo.search_gallery(None, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_counts() {
    let repo = MemoryRepository::new();
    let id = repo.insert_gallery_item(gallery("Stage", "2024")).await.unwrap();

    assert_eq!(repo.delete_gallery_item(id).await.unwrap().deleted_count, 1);
    assert_eq!(repo.delete_gallery_item(id).await.unwrap().deleted_count, 0);
    assert!(repo.find_gallery_item(id).await.unwrap().is_none());
}
