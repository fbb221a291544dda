use event_hub::models::{
    AdminStatus, CreateEventRequest, DeleteResponse, Event, GallerySearchResponse,
    InsertResponse, Role, UpdateEventRequest, UpdateResponse, User,
};
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_event_uses_camel_case_keys() {
    let event = Event {
        title: "Gala".to_string(),
        event_time: "19:00".to_string(),
        ..Event::default()
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["eventTime"], "19:00");
    assert!(value.get("event_time").is_none());
    assert!(value.get("createdAt").is_some());
}

#[test]
fn test_role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
    assert_eq!(serde_json::to_value(Role::Member).unwrap(), json!("member"));
    assert!(serde_json::from_value::<Role>(json!("owner")).is_err());
    assert_eq!(Role::try_from("admin".to_string()).unwrap(), Role::Admin);
    assert!(Role::try_from("root".to_string()).is_err());
}

#[test]
fn test_user_json_shape() {
    let user = User {
        email: "u@example.com".to_string(),
        role: Role::Admin,
        ..User::default()
    };
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["role"], "admin");
    assert!(value["name"].is_null());
}

#[test]
fn test_insert_response_contracts() {
    let id = Uuid::new_v4();
    assert_eq!(
        serde_json::to_value(InsertResponse::inserted(id)).unwrap(),
        json!({ "acknowledged": true, "insertedId": id.to_string() })
    );
    assert_eq!(
        serde_json::to_value(InsertResponse::skipped("email exists")).unwrap(),
        json!({ "acknowledged": false, "insertedId": null, "message": "email exists" })
    );
}

#[test]
fn test_update_and_delete_contracts() {
    assert_eq!(
        serde_json::to_value(UpdateResponse::new(1, 0)).unwrap(),
        json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 0 })
    );
    assert_eq!(
        serde_json::to_value(DeleteResponse::new(1)).unwrap(),
        json!({ "acknowledged": true, "deletedCount": 1 })
    );
    assert_eq!(
        serde_json::to_value(AdminStatus { admin: true }).unwrap(),
        json!({ "admin": true })
    );
}

#[test]
fn test_create_event_defaults_optional_fields() {
    let req: CreateEventRequest = serde_json::from_value(json!({
        "title": "Gala",
        "description": "Annual gala",
        "date": "2024-05-01"
    }))
    .unwrap();
    assert_eq!(req.event_time, "");
    assert_eq!(req.year, "");

    assert!(serde_json::from_value::<CreateEventRequest>(json!({ "title": "Gala" })).is_err());
}

#[test]
fn test_update_event_reads_each_field_by_name() {
    let req: UpdateEventRequest = serde_json::from_value(json!({
        "title": "T",
        "description": "D",
        "eventTime": "20:00"
    }))
    .unwrap();
    assert_eq!(req.title.as_deref(), Some("T"));
    assert_eq!(req.description.as_deref(), Some("D"));
    assert_eq!(req.event_time.as_deref(), Some("20:00"));
    assert!(req.location.is_none());
}

#[test]
fn test_gallery_search_response_shape() {
    let value = serde_json::to_value(GallerySearchResponse {
        result: vec![],
        years: vec!["2024".to_string()],
    })
    .unwrap();
    assert_eq!(value, json!({ "result": [], "years": ["2024"] }));
}
