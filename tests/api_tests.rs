use event_hub::{
    AppConfig, AppState, MemoryRepository, create_router, models::Role, repository::Repository,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

const ADMIN_EMAIL: &str = "admin@example.com";

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed_user(ADMIN_EMAIL, Role::Admin).await;

    let router = create_router(AppState::new(repo.clone(), &AppConfig::default()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

async fn login(client: &reqwest::Client, app: &TestApp, email: &str) -> String {
    let body: Value = client
        .post(format!("{}/jwt", app.address))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("jwt request failed")
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_liveness_check() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/", app.address)).await.expect("req fail");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "running");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/events", app.address)).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"].get("/gallery-search").is_some());
    assert!(doc["paths"].get("/user/make-admin/{id}").is_some());
}

#[tokio::test]
async fn test_event_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app, ADMIN_EMAIL).await;

    // Create
    let created: Value = client
        .post(format!("{}/events", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Gala",
            "description": "Annual gala",
            "date": "2024-05-01",
            "eventTime": "19:00",
            "location": "Main hall",
            "status": "upcoming",
            "category": "social",
            "year": "2024"
        }))
        .send()
        .await
        .expect("post fail")
        .json()
        .await
        .unwrap();
    let id = created["insertedId"].as_str().unwrap().to_string();

    // Read back
    let event: Value = reqwest::get(format!("{}/events/{}", app.address, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(event["description"], "Annual gala");

    // Update
    let resp = client
        .patch(format!("{}/events/{}", app.address, id))
        .bearer_auth(&token)
        .json(&json!({ "status": "finished" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Delete
    let resp = client
        .delete(format!("{}/events/{}", app.address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let ack: Value = resp.json().await.unwrap();
    assert_eq!(ack["deletedCount"], 1);
}

#[tokio::test]
async fn test_registration_and_promotion_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Register a new member and log in as them.
    let registered: Value = client
        .post(format!("{}/users", app.address))
        .json(&json!({ "email": "jane@example.com", "name": "Jane" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let jane_id = registered["insertedId"].as_str().unwrap().to_string();
    let jane_token = login(&client, &app, "jane@example.com").await;

    let check: Value = client
        .get(format!("{}/user/admin/jane@example.com", app.address))
        .bearer_auth(&jane_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["admin"], false);

    let resp = client
        .post(format!("{}/gallery", app.address))
        .bearer_auth(&jane_token)
        .json(&json!({ "title": "Crowd", "year": "2024", "imageRef": "crowd.jpg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // An admin promotes her.
    let admin_token = login(&client, &app, ADMIN_EMAIL).await;
    let resp = client
        .patch(format!("{}/user/make-admin/{}", app.address, jane_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Her existing token now passes the gate.
    let resp = client
        .post(format!("{}/gallery", app.address))
        .bearer_auth(&jane_token)
        .json(&json!({ "title": "Crowd", "year": "2024", "imageRef": "crowd.jpg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(app.repo.list_users().await.unwrap().len(), 2);
}
