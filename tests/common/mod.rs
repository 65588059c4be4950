//! Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use rental::prelude::*;
use serde_json::{Value, json};

pub const ADMIN_ID: &str = "00000000-0000-4000-8000-000000000001";

pub fn test_server() -> TestServer {
    test_server_with(RentalConfig::default())
}

pub fn test_server_with(config: RentalConfig) -> TestServer {
    let app = ServerBuilder::new(config)
        .with_store(InMemoryStore::new())
        .build()
        .expect("Failed to build router");
    TestServer::try_new(app).expect("Failed to create test server")
}

pub fn admin_id() -> Uuid {
    Uuid::parse_str(ADMIN_ID).expect("valid admin id")
}

/// Authenticate the request as a regular user
pub fn as_user(request: TestRequest, user_id: Uuid) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user_id.to_string()).expect("valid header"),
    )
}

/// Authenticate the request as the administrator
pub fn as_admin(request: TestRequest) -> TestRequest {
    as_user(request, admin_id()).add_header(
        HeaderName::from_static("x-user-role"),
        HeaderValue::from_static("admin"),
    )
}

pub fn id_of(body: &Value) -> Uuid {
    Uuid::parse_str(body["id"].as_str().expect("id in body")).expect("uuid id")
}

pub async fn create_user(server: &TestServer, username: &str) -> Uuid {
    let response = as_admin(server.post("/users"))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "first_name": "Anna",
            "last_name": "Nowak",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    id_of(&response.json::<Value>())
}

pub async fn create_category(server: &TestServer, name: &str) -> Uuid {
    let response = as_admin(server.post("/categories"))
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(StatusCode::CREATED);
    id_of(&response.json::<Value>())
}

pub async fn create_item(server: &TestServer, category: Uuid, name: &str) -> Uuid {
    let response = as_admin(server.post("/items"))
        .json(&json!({
            "category": category,
            "name": name,
            "description": format!("A {} for rent", name.to_lowercase()),
            "price": 10.0,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    id_of(&response.json::<Value>())
}

pub async fn item_status(server: &TestServer, item: Uuid) -> String {
    let response = server.get(&format!("/items/{}", item)).await;
    response.assert_status_ok();
    response.json::<Value>()["status"]
        .as_str()
        .expect("status in body")
        .to_string()
}

/// Request a rental of `item` for `user` over January 2024
pub async fn rent(server: &TestServer, user: Uuid, item: Uuid) -> axum_test::TestResponse {
    as_user(server.post("/rentals/rent"), user)
        .json(&json!({
            "item": item,
            "start_date": "2024-01-01",
            "end_date": "2024-01-10",
        }))
        .await
}
