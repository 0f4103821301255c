//! User API tests, run against the router in-process.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use minihive::api::{router, ApiContext};
use minihive::store::UserStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> axum::Router {
    router(ApiContext::local(UserStore::authoritative().into_shared()))
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn as_text(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}

async fn create(app: &axum::Router, body: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/users", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    as_json(&body)
}

#[tokio::test]
async fn empty_store_lists_no_users() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!([]));
}

#[tokio::test]
async fn created_user_gets_a_server_assigned_id() {
    let app = app();
    let created = create(
        &app,
        json!({"username": "alice", "age": 30, "hobbies": ["reading"]}),
    )
    .await;

    let id = created["id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(created["username"], "alice");
    assert_eq!(created["age"], 30);
    assert_eq!(created["hobbies"], json!(["reading"]));

    let (status, body) = send(&app, Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), created);

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!([created]));
}

#[tokio::test]
async fn create_rejects_invalid_bodies_with_exact_messages() {
    let app = app();
    let cases = [
        (
            json!({"age": 30, "hobbies": []}),
            "Username is required and must be a string",
        ),
        (
            json!({"username": "", "age": 30, "hobbies": []}),
            "Username is required and must be a string",
        ),
        (
            json!({"username": "a", "hobbies": []}),
            "Age is required and must be a number",
        ),
        (
            json!({"username": "a", "age": "30", "hobbies": []}),
            "Age is required and must be a number",
        ),
        (
            json!({"username": "a", "age": 30}),
            "Hobbies must be an array of strings",
        ),
        (
            json!({"username": "a", "age": 30, "hobbies": ["x", 1]}),
            "Hobbies must be an array of strings",
        ),
    ];

    for (body, expected) in cases {
        let (status, body) = send(&app, Method::POST, "/api/users", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(as_text(&body), expected);
    }
}

#[tokio::test]
async fn malformed_json_is_an_internal_error() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(as_text(&body), "Internal Server Error");
}

#[tokio::test]
async fn multi_megabyte_bodies_are_buffered_whole() {
    let app = app();
    let username = "b".repeat(3 * 1024 * 1024);
    let created = create(
        &app,
        json!({"username": username, "age": 1, "hobbies": []}),
    )
    .await;
    assert_eq!(created["username"].as_str().unwrap().len(), 3 * 1024 * 1024);
}

#[tokio::test]
async fn lookup_validates_the_id_before_searching() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/users/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_text(&body), "Invalid User ID format");

    // uuid shapes the parser itself would take, but the contract is the
    // hyphenated form only
    for alias in [
        "123e4567e89b12d3a456426614174000",
        "urn:uuid:123e4567-e89b-12d3-a456-426614174000",
    ] {
        let (status, body) = send(&app, Method::GET, &format!("/api/users/{alias}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{alias}");
        assert_eq!(as_text(&body), "Invalid User ID format", "{alias}");
    }

    let absent = uuid::Uuid::new_v4();
    let (status, body) = send(&app, Method::GET, &format!("/api/users/{absent}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_text(&body), "User not found");
}

#[tokio::test]
async fn update_merges_partial_fields() {
    let app = app();
    let created = create(
        &app,
        json!({"username": "bob", "age": 25, "hobbies": ["chess"]}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{id}"),
        Some(json!({"age": 26, "hobbies": ["chess", "hiking"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = as_json(&body);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["username"], "bob");
    assert_eq!(updated["age"], 26);
    assert_eq!(updated["hobbies"], json!(["chess", "hiking"]));

    let (_, body) = send(&app, Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(as_json(&body), updated);
}

#[tokio::test]
async fn update_validates_id_and_existence_before_the_body() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/zzz",
        Some(json!({"hobbies": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_text(&body), "Invalid User ID format");

    let absent = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{absent}"),
        Some(json!({"hobbies": []})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_text(&body), "User not found");
}

#[tokio::test]
async fn update_rejects_typed_fields_and_missing_hobbies() {
    let app = app();
    let created = create(&app, json!({"username": "c", "age": 1, "hobbies": []})).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/users/{id}");

    let cases = [
        (json!({"username": 1, "hobbies": []}), "Username must be a string"),
        (json!({"age": "x", "hobbies": []}), "Age must be a number"),
        (json!({"username": "ok"}), "Hobbies must be an array of strings"),
    ];
    for (body, expected) in cases {
        let (status, body) = send(&app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(as_text(&body), expected);
    }
}

#[tokio::test]
async fn update_cannot_smuggle_a_new_id() {
    let app = app();
    let created = create(&app, json!({"username": "d", "age": 2, "hobbies": []})).await;
    let id = created["id"].as_str().unwrap();

    let foreign = uuid::Uuid::new_v4().to_string();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/users/{id}"),
        Some(json!({"id": foreign, "hobbies": ["spoofing"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["id"], *id);

    let (status, _) = send(&app, Method::GET, &format!("/api/users/{foreign}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_removes_and_404s_afterwards() {
    let app = app();
    let created = create(&app, json!({"username": "e", "age": 3, "hobbies": []})).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/users/{id}");

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_text(&body), "User not found");
}

#[tokio::test]
async fn delete_rejects_malformed_ids() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, "/api/users/9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_text(&body), "Invalid User ID format");
}

#[tokio::test]
async fn anything_else_is_not_found() {
    let app = app();
    for (method, uri) in [
        (Method::GET, "/"),
        (Method::GET, "/api"),
        (Method::GET, "/api/users/a/b"),
        (Method::POST, "/api/something"),
        // a known path with a method the route does not serve
        (Method::DELETE, "/api/users"),
        (Method::PATCH, "/api/users/123e4567-e89b-12d3-a456-426614174000"),
    ] {
        let (status, body) = send(&app, method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(as_text(&body), "Not Found", "{method} {uri}");
    }
}
