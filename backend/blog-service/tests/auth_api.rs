//! HTTP tests for accounts, profile pictures and health endpoints.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use blog_service::handlers;
use blog_service::models::DEFAULT_PROFILE_PICTURE;
use common::{bearer, multipart, png, TestContext};
use serde_json::{json, Value};

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.state.clone())
                .configure(handlers::configure),
        )
        .await
    };
}

fn signup_body(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": "analytical-engine"
    })
}

#[actix_web::test]
async fn test_signup_then_profile() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(signup_body("Ada@Example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "User registered successfully");
    assert_eq!(json["user"]["email"], "ada@example.com");
    assert_eq!(json["user"]["profilePicture"], DEFAULT_PROFILE_PICTURE);
    assert!(json["user"].get("passwordHash").is_none());
    let token = json["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(&token))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["firstName"], "Ada");
    assert_eq!(profile["lastName"], "Lovelace");
    assert_eq!(profile["id"], json["user"]["id"]);
}

#[actix_web::test]
async fn test_duplicate_signup_conflicts() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(signup_body("ada@example.com"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(signup_body("ADA@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "User already exists");
}

#[actix_web::test]
async fn test_signup_validation() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: Value = test::read_body_json(resp).await;
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("must be a valid email address"));
    assert!(message.contains("must be at least 8 characters"));

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({"email": "ada@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    ctx.register("Alice").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"email": "alice@example.com", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Login successful");
    assert!(!json["token"].as_str().unwrap().is_empty());

    for body in [
        json!({"email": "alice@example.com", "password": "wrong-password"}),
        json!({"email": "nobody@example.com", "password": "password123"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn test_profile_requires_token() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/profile").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header((header::AUTHORIZATION, "Token abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Not authorized, no token");
}

#[actix_web::test]
async fn test_profile_picture_upload() {
    let ctx = TestContext::new();
    let app = app!(ctx);
    let (token, _) = ctx.register("Alice").await;

    let (content_type, body) = multipart(&[], &[png("profilePicture", "me.png")]);
    let req = test::TestRequest::put()
        .uri("/api/auth/profile-picture")
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "Profile picture updated");
    let picture = json["profilePicture"].as_str().unwrap().to_string();
    assert!(picture.starts_with("/uploads/"));

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(&token))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["profilePicture"], picture);

    let (content_type, body) = multipart(&[("note", "nothing attached")], &[]);
    let req = test::TestRequest::put()
        .uri("/api/auth/profile-picture")
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "No file uploaded");
}

#[actix_web::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let json: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "blog-service");

    let json: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/health/live").to_request(),
    )
    .await;
    assert_eq!(json["alive"], true);
}

#[actix_web::test]
async fn test_missing_upload_is_not_found() {
    let ctx = TestContext::new();
    let app = app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/uploads/nope.png").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: Value = test::read_body_json(resp).await;
    assert_eq!(json["message"], "File not found");
}
