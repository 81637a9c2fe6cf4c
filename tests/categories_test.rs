mod common;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, EntityTrait};
use serde_json::json;

use learnhub_api::config::{Config, Environment};
use learnhub_api::state::AppState;
use learnhub_api::storage::fs::FsMediaStore;

// ─────────────────────────────────────────────────────────────────────────────
// Test Infrastructure
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::unwrap_used)]
async fn test_app() -> (Router, DatabaseConnection, tempfile::TempDir) {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let uploads = tempfile::tempdir().unwrap();
    let media = Arc::new(FsMediaStore::new(uploads.path()));

    let state = AppState {
        db: db.clone(),
        config: Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_secs: 86_400,
            upload_dir: uploads.path().to_string_lossy().to_string(),
            frontend_url: "http://localhost:3001".to_string(),
        },
        media,
    };

    (
        learnhub_api::routes::router().with_state(state),
        db,
        uploads,
    )
}

/// Sign up a new user and return (token, `user_id`).
async fn signup(app: &Router, suffix: &str) -> (String, String) {
    let (status, body) = common::post_json(
        app,
        "/api/v1/auth/signup",
        &json!({
            "email": format!("user{suffix}@example.com"),
            "fullName": format!("User {suffix}"),
            "password": "SecurePass123!",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let token = v["token"].as_str().unwrap_or_default().to_string();
    let user_id = v["user"]["id"].as_str().unwrap_or_default().to_string();
    (token, user_id)
}

/// Promote an account to admin directly in the database, then sign the user
/// in again so the token carries the new role.
async fn signup_admin(app: &Router, db: &DatabaseConnection, suffix: &str) -> String {
    let (_, user_id) = signup(app, suffix).await;
    let id: uuid::Uuid = user_id.parse().unwrap_or_default();

    let Some(user) = learnhub_api::entities::user::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap_or_default()
    else {
        return String::new();
    };
    let mut active: learnhub_api::entities::user::ActiveModel = user.into();
    active.role = ActiveValue::Set("admin".to_string());
    let _ = active.update(db).await.ok();

    let (status, body) = common::post_json(
        app,
        "/api/v1/auth/signin",
        &json!({
            "email": format!("user{suffix}@example.com"),
            "password": "SecurePass123!",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "admin signin failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    v["token"].as_str().unwrap_or_default().to_string()
}

fn category_form(name: &str) -> common::FormData {
    common::FormData::new()
        .text("name", name)
        .file("imageFile", "cover.png", "image/png", b"fake png bytes")
}

async fn create_category(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) =
        common::post_form_with_auth(app, "/api/v1/categories", category_form(name), token).await;
    assert_eq!(status, StatusCode::CREATED, "create category failed: {body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    v["id"].as_i64().unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Create
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_category_success() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "cc1").await;

    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", category_form("Programming"), &admin)
            .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["name"], "Programming");
    let url = v["coverImageUrl"].as_str().unwrap_or_default();
    assert!(url.starts_with("/uploads/"), "unexpected url: {url}");
    assert!(url.ends_with(".png"), "unexpected url: {url}");
}

#[tokio::test]
async fn create_category_forbidden_for_non_admin() {
    let (app, _db, _uploads) = test_app().await;
    let (token, _) = signup(&app, "cc2").await;

    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", category_form("Design"), &token)
            .await;

    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
async fn create_category_missing_image() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "cc3").await;

    let form = common::FormData::new().text("name", "No Image");
    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", form, &admin).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["error"]["message"], "Please upload an image.");
}

#[tokio::test]
async fn create_category_rejects_non_image_extension() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "cc4").await;

    let form = common::FormData::new()
        .text("name", "Bad Upload")
        .file("imageFile", "script.exe", "image/png", b"mz");
    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", form, &admin).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(
        v["error"]["message"],
        "Only JPG, JPEG, PNG files are allowed."
    );

    // The rejected upload must not leave a row behind
    let (_, body) = common::get(&app, "/api/v1/categories").await;
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v.as_array().map_or(0, Vec::len), 0);
}

#[tokio::test]
async fn create_category_rejects_mismatched_content_type() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "cc5").await;

    let form = common::FormData::new()
        .text("name", "Bad Type")
        .file("imageFile", "cover.png", "application/pdf", b"%PDF");
    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", form, &admin).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
}

#[tokio::test]
async fn create_category_missing_name() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "cc6").await;

    let form =
        common::FormData::new().file("imageFile", "cover.png", "image/png", b"fake png bytes");
    let (status, body) =
        common::post_form_with_auth(&app, "/api/v1/categories", form, &admin).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["error"]["field"], "name");
}

// ─────────────────────────────────────────────────────────────────────────────
// Read
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_categories_is_public() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "lc1").await;
    let _ = create_category(&app, &admin, "Art").await;
    let _ = create_category(&app, &admin, "Business").await;

    let (status, body) = common::get(&app, "/api/v1/categories").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v.as_array().map_or(0, Vec::len), 2);
}

#[tokio::test]
async fn get_category_not_found() {
    let (app, _db, _uploads) = test_app().await;

    let (status, body) = common::get(&app, "/api/v1/categories/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

// ─────────────────────────────────────────────────────────────────────────────
// Update
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_category_name_keeps_image() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "uc1").await;
    let id = create_category(&app, &admin, "Old Name").await;

    let (_, before) = common::get(&app, &format!("/api/v1/categories/{id}")).await;
    let before: serde_json::Value = serde_json::from_str(&before).unwrap_or_default();

    let form = common::FormData::new().text("name", "New Name");
    let (status, body) =
        common::put_form_with_auth(&app, &format!("/api/v1/categories/{id}"), form, &admin).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["name"], "New Name");
    assert_eq!(v["coverImageUrl"], before["coverImageUrl"]);
}

#[tokio::test]
async fn update_category_replaces_image() {
    let (app, db, uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "uc2").await;
    let id = create_category(&app, &admin, "Photography").await;

    let (_, before) = common::get(&app, &format!("/api/v1/categories/{id}")).await;
    let before: serde_json::Value = serde_json::from_str(&before).unwrap_or_default();
    let old_url = before["coverImageUrl"].as_str().unwrap_or_default();
    let old_path = uploads.path().join(old_url.trim_start_matches('/'));
    assert!(old_path.exists(), "stored file missing: {old_path:?}");

    let form = common::FormData::new().file("imageFile", "new.jpg", "image/jpeg", b"fake jpeg");
    let (status, body) =
        common::put_form_with_auth(&app, &format!("/api/v1/categories/{id}"), form, &admin).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let new_url = v["coverImageUrl"].as_str().unwrap_or_default();
    assert_ne!(new_url, old_url);
    assert!(new_url.ends_with(".jpg"), "unexpected url: {new_url}");
    // The replaced file is gone from disk
    assert!(!old_path.exists());
}

#[tokio::test]
async fn update_category_rejects_bad_replacement_without_touching_old_file() {
    let (app, db, uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "uc3").await;
    let id = create_category(&app, &admin, "Music").await;

    let (_, before) = common::get(&app, &format!("/api/v1/categories/{id}")).await;
    let before: serde_json::Value = serde_json::from_str(&before).unwrap_or_default();
    let old_url = before["coverImageUrl"].as_str().unwrap_or_default();
    let old_path = uploads.path().join(old_url.trim_start_matches('/'));

    let form = common::FormData::new().file("imageFile", "malware.exe", "image/png", b"mz");
    let (status, _) =
        common::put_form_with_auth(&app, &format!("/api/v1/categories/{id}"), form, &admin).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(old_path.exists(), "rejected upload must not delete old file");
}

#[tokio::test]
async fn update_category_forbidden_for_non_admin() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "uc5").await;
    let id = create_category(&app, &admin, "Untouchable").await;

    let (token, _) = signup(&app, "uc5b").await;
    let form = common::FormData::new().text("name", "Renamed");
    let (status, _) =
        common::put_form_with_auth(&app, &format!("/api/v1/categories/{id}"), form, &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Name untouched
    let (_, body) = common::get(&app, &format!("/api/v1/categories/{id}")).await;
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(v["name"], "Untouchable");
}

#[tokio::test]
async fn update_category_not_found() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "uc4").await;

    let form = common::FormData::new().text("name", "Ghost");
    let (status, _) =
        common::put_form_with_auth(&app, "/api/v1/categories/9999", form, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_category_success() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "dc1").await;
    let id = create_category(&app, &admin, "Disposable").await;

    let (status, _) =
        common::delete_with_auth(&app, &format!("/api/v1/categories/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::get(&app, &format!("/api/v1/categories/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_category_with_courses_conflicts() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "dc2").await;
    let id = create_category(&app, &admin, "Occupied").await;

    // Attach a course to the category
    let (token, _) = signup(&app, "dc2b").await;
    let form = common::FormData::new()
        .text("title", "Intro Course")
        .text("description", "A course")
        .text("price", "10")
        .text("categoryId", &id.to_string())
        .file("imageFile", "cover.png", "image/png", b"fake png bytes");
    let (status, body) = common::post_form_with_auth(&app, "/api/v1/courses", form, &token).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) =
        common::delete_with_auth(&app, &format!("/api/v1/categories/{id}"), &admin).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    let v: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    assert_eq!(
        v["error"]["message"],
        "Category still has courses and cannot be deleted."
    );
}

#[tokio::test]
async fn delete_category_forbidden_for_non_admin() {
    let (app, db, _uploads) = test_app().await;
    let admin = signup_admin(&app, &db, "dc3").await;
    let id = create_category(&app, &admin, "Guarded").await;

    let (token, _) = signup(&app, "dc3b").await;
    let (status, _) =
        common::delete_with_auth(&app, &format!("/api/v1/categories/{id}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
