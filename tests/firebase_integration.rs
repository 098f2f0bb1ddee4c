//! Integration tests against a real Firebase project
//!
//! These tests require:
//! 1. A Firebase project with email/password Authentication, Firestore and Storage enabled
//! 2. Environment variables set in .env file (FIREBASE_API_KEY, FIREBASE_PROJECT_ID,
//!    FIREBASE_STORAGE_BUCKET, TEST_USER_EMAIL, TEST_USER_PASSWORD)
//! 3. Run with: cargo test --features integration-tests -- --test-threads=1

#![cfg(feature = "integration-tests")]

use firebase_stores::{App, AppOptions, Auth, Backend, SetOptions, Stores, UserRecord};
use serde_json::json;
use std::env;

/// Load environment variables from .env file
fn load_env() {
    dotenvy::dotenv().ok();
}

/// Stores over the configured project plus test credentials
fn get_test_stores() -> (Stores, String, String) {
    load_env();
    firebase_stores::logging::init();

    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");
    let password =
        env::var("TEST_USER_PASSWORD").expect("TEST_USER_PASSWORD must be set in .env file");

    let backend = Backend::detect(AppOptions::from_env())
        .expect("FIREBASE_API_KEY must be set in .env file");
    (Stores::new(Some(&backend)), email, password)
}

/// Test: log in and out through the user store
#[tokio::test]
async fn test_log_in_log_out() {
    let (stores, email, password) = get_test_stores();
    let user = stores.user.expect("auth not available");

    let principal = user.log_in(&email, &password).await.expect("Failed to log in");
    assert!(!principal.uid.is_empty());
    assert_eq!(principal.email.as_deref(), Some(email.as_str()));
    assert_eq!(user.current().map(|u| u.uid.clone()), Some(principal.uid.clone()));

    user.log_out().await.expect("Failed to log out");
    assert!(user.current().is_none());
}

/// Test: registered and unregistered emails
#[tokio::test]
async fn test_check_email_validity() {
    let (stores, email, _) = get_test_stores();
    let user = stores.user.expect("auth not available");

    let methods = user.check_email_validity(&email).await.expect("Lookup failed");
    assert!(!methods.is_empty());

    let unknown = format!("nobody-{}@example.com", uuid::Uuid::new_v4().simple());
    let methods = user.check_email_validity(&unknown).await.expect("Lookup failed");
    assert!(methods.is_empty());
}

/// Test: provision a new account, then use it through the user store
#[tokio::test]
async fn test_provisioned_account_can_log_in() {
    let (stores, _, _) = get_test_stores();
    let user = stores.user.expect("auth not available");

    let app = App::from_env().expect("Failed to create app");
    let auth = Auth::new(&app);
    let email = format!("stores-{}@example.com", uuid::Uuid::new_v4().simple());
    let password = "provisioned-password";

    let created = auth
        .create_user_with_email_and_password(&email, password)
        .await
        .expect("Failed to create account");
    assert!(!created.user.uid.is_empty());
    assert_eq!(auth.current_user().map(|u| u.uid.clone()), Some(created.user.uid.clone()));

    let principal = user.log_in(&email, password).await.expect("Failed to log in");
    assert_eq!(principal.uid, created.user.uid);

    user.log_out().await.expect("Failed to log out");
}

/// Test: merge then overwrite the signed-in user's document
#[tokio::test]
async fn test_user_data_round_trip() {
    let (stores, email, password) = get_test_stores();
    let user = stores.user.expect("auth not available");
    let db = stores.db.expect("database not available");

    let principal = user.log_in(&email, &password).await.expect("Failed to log in");
    let uid = principal.uid.clone();

    let first: UserRecord = json!({ "a": 1 }).as_object().cloned().unwrap_or_default();
    let second: UserRecord = json!({ "b": 2 }).as_object().cloned().unwrap_or_default();

    db.set_user_data(&uid, first, SetOptions::overwrite()).await.expect("write failed");
    db.set_user_data(&uid, second.clone(), SetOptions::merge()).await.expect("write failed");
    let data = db.get_user_data(&uid).await.expect("read failed").expect("document missing");
    assert_eq!(data.get("a"), Some(&json!(1)));
    assert_eq!(data.get("b"), Some(&json!(2)));

    db.set_user_data(&uid, second.clone(), SetOptions::overwrite()).await.expect("write failed");
    let data = db.get_user_data(&uid).await.expect("read failed").expect("document missing");
    assert_eq!(data, second);

    user.log_out().await.ok();
}

/// Test: upload JSON, fetch its URL, parse it back
#[tokio::test]
async fn test_storage_json_round_trip() {
    let (stores, email, password) = get_test_stores();
    let user = stores.user.expect("auth not available");
    let files = stores.storage.expect("storage not available");

    user.log_in(&email, &password).await.expect("Failed to log in");

    let body = json!({ "test": true, "n": 3 });
    files
        .upload_file_with_content_type(
            serde_json::to_vec(&body).expect("serialize"),
            "integration.json",
            Some("integration-tests"),
            "application/json",
        )
        .await
        .expect("upload failed");

    let url = files
        .get_file_url("integration.json", Some("integration-tests"))
        .await
        .expect("no download url");
    assert!(url.starts_with("http"));

    let parsed = files
        .get_json("integration.json", Some("integration-tests"))
        .await
        .expect("get_json failed");
    assert_eq!(parsed, body);

    let err = files
        .get_json("does-not-exist.json", Some("integration-tests"))
        .await
        .expect_err("missing file should fail");
    assert_eq!(err.to_string(), "File not found");

    user.log_out().await.ok();
}

/// Test: admin listing includes the signed-in user's document
#[tokio::test]
async fn test_admin_lists_users() {
    let (stores, email, password) = get_test_stores();
    let user = stores.user.expect("auth not available");
    let admin = stores.admin.expect("database not available");
    let db = stores.db.expect("database not available");

    let principal = user.log_in(&email, &password).await.expect("Failed to log in");
    let marker: UserRecord = json!({ "seen": true }).as_object().cloned().unwrap_or_default();
    db.set_user_data(&principal.uid, marker, SetOptions::merge()).await.expect("write failed");

    let users = admin.get_users().await.expect("listing failed");
    assert!(users.iter().any(|doc| doc.id() == principal.uid));

    user.log_out().await.ok();
}
