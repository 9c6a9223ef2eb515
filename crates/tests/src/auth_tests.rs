use std::sync::Arc;

use crate::fixtures::seed::PASSWORD;
use crate::fixtures::test_app::TestApp;
use pos_services::accounts::SuperuserBootstrap;
use pos_services::{AccountService, AuthService};
use serde_json::{Value, json};

#[tokio::test]
async fn register_creates_tenantless_owner() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({
            "email": "alice@Example.COM",
            "password": PASSWORD,
            "first_name": "Alice",
            "last_name": "Smith",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["email"], "alice@example.com");
    assert!(json["user_id"].is_string());

    let alice = app.login_user("alice@example.com", PASSWORD).await;
    let profile: Value = app
        .auth_get("/api/profile", &alice.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["role"], "owner");
    assert_eq!(profile["first_name"], "Alice");
    assert!(profile["tenant"].is_null());
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let app = TestApp::spawn().await;
    app.register_user("dup@test.com", PASSWORD).await;

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "email": "dup@test.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn register_validates_body() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "email": "not-an-email", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "validation");

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "email": "short@test.com", "password": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn anonymous_register_cannot_choose_role() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({ "email": "sneaky@test.com", "password": PASSWORD, "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn login_returns_token_pair_and_cookie() {
    let app = TestApp::spawn().await;
    app.register_user("login@test.com", PASSWORD).await;

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "login@test.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("access_token="));

    let json: Value = resp.json().await.unwrap();
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], app.settings.jwt.access_token_ttl_secs);
    assert_eq!(json["user"]["email"], "login@test.com");
    assert!(json["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_failures_are_generic() {
    let app = TestApp::spawn().await;
    app.register_user("wrong@test.com", PASSWORD).await;

    let wrong_password = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "wrong@test.com", "password": "WrongPassword!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status().as_u16(), 401);
    let wrong_password: Value = wrong_password.json().await.unwrap();

    let unknown_user = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "ghost@test.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_user.status().as_u16(), 401);
    let unknown_user: Value = unknown_user.json().await.unwrap();

    assert_eq!(wrong_password["message"], unknown_user["message"]);
}

#[tokio::test]
async fn login_with_unknown_domain_fails() {
    let app = TestApp::spawn().await;
    app.register_user("dom@test.com", PASSWORD).await;

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "dom@test.com", "password": PASSWORD, "domain": "nowhere.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn same_email_in_two_tenants_needs_domain() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;

    app.add_member(&acme, "shared@mail.test", "staff").await;
    app.add_member(&beta, "shared@mail.test", "sales").await;

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "shared@mail.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let in_beta = app
        .login_user_in("shared@mail.test", PASSWORD, Some("beta.test"))
        .await;
    let profile: Value = app
        .auth_get("/api/profile", &in_beta.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["role"], "sales");
    assert_eq!(profile["tenant"], beta.tenant_id.as_str());
}

#[tokio::test]
async fn refresh_issues_new_access_token() {
    let app = TestApp::spawn().await;
    app.register_user("refresh@test.com", PASSWORD).await;
    let user = app.login_user("refresh@test.com", PASSWORD).await;

    let resp = app
        .client
        .post(app.url("/api/token/refresh"))
        .json(&json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let access = json["access_token"].as_str().unwrap();

    let resp = app.auth_get("/api/profile", access).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn token_types_are_not_interchangeable() {
    let app = TestApp::spawn().await;
    app.register_user("types@test.com", PASSWORD).await;
    let user = app.login_user("types@test.com", PASSWORD).await;

    let resp = app
        .client
        .post(app.url("/api/token/refresh"))
        .json(&json!({ "refresh_token": user.access_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .auth_get("/api/profile", &user.refresh_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn profile_requires_valid_token() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/profile")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .auth_get("/api/profile", "not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn superuser_bootstrap_reports_what_it_found() {
    let app = TestApp::spawn().await;
    let auth = Arc::new(AuthService::new(app.settings.jwt.clone()));
    let accounts = AccountService::new(&app.db, auth, app.settings.tenancy.clone());

    let outcome = accounts.ensure_superuser("root@POS.test", PASSWORD).await.unwrap();
    assert!(matches!(outcome, SuperuserBootstrap::Created(ref user) if user.is_superuser));
    let outcome = accounts.ensure_superuser("root@pos.test", PASSWORD).await.unwrap();
    assert!(matches!(outcome, SuperuserBootstrap::AlreadyPresent));

    // A plain tenant-less account holding the address is not promoted.
    app.register_user("plain@pos.test", PASSWORD).await;
    let outcome = accounts.ensure_superuser("plain@pos.test", PASSWORD).await.unwrap();
    assert!(matches!(outcome, SuperuserBootstrap::EmailHeldByRegularUser));

    let plain = app
        .db
        .collection::<bson::Document>("users")
        .find_one(bson::doc! { "email": "plain@pos.test" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plain.get_bool("is_superuser").unwrap(), false);
}
