use crate::fixtures::seed::PASSWORD;
use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

#[tokio::test]
async fn listing_is_scoped_to_own_tenant() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    app.add_member(&acme, "staff@acme.test", "staff").await;

    let users: Value = app
        .auth_get("/api/users", &acme.owner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users["total"], 2);
    let emails: Vec<&str> = users["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert!(emails.contains(&"owner@acme.test"));
    assert!(emails.contains(&"staff@acme.test"));
}

#[tokio::test]
async fn listing_can_filter_by_role() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    app.add_member(&acme, "staff@acme.test", "staff").await;
    app.add_member(&acme, "sales@acme.test", "sales").await;

    let users: Value = app
        .auth_get("/api/users?role=sales", &acme.owner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users["total"], 1);
    assert_eq!(users["items"][0]["email"], "sales@acme.test");
}

#[tokio::test]
async fn tenantless_user_sees_only_self() {
    let app = TestApp::spawn().await;
    app.seed_tenant("acme.test").await;
    app.register_user("loner@test.com", PASSWORD).await;
    let loner = app.login_user("loner@test.com", PASSWORD).await;

    let users: Value = app
        .auth_get("/api/users", &loner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users["total"], 1);
    assert_eq!(users["items"][0]["id"], loner.id.as_str());
}

#[tokio::test]
async fn soft_deleted_user_leaves_listing_but_stays_addressable() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;

    let resp = app
        .auth_delete(&format!("/api/users/{}", staff.id), &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let users: Value = app
        .auth_get("/api/users", &acme.owner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users["total"], 1);

    let resp = app
        .auth_get(&format!("/api/users/{}", staff.id), &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["is_deleted"], true);

    // Deleted accounts lose access immediately.
    let resp = app
        .auth_get("/api/profile", &staff.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "email": "staff@acme.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // A second delete finds nothing live.
    let resp = app
        .auth_delete(&format!("/api/users/{}", staff.id), &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_rules() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let admin = app.add_member(&acme, "admin@acme.test", "admin").await;
    let other_admin = app.add_member(&acme, "admin2@acme.test", "admin").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;
    let sales = app.add_member(&acme, "sales@acme.test", "sales").await;

    let delete = |token: &str, id: &str| {
        app.auth_delete(&format!("/api/users/{}", id), token).send()
    };

    assert_eq!(delete(&admin.access_token, &acme.owner.id).await.unwrap().status().as_u16(), 403);
    assert_eq!(delete(&admin.access_token, &other_admin.id).await.unwrap().status().as_u16(), 403);
    assert_eq!(delete(&admin.access_token, &admin.id).await.unwrap().status().as_u16(), 403);
    assert_eq!(delete(&staff.access_token, &sales.id).await.unwrap().status().as_u16(), 403);
    assert_eq!(delete(&acme.owner.access_token, &acme.owner.id).await.unwrap().status().as_u16(), 403);

    assert_eq!(delete(&admin.access_token, &staff.id).await.unwrap().status().as_u16(), 204);
    assert_eq!(delete(&acme.owner.access_token, &other_admin.id).await.unwrap().status().as_u16(), 204);
}

#[tokio::test]
async fn users_edit_own_names_but_not_own_role() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;
    let path = format!("/api/users/{}", staff.id);

    let resp = app
        .auth_patch(&path, &staff.access_token)
        .json(&json!({ "first_name": "Sam" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["first_name"], "Sam");

    let resp = app
        .auth_patch(&path, &staff.access_token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_patch(&path, &staff.access_token)
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn tenant_reference_is_not_patchable() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;

    let resp = app
        .auth_patch(&format!("/api/users/{}", staff.id), &acme.owner.access_token)
        .json(&json!({ "tenant": beta.tenant_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let user: Value = app
        .auth_get(&format!("/api/users/{}", staff.id), &acme.owner.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["tenant"], acme.tenant_id.as_str());
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;

    let resp = app
        .auth_patch(&format!("/api/users/{}", acme.owner.id), &acme.owner.access_token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn role_changes_follow_assignment_table() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let admin = app.add_member(&acme, "admin@acme.test", "admin").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;
    let path = format!("/api/users/{}", staff.id);

    let resp = app
        .auth_patch(&path, &admin.access_token)
        .json(&json!({ "role": "accountant" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["role"], "accountant");

    let resp = app
        .auth_patch(&path, &admin.access_token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .auth_patch(&path, &acme.owner.access_token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // The refreshed token carries the new role.
    let resp = app
        .client
        .post(app.url("/api/token/refresh"))
        .json(&json!({ "refresh_token": staff.refresh_token }))
        .send()
        .await
        .unwrap();
    let token: Value = resp.json().await.unwrap();
    let profile: Value = app
        .auth_get("/api/profile", token["access_token"].as_str().unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["role"], "admin");
}

#[tokio::test]
async fn branch_assignment_stays_inside_the_tenant() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;
    let staff = app.add_member(&acme, "staff@acme.test", "staff").await;

    let own: Value = app
        .auth_post("/api/branches", &acme.owner.access_token)
        .json(&json!({ "name": "Main" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let foreign: Value = app
        .auth_post("/api/branches", &beta.owner.access_token)
        .json(&json!({ "name": "Elsewhere" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let path = format!("/api/users/{}", staff.id);
    let resp = app
        .auth_patch(&path, &acme.owner.access_token)
        .json(&json!({ "branch": foreign["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_patch(&path, &acme.owner.access_token)
        .json(&json!({ "branch": own["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["branch"], own["id"]);
}

#[tokio::test]
async fn manager_registration_joins_their_tenant() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;

    let resp = app
        .auth_post("/api/register", &acme.owner.access_token)
        .json(&json!({ "email": "walkin@acme.test", "password": PASSWORD, "role": "purchase" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let walkin = app.login_user("walkin@acme.test", PASSWORD).await;
    let profile: Value = app
        .auth_get("/api/profile", &walkin.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["tenant"], acme.tenant_id.as_str());
    assert_eq!(profile["role"], "purchase");
}

#[tokio::test]
async fn admin_registration_cannot_grant_manager_roles() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let admin = app.add_member(&acme, "admin@acme.test", "admin").await;

    let resp = app
        .auth_post("/api/register", &admin.access_token)
        .json(&json!({ "email": "boss@acme.test", "password": PASSWORD, "role": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn malformed_user_id_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;

    let resp = app
        .auth_get("/api/users/not-an-id", &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}
