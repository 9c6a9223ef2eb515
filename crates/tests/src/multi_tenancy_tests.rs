use crate::fixtures::test_app::TestApp;
use serde_json::{Value, json};

async fn get_json(app: &TestApp, path: &str, token: &str) -> Value {
    app.auth_get(path, token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn user_listing_never_crosses_tenants() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;
    app.add_member(&acme, "staff@acme.test", "staff").await;
    app.add_member(&beta, "staff@beta.test", "staff").await;

    // An explicit tenant filter cannot widen the caller's scope.
    let users = get_json(
        &app,
        &format!("/api/users?tenant={}", beta.tenant_id),
        &acme.owner.access_token,
    )
    .await;
    assert_eq!(users["total"], 0);

    let users = get_json(&app, "/api/users", &acme.owner.access_token).await;
    for user in users["items"].as_array().unwrap() {
        assert_eq!(user["tenant"], acme.tenant_id.as_str());
    }
}

#[tokio::test]
async fn foreign_records_behave_as_missing() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;
    let beta_staff = app.add_member(&beta, "staff@beta.test", "staff").await;

    let path = format!("/api/users/{}", beta_staff.id);
    let resp = app.auth_get(&path, &acme.owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .auth_patch(&path, &acme.owner.access_token)
        .json(&json!({ "first_name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app.auth_delete(&path, &acme.owner.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app.invite(&beta.owner.access_token, "pending@beta.test", "staff").await;
    let json: Value = resp.json().await.unwrap();
    let invitation_id = json["invitation"]["id"].as_str().unwrap();
    let resp = app
        .auth_post(
            &format!("/api/invitations/{}/resend", invitation_id),
            &acme.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn tenants_branches_and_invitations_are_isolated() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    let beta = app.seed_tenant("beta.test").await;

    for (tenant, name) in [(&acme, "Acme Main"), (&beta, "Beta Main")] {
        app.auth_post("/api/branches", &tenant.owner.access_token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
    }
    app.invite(&acme.owner.access_token, "one@acme.test", "staff").await;
    app.invite(&beta.owner.access_token, "one@beta.test", "staff").await;

    let tenants = get_json(&app, "/api/tenants", &acme.owner.access_token).await;
    assert_eq!(tenants["total"], 1);
    assert_eq!(tenants["items"][0]["id"], acme.tenant_id.as_str());

    let branches = get_json(&app, "/api/branches", &acme.owner.access_token).await;
    assert_eq!(branches.as_array().unwrap().len(), 1);
    assert_eq!(branches[0]["name"], "Acme Main");

    let invitations = get_json(&app, "/api/invitations", &acme.owner.access_token).await;
    assert_eq!(invitations["total"], 1);
    assert_eq!(invitations["items"][0]["email"], "one@acme.test");
}

#[tokio::test]
async fn superuser_sees_every_tenant() {
    let app = TestApp::spawn().await;
    let acme = app.seed_tenant("acme.test").await;
    app.seed_tenant("beta.test").await;
    let root = app.seed_superuser("root@platform.test").await;

    let tenants = get_json(&app, "/api/tenants", &root.access_token).await;
    assert_eq!(tenants["total"], 2);

    let users = get_json(&app, "/api/users", &root.access_token).await;
    assert_eq!(users["total"], 3);

    let filtered = get_json(
        &app,
        &format!("/api/users?tenant={}", acme.tenant_id),
        &root.access_token,
    )
    .await;
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["items"][0]["email"], "owner@acme.test");

    let resp = app
        .auth_patch(&format!("/api/users/{}", acme.owner.id), &root.access_token)
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_get("/api/profile", &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
