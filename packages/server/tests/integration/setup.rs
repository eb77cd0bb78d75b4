use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};
use common::Role;

#[tokio::test]
async fn status_reports_no_admin_on_a_fresh_install() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::SETUP_ADMIN).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"]["has_admin"], false);
    assert_eq!(res.body["data"]["admin_count"], 0);
}

#[tokio::test]
async fn first_admin_is_created_with_the_setup_key() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::SETUP_ADMIN,
            &json!({
                "setup_key": "setup-key",
                "name": "Root",
                "email": "root@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["data"]["role"], "ADMIN");

    let token = app.login("root@example.com", PASSWORD).await;
    let stats = app.get_with_token(routes::ADMIN_STATS, &token).await;
    assert_eq!(stats.status, 200);
}

#[tokio::test]
async fn wrong_setup_key_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::SETUP_ADMIN,
            &json!({
                "setup_key": "guess",
                "name": "Root",
                "email": "root@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn existing_account_is_promoted() {
    let app = TestApp::spawn().await;
    let ana = app
        .create_user("Ana", "ana@example.com", Role::Participant)
        .await;

    let res = app
        .post_without_token(
            routes::SETUP_ADMIN,
            &json!({
                "setup_key": "setup-key",
                "name": "Ana",
                "email": "ana@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["data"]["id"], ana.id);
    assert_eq!(res.body["data"]["role"], "ADMIN");
}

#[tokio::test]
async fn second_admin_setup_is_a_conflict() {
    let app = TestApp::spawn().await;
    app.create_user("Admin", "admin@example.com", Role::Admin)
        .await;

    let res = app
        .post_without_token(
            routes::SETUP_ADMIN,
            &json!({
                "setup_key": "setup-key",
                "name": "Root",
                "email": "root@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(res.status, 409);
    let status = app.get_without_token(routes::SETUP_ADMIN).await;
    assert_eq!(status.body["data"]["admin_count"], 1);
}
