use serde_json::json;

use crate::common::{TestApp, TestUser, category_id, routes};
use common::Role;

/// Organizer, participant and a one-category event. Returns `(participant, registration_id)`.
async fn registered_participant(app: &TestApp) -> (TestUser, i32) {
    let org = app
        .create_user("Org", "org@example.com", Role::Organizer)
        .await;
    let ana = app
        .create_user("Ana", "ana@example.com", Role::Participant)
        .await;
    let event = app
        .create_event(
            &org.token,
            "Run",
            json!([{"name": "10K", "price_cents": 15000, "max_slots": 10}]),
        )
        .await;
    let (id, _) = app
        .register(
            &ana.token,
            event["id"].as_i64().unwrap() as i32,
            category_id(&event, "10K"),
        )
        .await;
    (ana, id)
}

#[tokio::test]
async fn checkout_creates_intent_for_registration_amount() {
    let app = TestApp::spawn().await;
    let (ana, registration_id) = registered_participant(&app).await;

    let res = app
        .post_with_token(
            routes::PAYMENT_INTENT,
            &json!({"registrationId": registration_id}),
            &ana.token,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"]["payment_intent_id"], "pi_1");
    assert_eq!(res.body["data"]["client_secret"], "pi_1_secret_test");

    let intents = app.gateway.intents.lock().unwrap();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount_cents, 15000);
    assert_eq!(intents[0].currency, "brl");
    assert_eq!(intents[0].registration_id, registration_id);
    assert_eq!(intents[0].customer_id, "cus_1");
}

#[tokio::test]
async fn processor_customer_is_created_once_per_user() {
    let app = TestApp::spawn().await;
    let (ana, registration_id) = registered_participant(&app).await;

    app.checkout(&ana.token, registration_id).await;
    app.checkout(&ana.token, registration_id).await;

    assert_eq!(app.gateway.customers.lock().unwrap().len(), 1);
    let intents = app.gateway.intents.lock().unwrap();
    assert_eq!(intents.len(), 2);
    assert!(intents.iter().all(|i| i.customer_id == "cus_1"));
}

#[tokio::test]
async fn only_the_owner_can_pay() {
    let app = TestApp::spawn().await;
    let (_, registration_id) = registered_participant(&app).await;
    let eve = app
        .create_user("Eve", "eve@example.com", Role::Participant)
        .await;

    let res = app
        .post_with_token(
            routes::PAYMENT_INTENT,
            &json!({"registration_id": registration_id}),
            &eve.token,
        )
        .await;

    assert_eq!(res.status, 403);
    assert!(app.gateway.intents.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_registration_is_not_found() {
    let app = TestApp::spawn().await;
    let ana = app
        .create_user("Ana", "ana@example.com", Role::Participant)
        .await;

    let res = app
        .post_with_token(
            routes::PAYMENT_INTENT,
            &json!({"registration_id": 424242}),
            &ana.token,
        )
        .await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn paid_registration_cannot_be_paid_again() {
    let app = TestApp::spawn().await;
    let (ana, registration_id) = registered_participant(&app).await;
    let intent = app.checkout(&ana.token, registration_id).await;
    let hook = app
        .post_webhook(&crate::common::payment_event(
            "payment_intent.succeeded",
            &intent,
        ))
        .await;
    assert_eq!(hook.status, 200);

    let res = app
        .post_with_token(
            routes::PAYMENT_INTENT,
            &json!({"registration_id": registration_id}),
            &ana.token,
        )
        .await;

    assert_eq!(res.status, 409);
    assert_eq!(res.code(), "CONFLICT");
}
