use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, TestUser, WEBHOOK_SECRET, category_id, payment_event};
use common::{PaymentStatus, RegistrationStatus, Role};
use podium_server::entity::{event, notification, payment, registration};
use podium_server::payments::signature;

struct Checkout {
    ana: TestUser,
    event_id: i32,
    registration_id: i32,
    intent: String,
}

async fn pending_checkout(app: &TestApp) -> Checkout {
    let org = app
        .create_user("Org", "org@example.com", Role::Organizer)
        .await;
    let ana = app
        .create_user("Ana", "ana@example.com", Role::Participant)
        .await;
    let event = app
        .create_event(
            &org.token,
            "Maratona",
            json!([{"name": "42K", "price_cents": 25000, "max_slots": 100}]),
        )
        .await;
    let event_id = event["id"].as_i64().unwrap() as i32;
    let (registration_id, _) = app
        .register(&ana.token, event_id, category_id(&event, "42K"))
        .await;
    let intent = app.checkout(&ana.token, registration_id).await;
    Checkout {
        ana,
        event_id,
        registration_id,
        intent,
    }
}

async fn load(app: &TestApp, c: &Checkout) -> (registration::Model, payment::Model, event::Model) {
    let reg = registration::Entity::find_by_id(c.registration_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let pay = payment::Entity::find()
        .filter(payment::Column::RegistrationId.eq(c.registration_id))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let ev = event::Entity::find_by_id(c.event_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    (reg, pay, ev)
}

mod succeeded {
    use super::*;

    #[tokio::test]
    async fn payment_success_confirms_registration() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;

        let res = app
            .post_webhook(&payment_event("payment_intent.succeeded", &c.intent))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!({"received": true}));

        let (reg, pay, ev) = load(&app, &c).await;
        assert_eq!(pay.status, PaymentStatus::Approved);
        assert!(pay.paid_at.is_some());
        assert_eq!(pay.payment_method.as_deref(), Some("card"));
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert_eq!(reg.bib_number.as_deref(), Some("1"));
        assert_eq!(ev.current_participants, 1);

        let notes = notification::Entity::find()
            .filter(notification::Column::UserId.eq(c.ana.id))
            .all(&app.db)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes[0].metadata,
            Some(json!({"registration_id": c.registration_id, "event_id": c.event_id}))
        );

        let sent = app.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.com");
        assert!(sent[0].subject.contains("Maratona"));
        assert!(sent[0].html.contains("BRL 250.00"));
    }

    #[tokio::test]
    async fn replayed_event_is_applied_once() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        let event = payment_event("payment_intent.succeeded", &c.intent);

        for _ in 0..3 {
            let res = app.post_webhook(&event).await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let (reg, _, ev) = load(&app, &c).await;
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert_eq!(ev.current_participants, 1);
        let notes = notification::Entity::find()
            .filter(notification::Column::UserId.eq(c.ana.id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(notes, 1);
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_deliveries_are_applied_once() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        let body = payment_event("payment_intent.succeeded", &c.intent).to_string();

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..5 {
            let header =
                signature::sign(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
            let req = app
                .client
                .post(app.url(crate::common::routes::WEBHOOK))
                .header("Content-Type", "application/json")
                .header("Stripe-Signature", header)
                .body(body.clone());
            set.spawn(async move { req.send().await.expect("request failed").status().as_u16() });
        }
        let statuses = set.join_all().await;
        assert!(statuses.iter().all(|&s| s == 200), "{statuses:?}");

        let (_, _, ev) = load(&app, &c).await;
        assert_eq!(ev.current_participants, 1);
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bibs_follow_confirmation_order() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        let bia = app
            .create_user("Bia", "bia@example.com", Role::Participant)
            .await;
        let event = app
            .get_without_token(&crate::common::routes::event(c.event_id))
            .await;
        let second = app
            .confirmed_registration(&bia.token, c.event_id, category_id(&event.body["data"], "42K"))
            .await;
        app.post_webhook(&payment_event("payment_intent.succeeded", &c.intent))
            .await;

        let bib_of = |id: i32| {
            let db = app.db.clone();
            async move {
                registration::Entity::find_by_id(id)
                    .one(&db)
                    .await
                    .unwrap()
                    .unwrap()
                    .bib_number
            }
        };
        assert_eq!(bib_of(second).await.as_deref(), Some("1"));
        assert_eq!(bib_of(c.registration_id).await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn paying_a_superseded_intent_confirms_the_registration() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        let second = app.checkout(&c.ana.token, c.registration_id).await;
        assert_ne!(second, c.intent);
        assert_eq!(
            app.gateway.intents.lock().unwrap()[0].registration_id,
            c.registration_id
        );

        let mut event = payment_event("payment_intent.succeeded", &c.intent);
        event["data"]["object"]["metadata"] = json!({
            "registration_id": c.registration_id.to_string(),
            "event_id": c.event_id.to_string(),
        });
        let res = app.post_webhook(&event).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let (reg, pay, ev) = load(&app, &c).await;
        assert_eq!(pay.status, PaymentStatus::Approved);
        assert_eq!(pay.payment_intent_id.as_deref(), Some(c.intent.as_str()));
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert_eq!(reg.bib_number.as_deref(), Some("1"));
        assert_eq!(ev.current_participants, 1);
        assert_eq!(app.mailer.sent.lock().unwrap().len(), 1);

        // The intent that was never paid does not confirm anything twice.
        app.post_webhook(&payment_event("payment_intent.succeeded", &second))
            .await;
        let (_, _, ev) = load(&app, &c).await;
        assert_eq!(ev.current_participants, 1);
    }

    #[tokio::test]
    async fn unknown_intent_is_acknowledged() {
        let app = TestApp::spawn().await;

        let res = app
            .post_webhook(&payment_event("payment_intent.succeeded", "pi_unknown"))
            .await;

        assert_eq!(res.status, 200);
        assert!(app.mailer.sent.lock().unwrap().is_empty());
    }
}

mod failed {
    use super::*;

    #[tokio::test]
    async fn payment_failure_rejects_pending_payment_only() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;

        let res = app
            .post_webhook(&payment_event("payment_intent.payment_failed", &c.intent))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let (reg, pay, ev) = load(&app, &c).await;
        assert_eq!(pay.status, PaymentStatus::Rejected);
        assert_eq!(reg.status, RegistrationStatus::Pending);
        assert_eq!(ev.current_participants, 0);
        assert!(app.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn late_failure_does_not_undo_an_approval() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        app.post_webhook(&payment_event("payment_intent.succeeded", &c.intent))
            .await;

        app.post_webhook(&payment_event("payment_intent.payment_failed", &c.intent))
            .await;

        let (_, pay, _) = load(&app, &c).await;
        assert_eq!(pay.status, PaymentStatus::Approved);
    }
}

mod verification {
    use super::*;

    #[tokio::test]
    async fn bad_signature_is_rejected_before_any_write() {
        let app = TestApp::spawn().await;
        let c = pending_checkout(&app).await;
        let body = payment_event("payment_intent.succeeded", &c.intent).to_string();
        let forged = signature::sign(body.as_bytes(), "wrong-secret", Utc::now().timestamp())
            .unwrap();

        let res = app.post_webhook_raw(&body, Some(&forged)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_SIGNATURE");
        let (reg, pay, ev) = load(&app, &c).await;
        assert_eq!(pay.status, PaymentStatus::Pending);
        assert_eq!(reg.status, RegistrationStatus::Pending);
        assert_eq!(ev.current_participants, 0);
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_webhook_raw(&payment_event("payment_intent.succeeded", "pi_1").to_string(), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected() {
        let app = TestApp::spawn().await;
        let body = payment_event("payment_intent.succeeded", "pi_1").to_string();
        let old = signature::sign(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp() - 3600)
            .unwrap();

        let res = app.post_webhook_raw(&body, Some(&old)).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn tampered_body_is_rejected() {
        let app = TestApp::spawn().await;
        let body = payment_event("payment_intent.succeeded", "pi_1").to_string();
        let header =
            signature::sign(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp()).unwrap();
        let tampered = body.replace("pi_1", "pi_2");

        let res = app.post_webhook_raw(&tampered, Some(&header)).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unrelated_event_types_are_acknowledged() {
        let app = TestApp::spawn().await;

        let res = app
            .post_webhook(&json!({
                "id": "evt_1",
                "type": "customer.created",
                "data": {"object": {"id": "cus_1"}},
            }))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["received"], true);
    }
}
