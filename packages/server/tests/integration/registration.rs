use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use serde_json::json;

use crate::common::{TestApp, category_id, event_body, routes};
use common::Role;
use podium_server::entity::{category, registration};

mod create {
    use super::*;

    #[tokio::test]
    async fn registration_creates_pending_registration_and_payment() {
        let app = TestApp::spawn().await;
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
        let event_id = event["id"].as_i64().unwrap() as i32;
        let cat = category_id(&event, "10K");

        let (_, data) = app.register(&ana.token, event_id, cat).await;

        assert_eq!(data["registration"]["status"], "PENDING");
        assert_eq!(data["registration"]["user_id"], ana.id);
        assert!(data["registration"]["bib_number"].is_null());
        assert_eq!(data["payment"]["status"], "PENDING");
        assert_eq!(data["payment"]["amount_cents"], 15000);
        assert_eq!(data["payment"]["currency"], "brl");

        let stored = category::Entity::find_by_id(cat)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.available_slots, 9);
    }

    #[tokio::test]
    async fn camel_case_body_is_accepted() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let event = app
            .create_event(&org.token, "Run", json!([{"name": "10K", "price_cents": 100}]))
            .await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({
                    "eventId": event["id"],
                    "categoryId": category_id(&event, "10K"),
                    "shirtSize": "XL",
                }),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["data"]["registration"]["shirt_size"], "XL");
    }

    #[tokio::test]
    async fn second_registration_for_same_event_is_a_conflict() {
        let app = TestApp::spawn().await;
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
                json!([
                    {"name": "10K", "price_cents": 100, "max_slots": 5},
                    {"name": "5K", "price_cents": 50, "max_slots": 5},
                ]),
            )
            .await;
        let event_id = event["id"].as_i64().unwrap() as i32;
        app.register(&ana.token, event_id, category_id(&event, "10K"))
            .await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event_id, "category_id": category_id(&event, "5K")}),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 409);
        // The refused attempt did not take a slot.
        let five_k = category::Entity::find_by_id(category_id(&event, "5K"))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(five_k.available_slots, 5);
    }

    #[tokio::test]
    async fn category_of_another_event_is_not_found() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let first = app
            .create_event(&org.token, "First", json!([{"name": "A", "price_cents": 1}]))
            .await;
        let second = app
            .create_event(&org.token, "Second", json!([{"name": "B", "price_cents": 1}]))
            .await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": first["id"], "category_id": category_id(&second, "B")}),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unpublished_event_is_an_invalid_state() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let mut body = event_body("Draft", json!([{"name": "A", "price_cents": 1}]));
        body["status"] = json!("DRAFT");
        let event = app.post_with_token(routes::EVENTS, &body, &org.token).await;
        let event = &event.body["data"];

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event["id"], "category_id": category_id(event, "A")}),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn closed_registration_window_is_an_invalid_state() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let mut body = event_body("Later", json!([{"name": "A", "price_cents": 1}]));
        body["registration_start"] = json!(Utc::now() + Duration::days(2));
        let event = app.post_with_token(routes::EVENTS, &body, &org.token).await;
        assert_eq!(event.status, 201, "{}", event.text);
        let event = &event.body["data"];

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event["id"], "category_id": category_id(event, "A")}),
                &ana.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn sold_out_category_is_a_conflict() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let bia = app
            .create_user("Bia", "bia@example.com", Role::Participant)
            .await;
        let event = app
            .create_event(
                &org.token,
                "Tiny",
                json!([{"name": "A", "price_cents": 1, "max_slots": 1}]),
            )
            .await;
        let event_id = event["id"].as_i64().unwrap() as i32;
        app.register(&ana.token, event_id, category_id(&event, "A"))
            .await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event_id, "category_id": category_id(&event, "A")}),
                &bia.token,
            )
            .await;

        assert_eq!(res.status, 409);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn racing_requests_never_oversell_a_category() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let event = app
            .create_event(
                &org.token,
                "Limited",
                json!([{"name": "A", "price_cents": 1, "max_slots": 3}]),
            )
            .await;
        let event_id = event["id"].as_i64().unwrap() as i32;
        let cat = category_id(&event, "A");

        let mut tokens = Vec::new();
        for i in 0..8 {
            let user = app
                .create_user(
                    &format!("Runner {i}"),
                    &format!("runner{i}@example.com"),
                    Role::Participant,
                )
                .await;
            tokens.push(user.token);
        }

        let body = json!({"event_id": event_id, "category_id": cat});
        let mut set = tokio::task::JoinSet::new();
        for token in tokens {
            let req = app
                .client
                .post(app.url(routes::REGISTRATIONS))
                .bearer_auth(token)
                .json(&body);
            set.spawn(async move { req.send().await.expect("request failed").status().as_u16() });
        }
        let statuses = set.join_all().await;

        let created = statuses.iter().filter(|&&s| s == 201).count();
        let conflicts = statuses.iter().filter(|&&s| s == 409).count();
        assert_eq!(created, 3);
        assert_eq!(conflicts, 5);

        let stored = category::Entity::find_by_id(cat)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.available_slots, 0);
        let rows = registration::Entity::find().all(&app.db).await.unwrap();
        assert_eq!(rows.len(), 3);
    }
}

mod reading {
    use super::*;

    #[tokio::test]
    async fn owner_lists_and_reads_registrations() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let event = app
            .create_event(&org.token, "Run", json!([{"name": "A", "price_cents": 1}]))
            .await;
        let (id, _) = app
            .register(
                &ana.token,
                event["id"].as_i64().unwrap() as i32,
                category_id(&event, "A"),
            )
            .await;

        let list = app.get_with_token(routes::REGISTRATIONS, &ana.token).await;
        assert_eq!(list.status, 200, "{}", list.text);
        let item = &list.body["data"]["items"][0];
        assert_eq!(item["id"], id);
        assert_eq!(item["event"]["title"], "Run");
        assert_eq!(item["category"]["name"], "A");
        assert_eq!(item["payment"]["status"], "PENDING");

        let one = app.get_with_token(&routes::registration(id), &ana.token).await;
        assert_eq!(one.status, 200);
        assert!(one.body["data"]["result"].is_null());

        let organizer_view = app.get_with_token(&routes::registration(id), &org.token).await;
        assert_eq!(organizer_view.status, 200);
    }

    #[tokio::test]
    async fn stranger_cannot_read_a_registration() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let eve = app
            .create_user("Eve", "eve@example.com", Role::Participant)
            .await;
        let event = app
            .create_event(&org.token, "Run", json!([{"name": "A", "price_cents": 1}]))
            .await;
        let (id, _) = app
            .register(
                &ana.token,
                event["id"].as_i64().unwrap() as i32,
                category_id(&event, "A"),
            )
            .await;

        let res = app.get_with_token(&routes::registration(id), &eve.token).await;

        assert_eq!(res.status, 403);
    }
}
