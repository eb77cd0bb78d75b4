use sea_orm::EntityTrait;
use serde_json::json;

use crate::common::{TestApp, TestUser, category_id, routes};
use common::{EventStatus, Role};
use podium_server::entity::event;

struct Race {
    org: TestUser,
    event_id: i32,
    event: serde_json::Value,
}

/// An event with `runners` confirmed registrations, alternating 10K and 5K.
async fn race_with_runners(app: &TestApp, runners: usize) -> Race {
    let org = app
        .create_user("Org", "org@example.com", Role::Organizer)
        .await;
    let event = app
        .create_event(
            &org.token,
            "Results Run",
            json!([
                {"name": "10K", "price_cents": 100},
                {"name": "5K", "price_cents": 100},
            ]),
        )
        .await;
    let event_id = event["id"].as_i64().unwrap() as i32;

    for i in 0..runners {
        let runner = app
            .create_user(
                &format!("Runner {i}"),
                &format!("runner{i}@example.com"),
                Role::Participant,
            )
            .await;
        let category = if i % 2 == 0 { "10K" } else { "5K" };
        app.confirmed_registration(&runner.token, event_id, category_id(&event, category))
            .await;
    }

    Race {
        org,
        event_id,
        event,
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn import_creates_results_and_reports_unknown_bibs() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 10).await;

        let mut csv = String::from("bibNumber,position,categoryPosition,time,pace,status\n");
        for bib in 1..=10 {
            csv.push_str(&format!("{bib},{bib},{bib},00:4{bib}:00,4:30,COMPLETED\n"));
        }
        csv.push_str("98,11,6,01:00:00,6:00,COMPLETED\n");
        csv.push_str("99,12,7,01:10:00,7:00,COMPLETED\n");

        let res = app.upload_results(race.event_id, &csv, &race.org.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["created"], 10);
        assert_eq!(res.body["data"]["updated"], 0);
        assert_eq!(res.body["data"]["total"], 10);
        let errors = res.body["data"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].as_str().unwrap().contains("98"));

        let stored = event::Entity::find_by_id(race.event_id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, EventStatus::Completed);
    }

    #[tokio::test]
    async fn reimport_updates_existing_results() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 2).await;

        let first = app
            .upload_results(race.event_id, "bib,position\n1,2\n2,1\n", &race.org.token)
            .await;
        assert_eq!(first.body["data"]["created"], 2, "{}", first.text);

        let second = app
            .upload_results(race.event_id, "bib,position\n1,1\n2,2\n", &race.org.token)
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["data"]["created"], 0);
        assert_eq!(second.body["data"]["updated"], 2);
        assert!(second.body["data"].get("errors").is_none());
    }

    #[tokio::test]
    async fn semicolon_separated_export_is_imported() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 2).await;
        let csv = "numero;posicao;tempo;ritmo\n1;2;00:42:00;4,12\n2;1;00:40:00;4,00\n";

        let res = app.upload_results(race.event_id, csv, &race.org.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["created"], 2);
        assert!(res.body["data"].get("errors").is_none());

        let list = app.get_without_token(&routes::results(race.event_id)).await;
        let items = list.body["data"].as_array().unwrap();
        assert_eq!(items[0]["bib_number"], "2");
        assert_eq!(items[0]["time"], "00:40:00");
        assert_eq!(items[1]["pace"], "4,12");
    }

    #[tokio::test]
    async fn portuguese_headers_and_row_errors() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 2).await;
        let csv = "numero,posicao,tempo,status\n1,1,00:40:00,completed\n2,abc,,dnf\n,3,,\n1,4,,LOST\n";

        let res = app.upload_results(race.event_id, csv, &race.org.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["created"], 2);
        // Missing bib and unknown status.
        assert_eq!(res.body["data"]["errors"].as_array().unwrap().len(), 2);

        let list = app.get_without_token(&routes::results(race.event_id)).await;
        let items = list.body["data"].as_array().unwrap();
        assert_eq!(items[0]["bib_number"], "1");
        assert_eq!(items[1]["status"], "DNF");
        assert!(items[1]["position"].is_null());
    }

    #[tokio::test]
    async fn file_without_bib_column_is_rejected() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 0).await;

        let res = app
            .upload_results(race.event_id, "position,time\n1,00:40:00\n", &race.org.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn only_the_organizer_can_import() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 0).await;
        let other = app
            .create_user("Other", "other@example.com", Role::Organizer)
            .await;

        let res = app
            .upload_results(race.event_id, "bib\n1\n", &other.token)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let org = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;

        let res = app.upload_results(9999, "bib\n1\n", &org.token).await;

        assert_eq!(res.status, 404);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn results_are_ordered_with_unranked_last_and_filterable() {
        let app = TestApp::spawn().await;
        let race = race_with_runners(&app, 4).await;
        let csv = "bib,position,categoryPosition,status\n1,,,DNS\n2,3,2,\n3,1,1,\n4,2,1,\n";
        let res = app.upload_results(race.event_id, csv, &race.org.token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let all = app.get_without_token(&routes::results(race.event_id)).await;
        assert_eq!(all.status, 200);
        let bibs: Vec<&str> = all.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["bib_number"].as_str().unwrap())
            .collect();
        assert_eq!(bibs, ["3", "4", "2", "1"]);
        assert_eq!(all.body["data"][0]["participant_name"], "Runner 2");
        assert_eq!(all.body["data"][0]["category_name"], "10K");

        let five_k = category_id(&race.event, "5K");
        let filtered = app
            .get_without_token(&format!(
                "{}?category_id={five_k}",
                routes::results(race.event_id)
            ))
            .await;
        let rows = filtered.body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["category_name"] == "5K"));
    }
}
