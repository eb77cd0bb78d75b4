use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};
use common::Role;

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_registers_as_participant_by_default() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Ana Souza", "email": "Ana@Example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["data"]["email"], "ana@example.com");
        assert_eq!(res.body["data"]["role"], "PARTICIPANT");
        assert!(res.body["data"].get("password").is_none());
    }

    #[tokio::test]
    async fn organizer_role_can_be_chosen_at_sign_up() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Org",
                    "email": "org@example.com",
                    "password": PASSWORD,
                    "role": "ORGANIZER",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["data"]["role"], "ORGANIZER");
    }

    #[tokio::test]
    async fn admin_role_cannot_be_self_assigned() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Mallory",
                    "email": "mallory@example.com",
                    "password": PASSWORD,
                    "role": "ADMIN",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = TestApp::spawn().await;
        let body = json!({"name": "Ana", "email": "ana@example.com", "password": PASSWORD});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201);

        let second = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Other", "email": "ANA@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Ana", "email": "ana@example.com", "password": "alllowercase"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_token_and_profile() {
        let app = TestApp::spawn().await;
        app.create_user("Ana", "ana@example.com", Role::Participant)
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ana@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"]["token"].as_str().is_some());
        assert_eq!(res.body["data"]["user"]["name"], "Ana");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = TestApp::spawn().await;
        app.create_user("Ana", "ana@example.com", Role::Participant)
            .await;

        let wrong = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ana@example.com", "password": "Wrong12345"}),
            )
            .await;
        let unknown = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(wrong.status, 401);
        assert_eq!(unknown.status, 401);
        assert_eq!(wrong.body, unknown.body);
    }
}

mod authenticated_access {
    use super::*;

    #[tokio::test]
    async fn me_returns_identity() {
        let app = TestApp::spawn().await;
        let user = app
            .create_user("Org", "org@example.com", Role::Organizer)
            .await;

        let res = app.get_with_token(routes::ME, &user.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["id"], user.id);
        assert_eq!(res.body["data"]["role"], "ORGANIZER");
    }

    #[tokio::test]
    async fn missing_and_garbage_tokens_are_rejected() {
        let app = TestApp::spawn().await;

        let missing = app.get_without_token(routes::ME).await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.code(), "TOKEN_MISSING");

        let garbage = app.get_with_token(routes::ME, "not-a-jwt").await;
        assert_eq!(garbage.status, 401);
        assert_eq!(garbage.code(), "TOKEN_INVALID");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn cpf_is_normalized_and_unique() {
        let app = TestApp::spawn().await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;
        let bia = app
            .create_user("Bia", "bia@example.com", Role::Participant)
            .await;

        let res = app
            .put_with_token(
                routes::PROFILE,
                &json!({"cpf": "529.982.247-25", "phone": "11988887777"}),
                &ana.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["cpf"], "52998224725");

        let clash = app
            .put_with_token(routes::PROFILE, &json!({"cpf": "52998224725"}), &bia.token)
            .await;
        assert_eq!(clash.status, 409);

        let invalid = app
            .put_with_token(routes::PROFILE, &json!({"cpf": "123.456.789-00"}), &bia.token)
            .await;
        assert_eq!(invalid.status, 400);
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let app = TestApp::spawn().await;
        let ana = app
            .create_user("Ana", "ana@example.com", Role::Participant)
            .await;

        let wrong = app
            .put_with_token(
                routes::PASSWORD,
                &json!({"current_password": "Nope12345", "new_password": "Maratona2025"}),
                &ana.token,
            )
            .await;
        assert_eq!(wrong.status, 400);

        let ok = app
            .put_with_token(
                routes::PASSWORD,
                &json!({"currentPassword": PASSWORD, "newPassword": "Maratona2025"}),
                &ana.token,
            )
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);

        app.login("ana@example.com", "Maratona2025").await;
    }
}
