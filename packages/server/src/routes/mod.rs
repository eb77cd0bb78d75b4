use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/user", user_routes())
        .nest("/setup", setup_routes())
        .nest("/events", event_routes())
        .nest("/organizer", organizer_routes())
        .nest("/registrations", registration_routes())
        .nest("/stripe", payment_routes())
        .nest("/results", results_routes(config))
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::update_profile))
        .routes(routes!(handlers::user::change_password))
}

fn setup_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::setup::setup_status,
        handlers::setup::setup_admin
    ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
        .routes(routes!(handlers::event::list_event_registrations))
}

fn organizer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::event::list_organizer_events))
}

fn registration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::registration::list_my_registrations,
            handlers::registration::create_registration
        ))
        .routes(routes!(handlers::registration::get_registration))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::payment::create_payment_intent))
        .routes(routes!(handlers::payment::webhook))
}

fn results_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::results::upload_results))
        .layer(handlers::results::upload_body_limit(
            config.results.max_upload_bytes,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::results::get_event_results))
        .merge(upload)
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::notification::list_notifications))
        .routes(routes!(handlers::notification::mark_read))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_users))
        .routes(routes!(
            handlers::admin::update_user,
            handlers::admin::delete_user
        ))
        .routes(routes!(handlers::admin::get_stats))
}
