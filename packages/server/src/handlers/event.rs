use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EventStatus, PaymentStatus};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, event, payment, registration, user};
use crate::error::{AppError, ErrorBody, still_referenced};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::registration::{EventRegistrationItem, ParticipantSummary};
use crate::models::shared::{
    ApiResponse, MessageResponse, Paged, Pagination, escape_like, page_params,
};
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::find_event;
use crate::utils::slug::slugify;

/// Attach categories (cheapest first) and registration counts to events.
async fn with_details<C: ConnectionTrait>(
    db: &C,
    events: Vec<event::Model>,
) -> Result<Vec<EventResponse>, DbErr> {
    let ids: Vec<i32> = events.iter().map(|e| e.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut categories: HashMap<i32, Vec<category::Model>> = HashMap::new();
    for c in category::Entity::find()
        .filter(category::Column::EventId.is_in(ids.clone()))
        .order_by_asc(category::Column::PriceCents)
        .order_by_asc(category::Column::Id)
        .all(db)
        .await?
    {
        categories.entry(c.event_id).or_default().push(c);
    }

    let counts: HashMap<i32, i64> = registration::Entity::find()
        .select_only()
        .column(registration::Column::EventId)
        .column_as(registration::Column::Id.count(), "count")
        .filter(registration::Column::EventId.is_in(ids))
        .group_by(registration::Column::EventId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(events
        .into_iter()
        .map(|e| {
            let cats = categories.remove(&e.id).unwrap_or_default();
            let count = std::cmp::Ord::max(counts.get(&e.id).copied().unwrap_or(0), 0) as u64;
            EventResponse::new(e, cats, count)
        })
        .collect())
}

/// Pick `base`, or `base-2`, `base-3`... if taken.
async fn unique_slug<C: ConnectionTrait>(db: &C, base: &str) -> Result<String, DbErr> {
    let taken: Vec<String> = event::Entity::find()
        .select_only()
        .column(event::Column::Slug)
        .filter(
            Condition::any()
                .add(event::Column::Slug.eq(base))
                .add(event::Column::Slug.starts_with(format!("{base}-"))),
        )
        .into_tuple()
        .all(db)
        .await?;
    if !taken.iter().any(|s| s == base) {
        return Ok(base.to_string());
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Public listing ordered by start date. Defaults to `PUBLISHED` events.",
    params(EventListQuery),
    responses(
        (status = 200, description = "Page of events", body = ApiResponse<Paged<EventResponse>>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<ApiResponse<Paged<EventResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = event::Entity::find()
        .filter(event::Column::Status.eq(query.status.unwrap_or(EventStatus::Published)));
    if let Some(kind) = query.event_type {
        select = select.filter(event::Column::EventType.eq(kind));
    }
    if let Some(ref city) = query.city {
        let term = escape_like(city.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(event::Column::City)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select.clone().count(&state.db).await?;
    let events = select
        .order_by_asc(event::Column::StartDate)
        .order_by_asc(event::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(Paged {
        items: with_details(&state.db, events).await?,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event with its categories",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = ApiResponse<EventResponse>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<EventResponse>>, AppError> {
    let model = find_event(&state.db, id).await?;
    let detail = with_details(&state.db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event with its categories",
    description = "Requires ORGANIZER or ADMIN. The event and its categories are created in one transaction; each category starts with `available_slots = max_slots`.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = ApiResponse<EventResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::CreateEvent)?;
    validate_create_event(&payload)?;

    let txn = state.db.begin().await?;
    let slug = unique_slug(&txn, &slugify(&payload.title)).await?;
    let now = chrono::Utc::now();

    let model = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        event_type: Set(payload.event_type),
        status: Set(payload.status.unwrap_or_default()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        venue: Set(payload.venue),
        address: Set(payload.address),
        banner_url: Set(payload.banner_url),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        registration_start: Set(payload.registration_start),
        registration_end: Set(payload.registration_end),
        max_participants: Set(payload.max_participants),
        current_participants: Set(0),
        organizer_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("An event with this title was created concurrently, retry".into())
        }
        _ => AppError::from(e),
    })?;

    let mut categories = Vec::with_capacity(payload.categories.len());
    for c in payload.categories {
        let inserted = category::ActiveModel {
            event_id: Set(model.id),
            name: Set(c.name.trim().to_string()),
            description: Set(c.description),
            price_cents: Set(c.price_cents),
            max_slots: Set(c.max_slots),
            // Unlimited categories never read this counter.
            available_slots: Set(c.max_slots.unwrap_or(0)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        categories.push(inserted);
    }
    txn.commit().await?;

    tracing::info!(event_id = model.id, organizer_id = auth_user.user_id, "Event created");
    categories.sort_by_key(|c| (c.price_cents, c.id));
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(EventResponse::new(model, categories, 0)),
    ))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Owner organizer or ADMIN. Any field may change at any status.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse<EventResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<ApiResponse<EventResponse>>, AppError> {
    let current = find_event(&state.db, id).await?;
    auth_user.authorize(Action::ManageEvent {
        organizer_id: current.organizer_id,
    })?;
    validate_update_event(&payload, &current)?;

    let mut active: event::ActiveModel = current.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(kind) = payload.event_type {
        active.event_type = Set(kind);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(city) = payload.city {
        active.city = Set(city.trim().to_string());
    }
    if let Some(st) = payload.state {
        active.state = Set(st.trim().to_string());
    }
    if let Some(venue) = payload.venue {
        active.venue = Set(venue);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(banner_url) = payload.banner_url {
        active.banner_url = Set(banner_url);
    }
    if let Some(v) = payload.start_date {
        active.start_date = Set(v);
    }
    if let Some(v) = payload.end_date {
        active.end_date = Set(v);
    }
    if let Some(v) = payload.registration_start {
        active.registration_start = Set(v);
    }
    if let Some(v) = payload.registration_end {
        active.registration_end = Set(v);
    }
    if let Some(v) = payload.max_participants {
        active.max_participants = Set(v);
    }
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&state.db).await?;
    let detail = with_details(&state.db, vec![updated])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("updated event vanished".into()))?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Owner organizer or ADMIN. Refused while the event has registrations.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Event has registrations (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    let txn = state.db.begin().await?;
    let current = event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    auth_user.authorize(Action::ManageEvent {
        organizer_id: current.organizer_id,
    })?;

    let registrations = registration::Entity::find()
        .filter(registration::Column::EventId.eq(id))
        .count(&txn)
        .await?;
    if registrations > 0 {
        return Err(AppError::Conflict(format!(
            "Event has {registrations} registration(s) and cannot be deleted"
        )));
    }

    const IN_USE: &str = "Event is still referenced and cannot be deleted";
    category::Entity::delete_many()
        .filter(category::Column::EventId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| still_referenced(e, IN_USE))?;
    event::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(|e| still_referenced(e, IN_USE))?;
    txn.commit().await?;

    tracing::info!(event_id = id, "Event deleted");
    Ok(MessageResponse::ok("Event deleted"))
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    operation_id = "listOrganizerEvents",
    summary = "Events owned by the caller",
    description = "Every status, newest first. Requires ORGANIZER or ADMIN.",
    responses(
        (status = 200, description = "Caller's events", body = ApiResponse<Vec<EventResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_organizer_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EventResponse>>>, AppError> {
    auth_user.authorize(Action::CreateEvent)?;

    let events = event::Entity::find()
        .filter(event::Column::OrganizerId.eq(auth_user.user_id))
        .order_by_desc(event::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(with_details(&state.db, events).await?))
}

#[utoipa::path(
    get,
    path = "/{id}/registrations",
    tag = "Events",
    operation_id = "listEventRegistrations",
    summary = "Registrations of an event",
    description = "Owner organizer or ADMIN. Each row carries the participant, category and payment status.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registrations", body = ApiResponse<Vec<EventRegistrationItem>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_event_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<EventRegistrationItem>>>, AppError> {
    let current = find_event(&state.db, id).await?;
    auth_user.authorize(Action::ManageEvent {
        organizer_id: current.organizer_id,
    })?;

    let registrations = registration::Entity::find()
        .filter(registration::Column::EventId.eq(id))
        .order_by_asc(registration::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let user_ids: Vec<i32> = registrations.iter().map(|r| r.user_id).collect();
    let registration_ids: Vec<i32> = registrations.iter().map(|r| r.id).collect();

    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let categories: HashMap<i32, String> = category::Entity::find()
        .filter(category::Column::EventId.eq(id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let payments: HashMap<i32, PaymentStatus> = payment::Entity::find()
        .filter(payment::Column::RegistrationId.is_in(registration_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.registration_id, p.status))
        .collect();

    let items = registrations
        .into_iter()
        .filter_map(|r| {
            let u = users.get(&r.user_id)?;
            Some(EventRegistrationItem {
                id: r.id,
                status: r.status,
                bib_number: r.bib_number,
                shirt_size: r.shirt_size,
                participant: ParticipantSummary {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    phone: u.phone.clone(),
                },
                category_id: r.category_id,
                category_name: categories.get(&r.category_id).cloned().unwrap_or_default(),
                payment_status: payments.get(&r.id).copied(),
                created_at: r.created_at,
            })
        })
        .collect();

    Ok(ApiResponse::ok(items))
}
