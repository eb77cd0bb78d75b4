use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, event, payment, race_result, registration};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::registration::*;
use crate::models::shared::{ApiResponse, Paged, Pagination, page_params};
use crate::policy::Action;
use crate::services::registration::RegistrationService;
use crate::state::AppState;
use crate::utils::lookup::find_registration;

/// Join registrations with their event, category, payment and result.
async fn with_details<C: ConnectionTrait>(
    db: &C,
    registrations: Vec<registration::Model>,
) -> Result<Vec<RegistrationDetail>, DbErr> {
    if registrations.is_empty() {
        return Ok(Vec::new());
    }
    let event_ids: Vec<i32> = registrations.iter().map(|r| r.event_id).collect();
    let category_ids: Vec<i32> = registrations.iter().map(|r| r.category_id).collect();
    let ids: Vec<i32> = registrations.iter().map(|r| r.id).collect();

    let events: HashMap<i32, event::Model> = event::Entity::find()
        .filter(event::Column::Id.is_in(event_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let categories: HashMap<i32, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut payments: HashMap<i32, payment::Model> = payment::Entity::find()
        .filter(payment::Column::RegistrationId.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.registration_id, p))
        .collect();
    let mut results: HashMap<i32, race_result::Model> = race_result::Entity::find()
        .filter(race_result::Column::RegistrationId.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.registration_id, r))
        .collect();

    Ok(registrations
        .into_iter()
        .filter_map(|r| {
            let event = events.get(&r.event_id)?.clone();
            let category = categories.get(&r.category_id)?.clone();
            let payment = payments.remove(&r.id).map(Into::into);
            let result = results.remove(&r.id).map(Into::into);
            Some(RegistrationDetail {
                registration: r.into(),
                event: event.into(),
                category: category.into(),
                payment,
                result,
            })
        })
        .collect())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Registrations",
    operation_id = "createRegistration",
    summary = "Register for an event category",
    description = "Creates a `PENDING` registration and its `PENDING` payment. Limited categories lose one slot atomically.",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = ApiResponse<CreateRegistrationResponse>),
        (status = 400, description = "Validation error or event closed (VALIDATION_ERROR, INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event or category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Sold out or already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, event_id = payload.event_id))]
pub async fn create_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_registration(&payload)?;

    let txn = state.db.begin().await?;
    let (registration, payment) = RegistrationService::new(&txn)
        .create(auth_user.user_id, &payload, &state.config.payment.currency)
        .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CreateRegistrationResponse {
            registration: registration.into(),
            payment: payment.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Registrations",
    operation_id = "listMyRegistrations",
    summary = "The caller's registrations",
    description = "Newest first, with event, category, payment and result.",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "Page of registrations", body = ApiResponse<Paged<RegistrationDetail>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_my_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<ApiResponse<Paged<RegistrationDetail>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);
    let select = registration::Entity::find()
        .filter(registration::Column::UserId.eq(auth_user.user_id));

    let total = select.clone().count(&state.db).await?;
    let rows = select
        .order_by_desc(registration::Column::CreatedAt)
        .order_by_desc(registration::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(Paged {
        items: with_details(&state.db, rows).await?,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "getRegistration",
    summary = "Get a registration",
    description = "Visible to its owner, the event organizer and ADMIN.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration details", body = ApiResponse<RegistrationDetail>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RegistrationDetail>>, AppError> {
    let registration = find_registration(&state.db, id).await?;
    let organizer_id = event::Entity::find_by_id(registration.event_id)
        .select_only()
        .column(event::Column::OrganizerId)
        .into_tuple::<i32>()
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    auth_user.authorize(Action::ViewRegistration {
        owner_id: registration.user_id,
        organizer_id,
    })?;

    let detail = with_details(&state.db, vec![registration])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))?;
    Ok(ApiResponse::ok(detail))
}
